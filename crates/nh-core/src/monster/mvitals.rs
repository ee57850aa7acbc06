//! Per-species birth/death bookkeeping (mvitals)

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct VitalFlags: u8 {
        const EXTINCT = 0x01;
        const GENOCIDED = 0x02;
        const NO_CORPSE = 0x04;
        const KNOWS_EGG = 0x08;
    }
}

impl Serialize for VitalFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VitalFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(VitalFlags::from_bits_truncate(bits))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterVitals {
    pub born: u8,
    pub died: u8,
    pub flags: VitalFlags,
}
