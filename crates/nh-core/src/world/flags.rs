//! Game-wide switches kept in the save header

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bit positions are part of the save format.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        const WIZARD = 1 << 0;
        const EXPLORE = 1 << 1;
        const DEBUG = 1 << 2;
        const STARTED = 1 << 3;
        /// Bones files may be written and loaded
        const BONES = 1 << 4;
        const VERBOSE = 1 << 5;
        const SHOW_ROOM = 1 << 6;
        const AUTOPICKUP = 1 << 7;
        const SAFE_PET = 1 << 8;
        const CONFIRM = 1 << 9;
        const PICKUP_THROWN = 1 << 10;
        const NUM_PAD = 1 << 11;
        const ASCENDED = 1 << 12;
        const MADE_AMULET = 1 << 13;
        const INVOKED = 1 << 14;
    }
}

impl Flags {
    /// Wizard and explore mode games never leave bones.
    pub fn allows_bones(self) -> bool {
        self.contains(Flags::BONES) && !self.intersects(Flags::WIZARD | Flags::EXPLORE)
    }
}

impl Serialize for Flags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Flags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Flags::from_bits_truncate(u32::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bones_need_a_normal_game() {
        assert!(!Flags::empty().allows_bones());
        assert!(Flags::BONES.allows_bones());
        assert!(!(Flags::BONES | Flags::EXPLORE).allows_bones());
    }

    #[test]
    fn test_unknown_bits_dropped() {
        assert_eq!(Flags::from_bits_truncate(1 << 31 | 1), Flags::WIZARD);
    }
}
