//! Light sources

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::monster::MonsterId;
use crate::object::ObjectId;
use crate::reference::Reference;

bitflags! {
    /// Light source state
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct LightFlags: u16 {
        /// Currently emitting light
        const ON = 0x01;
        /// Lit area is visible to the hero
        const SHOW = 0x02;
    }
}

impl Serialize for LightFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LightFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(LightFlags::from_bits_truncate(bits))
    }
}

/// What emits the light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightOwner {
    Object(Reference<ObjectId>),
    Monster(Reference<MonsterId>),
}

impl LightOwner {
    /// Persisted type code
    pub const fn code(&self) -> u8 {
        match self {
            LightOwner::Object(_) => 0,
            LightOwner::Monster(_) => 1,
        }
    }

    pub fn raw_id(&self) -> u32 {
        match self {
            LightOwner::Object(r) => r.raw_id(),
            LightOwner::Monster(r) => r.raw_id(),
        }
    }
}

/// A light source on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSource {
    pub x: i8,
    pub y: i8,
    /// Radius in squares
    pub range: i16,
    pub flags: LightFlags,
    pub owner: LightOwner,
}

impl LightSource {
    pub fn for_object(id: ObjectId, x: i8, y: i8, range: i16) -> Self {
        Self {
            x,
            y,
            range,
            flags: LightFlags::ON,
            owner: LightOwner::Object(Reference::Resolved(id)),
        }
    }

    pub fn for_monster(id: MonsterId, x: i8, y: i8, range: i16) -> Self {
        Self {
            x,
            y,
            range,
            flags: LightFlags::ON,
            owner: LightOwner::Monster(Reference::Resolved(id)),
        }
    }

    pub fn is_on(&self) -> bool {
        self.flags.contains(LightFlags::ON)
    }

    /// Does the light reach (x, y)?
    pub fn covers(&self, x: i8, y: i8) -> bool {
        let dx = (x as i32 - self.x as i32).abs();
        let dy = (y as i32 - self.y as i32).abs();
        let r = self.range as i32;
        self.is_on() && dx * dx + dy * dy <= r * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_coverage() {
        let mut lamp = LightSource::for_object(ObjectId(3), 10, 10, 2);
        assert!(lamp.covers(11, 11));
        assert!(!lamp.covers(13, 10));
        lamp.flags.remove(LightFlags::ON);
        assert!(!lamp.covers(10, 10));
        assert_eq!(lamp.owner.raw_id(), 3);
    }
}
