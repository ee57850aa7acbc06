//! Leading version record
//!
//! The format is tied to one build: any difference in version, edit level
//! or record geometry makes a file unreadable.

use std::fmt;

use nh_core::{COLNO, MAX_NUM_WORMS, NROFARTIFACTS, NUMMONS, ROWNO};

use crate::error::SaveResult;
use crate::io::{SaveReader, SaveWriter};

const VERSION_MAJOR: u8 = 3;
const VERSION_MINOR: u8 = 6;
const VERSION_PATCH: u8 = 7;

/// Bumped whenever the byte layout changes
const EDITLEVEL: u8 = 1;

/// Map and table sizes the layout depends on
const fn entity_sizes() -> u32 {
    ((COLNO as u32) << 24) | ((ROWNO as u32) << 16) | (((MAX_NUM_WORMS as u32) & 0xff) << 8)
        | ((NUMMONS as u32 ^ NROFARTIFACTS as u32) & 0xff)
}

/// The version record that opens every save and bones file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub editlevel: u8,
    pub feature_set: u32,
    pub entity_sizes: u32,
}

impl VersionInfo {
    pub const CURRENT: VersionInfo = VersionInfo {
        major: VERSION_MAJOR,
        minor: VERSION_MINOR,
        patch: VERSION_PATCH,
        editlevel: EDITLEVEL,
        feature_set: 0,
        entity_sizes: entity_sizes(),
    };

    pub fn write(&self, w: &mut SaveWriter) {
        w.u8(self.major);
        w.u8(self.minor);
        w.u8(self.patch);
        w.u8(self.editlevel);
        w.u32(self.feature_set);
        w.u32(self.entity_sizes);
    }

    pub fn read(r: &mut SaveReader<'_>) -> SaveResult<Self> {
        r.section("version");
        Ok(Self {
            major: r.u8()?,
            minor: r.u8()?,
            patch: r.u8()?,
            editlevel: r.u8()?,
            feature_set: r.u32()?,
            entity_sizes: r.u32()?,
        })
    }

    /// Can a file carrying this version be read by this build (uptodate)
    pub fn is_compatible(&self) -> bool {
        let ok = *self == Self::CURRENT;
        if !ok {
            tracing::warn!(found = %self, expected = %Self::CURRENT, "version mismatch");
        }
        ok
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}-{}",
            self.major, self.minor, self.patch, self.editlevel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        assert_eq!(VersionInfo::CURRENT.to_string(), "3.6.7-1");
    }

    #[test]
    fn test_compatibility() {
        assert!(VersionInfo::CURRENT.is_compatible());
        let older = VersionInfo {
            editlevel: 0,
            ..VersionInfo::CURRENT
        };
        assert!(!older.is_compatible());
    }
}
