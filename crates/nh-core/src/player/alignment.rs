//! The hero's alignment and standing with their god

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

/// Stored as its sign: lawful 1, neutral 0, chaotic -1
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    FromRepr,
)]
#[repr(i8)]
pub enum AlignmentType {
    Chaotic = -1,
    #[default]
    Neutral = 0,
    Lawful = 1,
}

impl AlignmentType {
    pub const fn sign(self) -> i8 {
        self as i8
    }

    /// Any positive value reads as lawful and any negative one as chaotic.
    pub fn from_sign(v: i8) -> Self {
        Self::from_repr(v.signum()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub typ: AlignmentType,
    /// Standing; negative after sinning against the alignment
    pub record: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_sign_round_trips() {
        for typ in AlignmentType::iter() {
            assert_eq!(AlignmentType::from_sign(typ.sign()), typ);
        }
    }

    #[test]
    fn test_out_of_range_signs_clamp() {
        assert_eq!(AlignmentType::from_sign(7), AlignmentType::Lawful);
        assert_eq!(AlignmentType::from_sign(-128), AlignmentType::Chaotic);
    }
}
