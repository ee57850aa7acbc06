//! Object class definitions (objclass.h)

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

/// Object classes
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
#[repr(u8)]
pub enum ObjectClass {
    #[default]
    Random = 0,
    IllObj = 1,
    Weapon = 2,
    Armor = 3,
    Ring = 4,
    Amulet = 5,
    Tool = 6,
    Food = 7,
    Potion = 8,
    Scroll = 9,
    Spellbook = 10,
    Wand = 11,
    Coin = 12,
    Gem = 13,
    Rock = 14,
    Ball = 15,
    Chain = 16,
    Venom = 17,
}

impl ObjectClass {
    /// Get the inventory symbol for this class
    pub const fn symbol(&self) -> char {
        match self {
            ObjectClass::Random => '?',
            ObjectClass::IllObj => ']',
            ObjectClass::Weapon => ')',
            ObjectClass::Armor => '[',
            ObjectClass::Ring => '=',
            ObjectClass::Amulet => '"',
            ObjectClass::Tool => '(',
            ObjectClass::Food => '%',
            ObjectClass::Potion => '!',
            ObjectClass::Scroll => '?',
            ObjectClass::Spellbook => '+',
            ObjectClass::Wand => '/',
            ObjectClass::Coin => '$',
            ObjectClass::Gem => '*',
            ObjectClass::Rock => '`',
            ObjectClass::Ball => '0',
            ObjectClass::Chain => '_',
            ObjectClass::Venom => '.',
        }
    }

    /// Classes whose members may carry a fuel-style (relative) age
    pub const fn may_burn_fuel(&self) -> bool {
        matches!(self, ObjectClass::Tool | ObjectClass::Potion)
    }
}

// Object type indices referenced by the persistence layer. The full object
// table lives with the gameplay data; only the types whose stored fields
// need special handling on restore are named here.
pub const CORPSE: i16 = 270;
pub const EGG: i16 = 271;
pub const SLIME_MOLD: i16 = 276;
pub const FIGURINE: i16 = 218;
pub const WAX_CANDLE: i16 = 220;
pub const TALLOW_CANDLE: i16 = 221;
pub const BRASS_LANTERN: i16 = 222;
pub const OIL_LAMP: i16 = 223;
pub const MAGIC_LAMP: i16 = 224;
pub const CANDELABRUM: i16 = 230;
pub const POT_OIL: i16 = 310;

/// Does `age` hold remaining fuel rather than a creation turn?
///
/// Relative ages are not shifted when a bones level is moved onto a new
/// game's clock.
pub const fn age_is_relative(class: ObjectClass, otyp: i16) -> bool {
    if !class.may_burn_fuel() {
        return false;
    }
    matches!(
        otyp,
        BRASS_LANTERN | OIL_LAMP | CANDELABRUM | TALLOW_CANDLE | WAX_CANDLE | POT_OIL
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_repr_round_trip() {
        for raw in 0u8..=17 {
            let class = ObjectClass::from_repr(raw).expect("class in range");
            assert_eq!(class as u8, raw);
        }
        assert!(ObjectClass::from_repr(18).is_none());
    }

    #[test]
    fn test_age_is_relative() {
        assert!(age_is_relative(ObjectClass::Tool, OIL_LAMP));
        assert!(age_is_relative(ObjectClass::Potion, POT_OIL));
        assert!(!age_is_relative(ObjectClass::Tool, MAGIC_LAMP));
        assert!(!age_is_relative(ObjectClass::Food, CORPSE));
        // Type index alone is not enough; the class must allow fuel
        assert!(!age_is_relative(ObjectClass::Food, OIL_LAMP));
    }
}
