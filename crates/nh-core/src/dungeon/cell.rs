//! Map squares and their packed save form

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

/// Terrain; the discriminant is stored in the low six bits of a packed cell
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
pub enum CellType {
    #[default]
    Stone = 0,
    VWall = 1,
    HWall = 2,
    TLCorner = 3,
    TRCorner = 4,
    BLCorner = 5,
    BRCorner = 6,
    CrossWall = 7,
    TUWall = 8,
    TDWall = 9,
    TLWall = 10,
    TRWall = 11,
    /// Raised drawbridge seen edge-on
    DBWall = 12,
    Tree = 13,
    SecretDoor = 14,
    SecretCorridor = 15,
    Pool = 16,
    Moat = 17,
    Water = 18,
    DrawbridgeUp = 19,
    Lava = 20,
    IronBars = 21,
    Door = 22,
    Corridor = 23,
    Room = 24,
    Stairs = 25,
    Ladder = 26,
    Fountain = 27,
    Throne = 28,
    Sink = 29,
    Grave = 30,
    Altar = 31,
    Ice = 32,
    DrawbridgeDown = 33,
    Air = 34,
    Cloud = 35,
}

impl CellType {
    /// Monsters and objects may legitimately occupy it
    pub const fn is_accessible(&self) -> bool {
        (*self as u8) >= CellType::Door as u8
    }

    /// Map symbol in the default symbol set
    pub const fn symbol(&self) -> char {
        match self {
            CellType::Stone => ' ',
            CellType::VWall => '|',
            CellType::HWall => '-',
            CellType::TLCorner
            | CellType::TRCorner
            | CellType::BLCorner
            | CellType::BRCorner
            | CellType::CrossWall
            | CellType::TUWall
            | CellType::TDWall => '-',
            CellType::TLWall | CellType::TRWall | CellType::DBWall => '|',
            CellType::Tree
            | CellType::SecretDoor
            | CellType::SecretCorridor
            | CellType::DrawbridgeUp
            | CellType::IronBars
            | CellType::Corridor
            | CellType::Sink
            | CellType::Cloud => '#',
            CellType::Pool | CellType::Moat | CellType::Water | CellType::Lava => '}',
            CellType::Door => '+',
            CellType::Room | CellType::Ice | CellType::DrawbridgeDown => '.',
            CellType::Stairs | CellType::Ladder => '>',
            CellType::Fountain => '{',
            CellType::Throne => '\\',
            CellType::Grave => '|',
            CellType::Altar => '_',
            CellType::Air => ' ',
        }
    }
}

/// Bit layout of a packed cell. The glyph is stored separately.
mod packed {
    pub const TYP_MASK: u32 = 0x3f;
    pub const SEEN_FROM_SHIFT: u32 = 6;
    pub const FLAGS_SHIFT: u32 = 14;
    pub const FLAGS_MASK: u32 = 0x3f;
    pub const HORIZONTAL: u32 = 1 << 20;
    pub const LIT: u32 = 1 << 21;
    pub const WAS_LIT: u32 = 1 << 22;
    pub const ROOM_SHIFT: u32 = 23;
    pub const ROOM_MASK: u32 = 0x3f;
    pub const EDGE: u32 = 1 << 29;
    pub const CAN_DIG: u32 = 1 << 30;
    pub const EXPLORED: u32 = 1 << 31;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// What the hero remembers seeing here
    pub glyph: i32,
    pub typ: CellType,
    /// Directions the square has been seen from
    pub seen_from: u8,
    /// Door state, altar alignment and similar; six bits are kept
    pub flags: u8,
    pub horizontal: bool,
    pub lit: bool,
    pub was_lit: bool,
    /// Owning room plus one, 0 outside rooms; six bits are kept
    pub room_number: u8,
    pub edge: bool,
    pub can_dig: bool,
    pub explored: bool,
}

impl Cell {
    pub const fn stone() -> Self {
        Self {
            glyph: 0,
            typ: CellType::Stone,
            seen_from: 0,
            flags: 0,
            horizontal: false,
            lit: false,
            was_lit: false,
            room_number: 0,
            edge: false,
            can_dig: true,
            explored: false,
        }
    }

    /// Lit room floor
    pub const fn floor() -> Self {
        Self {
            typ: CellType::Room,
            lit: true,
            ..Self::stone()
        }
    }

    /// Everything but the glyph, in one word
    pub fn packed(&self) -> u32 {
        use packed::*;

        let bit = |on: bool, mask: u32| if on { mask } else { 0 };
        (self.typ as u32 & TYP_MASK)
            | u32::from(self.seen_from) << SEEN_FROM_SHIFT
            | (u32::from(self.flags) & FLAGS_MASK) << FLAGS_SHIFT
            | (u32::from(self.room_number) & ROOM_MASK) << ROOM_SHIFT
            | bit(self.horizontal, HORIZONTAL)
            | bit(self.lit, LIT)
            | bit(self.was_lit, WAS_LIT)
            | bit(self.edge, EDGE)
            | bit(self.can_dig, CAN_DIG)
            | bit(self.explored, EXPLORED)
    }

    /// Inverse of [`Cell::packed`]. An unknown terrain code comes back as
    /// the error.
    pub fn from_packed(bits: u32, glyph: i32) -> Result<Self, u8> {
        use packed::*;

        let code = (bits & TYP_MASK) as u8;
        let typ = CellType::from_repr(code).ok_or(code)?;
        Ok(Self {
            glyph,
            typ,
            seen_from: (bits >> SEEN_FROM_SHIFT) as u8,
            flags: ((bits >> FLAGS_SHIFT) & FLAGS_MASK) as u8,
            horizontal: bits & HORIZONTAL != 0,
            lit: bits & LIT != 0,
            was_lit: bits & WAS_LIT != 0,
            room_number: ((bits >> ROOM_SHIFT) & ROOM_MASK) as u8,
            edge: bits & EDGE != 0,
            can_dig: bits & CAN_DIG != 0,
            explored: bits & EXPLORED != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_terrain_survives_packing() {
        for typ in CellType::iter() {
            let cell = Cell { typ, ..Cell::stone() };
            assert_eq!(Cell::from_packed(cell.packed(), 0), Ok(cell));
        }
    }

    #[test]
    fn test_explored_is_top_bit() {
        let cell = Cell {
            explored: true,
            can_dig: false,
            ..Cell::stone()
        };
        assert_eq!(cell.packed(), 1 << 31);
    }

    #[test]
    fn test_unknown_terrain_code() {
        assert_eq!(Cell::from_packed(40, 0), Err(40));
    }

    #[test]
    fn test_floor_is_accessible() {
        assert!(Cell::floor().typ.is_accessible());
        assert!(!Cell::stone().typ.is_accessible());
        assert_eq!(Cell::floor().typ.symbol(), '.');
    }
}
