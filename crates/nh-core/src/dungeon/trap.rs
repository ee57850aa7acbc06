//! Traps (trap.h)

use serde::{Deserialize, Serialize};
use strum::FromRepr;

use super::DLevel;

/// Trap types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum TrapType {
    Arrow = 1,
    Dart = 2,
    RockFall = 3,
    Squeaky = 4,
    BearTrap = 5,
    LandMine = 6,
    RollingBoulder = 7,
    SleepingGas = 8,
    RustTrap = 9,
    FireTrap = 10,
    Pit = 11,
    SpikedPit = 12,
    Hole = 13,
    TrapDoor = 14,
    Teleport = 15,
    LevelTeleport = 16,
    MagicPortal = 17,
    Web = 18,
    Statue = 19,
    MagicTrap = 20,
    AntiMagic = 21,
    Polymorph = 22,
}

/// Trap on the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    pub x: i8,
    pub y: i8,
    pub trap_type: TrapType,
    pub seen: bool,
    /// One-shot trap (destroyed after triggering, e.g. land mine)
    pub once: bool,
    /// Trap was set by the player
    pub madeby_u: bool,
    /// Launch point for rolling boulders
    pub launch: (i8, i8),
    /// Destination for portals and level teleporters
    pub dst: DLevel,
}

impl Trap {
    pub fn new(x: i8, y: i8, trap_type: TrapType) -> Self {
        Self {
            x,
            y,
            trap_type,
            seen: false,
            once: false,
            madeby_u: false,
            launch: (0, 0),
            dst: DLevel::default(),
        }
    }
}
