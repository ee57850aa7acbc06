//! Area effects attached to a level, such as gas clouds

use serde::{Deserialize, Serialize};
use strum::FromRepr;

use super::room::Bounds;
use crate::monster::MonsterId;
use crate::reference::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum RegionType {
    StinkingCloud = 0,
    GasCloud = 1,
    FogCloud = 2,
    Silence = 3,
    ForceField = 4,
}

impl RegionType {
    /// Damage per turn to whoever stands inside
    pub const fn base_damage(self) -> i32 {
        match self {
            RegionType::StinkingCloud => 2,
            RegionType::GasCloud => 4,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_type: RegionType,
    pub bounds: Bounds,
    /// Zero means the region never dissipates
    pub turns_remaining: u32,
    pub damage: i32,
    pub visible: bool,
    pub player_created: bool,
    pub player_inside: bool,
    /// Monsters inside; ids only until the level's monsters are placed
    pub monsters: Vec<Reference<MonsterId>>,
}

impl Region {
    pub fn new(region_type: RegionType, x1: i8, y1: i8, x2: i8, y2: i8, duration: u32) -> Self {
        Self {
            region_type,
            bounds: Bounds::new(x1, y1, x2, y2),
            turns_remaining: duration,
            damage: region_type.base_damage(),
            visible: true,
            player_created: false,
            player_inside: false,
            monsters: Vec::new(),
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.turns_remaining == 0
    }

    pub fn contains(&self, x: i8, y: i8) -> bool {
        self.bounds.contains(x, y)
    }
}
