//! Dungeon system
//!
//! Contains level structure, cells, dungeon topology, rooms, traps and
//! area regions.

mod cell;
mod dlevel;
mod level;
mod region;
mod room;
mod topology;
mod trap;

pub use cell::{Cell, CellType};
pub use dlevel::DLevel;
pub use level::{
    DestArea, Engraving, EngravingType, FloatingPool, Level, LevelFlags, Stairway, TerrainDamage,
};
pub use region::{Region, RegionType};
pub use room::{Bounds, Room, RoomType};
pub use topology::{Branch, BranchType, Dungeon, DungeonFlags, DungeonSystem, SpecialLevel};
pub use trap::{Trap, TrapType};
