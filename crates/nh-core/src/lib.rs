//! nh-core: Game records for the NetHack persistence engine
//!
//! This crate holds the in-memory game world that the save/restore engine
//! reconstructs: objects, monsters, levels, timers, light sources, the
//! player record and dungeon topology. Gameplay rules live elsewhere; the
//! records here are treated as payload with stable numeric identifiers.

pub mod dungeon;
pub mod monster;
pub mod object;
pub mod player;
pub mod reference;
pub mod world;

mod consts;
mod gamestate;
mod rng;

pub use consts::*;
pub use gamestate::{GameState, LevelMap};
pub use reference::{EntityId, Reference};
pub use rng::{GameRng, RngState};
