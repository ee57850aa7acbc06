//! Monster system
//!
//! Monster instances, their extended (shopkeeper/priest) state, long worm
//! tails and the per-species vitals table.

mod extra;
mod monst;
mod mvitals;
mod worm;

pub use extra::{
    shopkeeper_name_known, BillEntry, MonsterExtra, PriestData, ShopkeeperData, SHOP_TYPES,
};
pub use monst::{peace_minded, Monster, MonsterId, MonsterState};
pub use mvitals::{MonsterVitals, VitalFlags};
pub use worm::{Worm, WormSegment};

/// Reference to a monster instance
pub type MonsterRef = MonsterId;
