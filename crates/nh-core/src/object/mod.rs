//! Object system
//!
//! Object instances, their classes, and the game-wide fruit and artifact
//! tables that objects refer to.

mod artifact;
mod fruit;
mod obj;
mod objclass;

pub use artifact::{ArtifactState, ArtifactTable};
pub use fruit::{Fruit, FruitTable};
pub use obj::{find_in_chain, BucStatus, Object, ObjectId, ObjectLocation, WornMask};
pub use objclass::{
    age_is_relative, ObjectClass, BRASS_LANTERN, CANDELABRUM, CORPSE, EGG, FIGURINE, MAGIC_LAMP,
    OIL_LAMP, POT_OIL, SLIME_MOLD, TALLOW_CANDLE, WAX_CANDLE,
};
