//! Core game constants from NetHack
//!
//! These are derived from include/config.h, include/global.h, and other headers.

/// Map dimensions
pub const COLNO: usize = 80;
pub const ROWNO: usize = 21;

/// Maximum dungeon depth
pub const MAXDUNGEON: usize = 16;
pub const MAXLEVEL: usize = 32;

/// Room limits
pub const MAXNROFROOMS: usize = 40;
pub const MAX_SUBROOMS: usize = 24;

/// Monster limits (size of the vitals table)
pub const NUMMONS: usize = 400;

/// Long worm bookkeeping slots (worm number 0 means "not a worm")
pub const MAX_NUM_WORMS: usize = 32;

/// Number of artifacts tracked in the artifact table
pub const NROFARTIFACTS: usize = 64;

/// Spellbook slots
pub const MAXSPELL: usize = 40;

/// Messages kept in the history ring
pub const MSGHISTORY: usize = 20;

/// Regions per level
pub const MAX_REGIONS: usize = 32;

/// Turn counters start at 1; a fire time of 0 is never scheduled.
pub const FIRST_TURN: u64 = 1;
