//! Known spells (spellbook memory)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSpell {
    /// Spellbook object type
    pub spell_id: i16,
    /// Spell level
    pub level: i8,
    /// Turns until the spell is forgotten
    pub retention: i32,
}
