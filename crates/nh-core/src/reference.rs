//! Persisted cross-references
//!
//! A reference from one record to another (a timer to the object it burns,
//! the player to the monster it rides) is written to disk as a raw numeric
//! id. While a save is being read the target may not exist yet, so the
//! reference stays `Unresolved` until a dedicated linking pass turns it into
//! a checked `Resolved` handle.

use serde::{Deserialize, Serialize};

/// Identifier types that can be persisted as a raw `u32`.
pub trait EntityId: Copy + Eq {
    fn raw(self) -> u32;
    fn from_raw(raw: u32) -> Self;
}

/// Cross-reference that is either a raw persisted id or a checked handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference<T> {
    /// Raw id as read from a save stream; not yet checked against the world.
    Unresolved(u32),
    /// Handle verified to name a live record.
    Resolved(T),
}

impl<T: EntityId> Reference<T> {
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }

    /// The raw id, whatever the resolution state.
    pub fn raw_id(&self) -> u32 {
        match *self {
            Reference::Unresolved(raw) => raw,
            Reference::Resolved(id) => id.raw(),
        }
    }

    pub fn resolved(&self) -> Option<T> {
        match *self {
            Reference::Resolved(id) => Some(id),
            Reference::Unresolved(_) => None,
        }
    }

    /// Drop back to the raw form, e.g. before writing.
    pub fn unresolve(self) -> Self {
        Reference::Unresolved(self.raw_id())
    }

    /// Does this reference name `id`, resolved or not?
    pub fn points_to(&self, id: T) -> bool {
        self.raw_id() == id.raw()
    }
}

impl<T: EntityId> From<T> for Reference<T> {
    fn from(id: T) -> Self {
        Reference::Resolved(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectId;

    #[test]
    fn test_reference_raw_id() {
        let unresolved: Reference<ObjectId> = Reference::Unresolved(7);
        let resolved: Reference<ObjectId> = ObjectId(41).into();

        assert_eq!(unresolved.raw_id(), 7);
        assert_eq!(resolved.raw_id(), 41);
        assert!(!unresolved.is_resolved());
        assert_eq!(resolved.resolved(), Some(ObjectId(41)));
        assert_eq!(resolved.unresolve(), Reference::Unresolved(41));
        assert!(resolved.points_to(ObjectId(41)));
    }
}
