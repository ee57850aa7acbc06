//! Player state
//!
//! The hero record (`You`), alignment and known spells.

mod alignment;
mod spell;
mod you;

pub use alignment::{Alignment, AlignmentType};
pub use spell::KnownSpell;
pub use you::{Position, You};
