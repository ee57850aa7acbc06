//! Long worm tails
//!
//! The head of a long worm is an ordinary monster; its tail segments are
//! kept per worm number on the level.

use serde::{Deserialize, Serialize};

/// A single worm segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WormSegment {
    pub x: i8,
    pub y: i8,
}

/// Tail of one long worm
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worm {
    /// Segments from tail tip to the one adjacent to the head
    pub segments: Vec<WormSegment>,
    /// Turn at which the worm next grows
    pub grow_time: i64,
}

impl Worm {
    /// Worm length including the head
    pub fn length(&self) -> usize {
        self.segments.len() + 1
    }
}
