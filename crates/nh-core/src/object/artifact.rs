//! Artifact existence table

use serde::{Deserialize, Serialize};

use crate::NROFARTIFACTS;

/// Per-artifact bookkeeping that must survive a save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactState {
    /// Has been created this game
    pub exists: bool,
    /// Was granted as a gift
    pub gift: bool,
    /// Turn the artifact was last invoked
    pub last_invoked: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactTable {
    pub entries: Vec<ArtifactState>,
}

impl Default for ArtifactTable {
    fn default() -> Self {
        Self {
            entries: vec![ArtifactState::default(); NROFARTIFACTS],
        }
    }
}

impl ArtifactTable {
    pub fn gifts_given(&self) -> usize {
        self.entries.iter().filter(|a| a.gift).count()
    }
}
