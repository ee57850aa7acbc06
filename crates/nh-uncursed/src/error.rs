//! Renderer errors

use thiserror::Error;

/// Renderer errors
///
/// Only `NoBackend` is fatal at startup; a bad `--interface` or a broken
/// plugin is reported and selection falls back to the next candidate.
#[derive(Debug, Error)]
pub enum UncursedError {
    #[error("no usable interface backend")]
    NoBackend,

    #[error("unknown interface: {0}")]
    UnknownInterface(String),

    #[error("interface {requested} cannot take input: {active} already owns it")]
    InputAlreadyActive { requested: String, active: String },

    #[error("plugin {path}: {reason}")]
    Plugin { path: String, reason: String },

    #[error("tile region overlaps region {existing}")]
    RegionOverlap { existing: u32 },

    #[error("tile region out of bounds: {0}")]
    RegionBounds(String),

    #[error("no such window: {0}")]
    NoSuchWindow(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type UncursedResult<T> = Result<T, UncursedError>;
