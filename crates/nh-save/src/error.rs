//! Save/restore errors

use thiserror::Error;

/// Save/restore errors
///
/// Everything except `Io`, `NotFound` and `Unsavable` means the stream is
/// unusable; nothing read from it should be kept. `Unsavable` is raised
/// while writing, before anything reaches disk.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save file ends early while reading {section}")]
    UnexpectedEof { section: &'static str },

    #[error("bad magic in {section}: expected {expected:?}, found {found:#010x}")]
    BadMagic {
        section: &'static str,
        expected: &'static str,
        found: u32,
    },

    #[error("incompatible save version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: String, found: String },

    #[error("{what} {id} is referenced but does not exist")]
    MissingReference { what: &'static str, id: u32 },

    #[error("cannot save {section}: {reason}")]
    Unsavable { section: &'static str, reason: String },

    #[error("save file corrupted: {0}")]
    Corrupt(String),

    #[error("Save file not found")]
    NotFound,
}

impl SaveError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(%msg, "corrupt save stream");
        SaveError::Corrupt(msg)
    }

    pub(crate) fn unsavable(section: &'static str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(section, %reason, "state cannot be saved");
        SaveError::Unsavable { section, reason }
    }

    pub(crate) fn missing(what: &'static str, id: u32) -> Self {
        tracing::error!(what, id, "dangling reference in save stream");
        SaveError::MissingReference { what, id }
    }
}

pub type SaveResult<T> = Result<T, SaveError>;
