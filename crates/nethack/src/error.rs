use nh_save::{SaveError, VersionInfo};
use nh_uncursed::UncursedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("save error: {0}")]
    Save(#[from] SaveError),

    #[error("renderer error: {0}")]
    Ui(#[from] UncursedError),

    #[error("save was written by version {0}")]
    Incompatible(VersionInfo),

    #[error("no save file given and none found")]
    NoSave,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
