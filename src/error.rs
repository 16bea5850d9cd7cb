use thiserror::Error;

use crate::migration::Version;

pub type Result<T> = std::result::Result<T, MigrationError>;

#[derive(Error, Debug)]
pub enum MigrationError {
    /// Invalid construction input; no partially built value exists.
    #[error("{0}")]
    Configuration(String),

    #[error("Migration {0} not found.")]
    NotFound(Version),

    /// Raised by a migration's `up()` or `down()`.
    #[error("{0}")]
    Execution(anyhow::Error),

    #[error("Invalid migration artifact [{path}]: {reason}")]
    Artifact { path: String, reason: String },

    #[error("{0}")]
    VersionRecord(String),

    #[error("{0}")]
    Connection(anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
