//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with configuration
//! - `SharedConn`: the single-threaded handle migrations are constructed with
//! - `VersionTable`: reads and writes the single-row version record

mod connection;
mod version_table;

pub use connection::{DatabaseConn, SharedConn};
pub use version_table::{VersionTable, DEFAULT_VERSION_COLUMN, DEFAULT_VERSION_TABLE};
