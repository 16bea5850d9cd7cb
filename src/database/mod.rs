//! Database module
//!
//! ```text
//! database/
//! └── core/
//!     ├── connection     # SQLite DatabaseConn wrapper, SharedConn handle
//!     └── version_table  # single-row version record I/O
//! ```

pub mod core;

pub use core::{
    DatabaseConn, SharedConn, VersionTable, DEFAULT_VERSION_COLUMN, DEFAULT_VERSION_TABLE,
};
