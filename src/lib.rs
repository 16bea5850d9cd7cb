#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! sqlshift - versioned, reversible schema migrations for SQLite
//!
//! sqlshift applies an ordered sequence of migrations to a database, keeps
//! the applied version in a single-row version table, and moves up or down
//! to a target version inside one transaction. A failed step rolls the whole
//! run back and leaves the version untouched.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none)  | Library: migrator, locators, version table | `rusqlite`, `config` |
//! | `cli`   | The `sqlshift` binary | `clap`, `tracing-subscriber`, `serde_json` |
//!
//! # Architecture
//!
//! - **[`database`]**: SQLite connection wrapper and version table I/O
//! - **[`migration`]**: the [`Migration`] contract and SQL-script migrations
//! - **[`locator`]**: resolving versions to migrations ([`FactoryLocator`],
//!   [`GlobLocator`])
//! - **[`migrator`]**: the [`Migrator`] engine
//! - **[`config`]**: configuration loading for the binary
//!
//! # Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use sqlshift::database::{DatabaseConn, SharedConn};
//! use sqlshift::{FactoryLocator, Migration, Migrator, SqlMigration};
//!
//! let conn = DatabaseConn::open_in_memory()?.into_shared();
//!
//! let c = SharedConn::clone(&conn);
//! let locator = FactoryLocator::new().with(move || {
//!     Box::new(SqlMigration::new(
//!         SharedConn::clone(&c),
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
//!         "DROP TABLE users;",
//!     )) as Box<dyn Migration>
//! });
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! let mut migrator = Migrator::new(SharedConn::clone(&conn), locator, move |m: &str| {
//!     sink.borrow_mut().push(m.to_string())
//! })?;
//! migrator.install()?;
//!
//! let status = migrator.migrate(None)?;
//! assert!(status.is_success());
//! assert_eq!(log.borrow().last().unwrap(), "Migration up from 0 to 1 committed!");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod locator;
pub mod migration;
pub mod migrator;

pub use config::SqlshiftConfig;

pub use database::{DatabaseConn, SharedConn, VersionTable};

pub use error::{MigrationError, Result};

pub use locator::{FactoryLocator, GlobLocator, MigrationFactory, MigrationLocator};

pub use migration::{Direction, Migration, SqlMigration, Version};

pub use migrator::{MigrationStatus, Migrator, OutputSink, VersionStatus};
