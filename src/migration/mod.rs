//! Migration contract
//!
//! A migration is a reversible unit of schema change identified by its
//! version. It is constructed with the [`SharedConn`](crate::database::SharedConn)
//! it operates on and keeps that handle for its whole lifetime.

mod sql;

use std::fmt::{Display, Formatter};

use serde::Serialize;

pub use sql::{SqlMigration, DOWN_MARKER, UP_MARKER};

/// Position in the migration sequence; 0 means nothing has been applied
pub type Version = u32;

/// A reversible schema change
///
/// Both operations may run arbitrary statements and report failures through
/// the returned error; the migrator never inspects any other signal.
///
/// # Example
///
/// ```rust
/// use sqlshift::database::SharedConn;
/// use sqlshift::Migration;
///
/// struct CreateUsers {
///     conn: SharedConn,
/// }
///
/// impl Migration for CreateUsers {
///     fn up(&self) -> anyhow::Result<()> {
///         self.conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY)")?;
///         Ok(())
///     }
///
///     fn down(&self) -> anyhow::Result<()> {
///         self.conn.execute("DROP TABLE users")?;
///         Ok(())
///     }
/// }
/// ```
pub trait Migration {
    /// Apply the forward change
    fn up(&self) -> anyhow::Result<()>;

    /// Reverse the change made by `up`
    fn down(&self) -> anyhow::Result<()>;
}

/// Direction of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
        })
    }
}
