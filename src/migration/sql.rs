//! SQL script migrations
//!
//! Artifacts discovered on disk are plain SQL files split into an up and a
//! down section by marker lines:
//!
//! ```sql
//! -- migrate:up
//! CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
//!
//! -- migrate:down
//! DROP TABLE users;
//! ```

use std::path::Path;

use anyhow::{anyhow, bail};
use tracing::debug;

use super::Migration;
use crate::database::SharedConn;
use crate::error::{MigrationError, Result};

pub const UP_MARKER: &str = "-- migrate:up";
pub const DOWN_MARKER: &str = "-- migrate:down";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Up,
    Down,
}

/// A migration made of two SQL scripts run with `execute_batch`
pub struct SqlMigration {
    conn: SharedConn,
    up_sql: String,
    down_sql: String,
}

impl SqlMigration {
    pub fn new(conn: SharedConn, up_sql: impl Into<String>, down_sql: impl Into<String>) -> Self {
        Self {
            conn,
            up_sql: up_sql.into(),
            down_sql: down_sql.into(),
        }
    }

    /// Split a marked-up SQL source into its up and down scripts
    ///
    /// Text before the first marker is ignored. The up section is required;
    /// a missing down section leaves `down` as a no-op.
    pub fn parse(conn: SharedConn, source: &str) -> anyhow::Result<Self> {
        let mut section = Section::Preamble;
        let mut up: Option<String> = None;
        let mut down: Option<String> = None;

        for line in source.lines() {
            if let Some(marker) = section_marker(line) {
                let slot = match marker {
                    Section::Up => &mut up,
                    _ => &mut down,
                };
                if slot.is_some() {
                    bail!("duplicate '{}' section", line.trim());
                }
                *slot = Some(String::new());
                section = marker;
                continue;
            }

            let buf = match section {
                Section::Up => up.as_mut(),
                Section::Down => down.as_mut(),
                Section::Preamble => None,
            };
            if let Some(buf) = buf {
                buf.push_str(line);
                buf.push('\n');
            }
        }

        let up = up.ok_or_else(|| anyhow!("missing '{}' section", UP_MARKER))?;
        Ok(Self::new(conn, up, down.unwrap_or_default()))
    }

    /// Load and parse a SQL artifact from disk
    pub fn from_file(conn: SharedConn, path: &Path) -> Result<Self> {
        let artifact_error = |reason: String| MigrationError::Artifact {
            path: path.display().to_string(),
            reason,
        };

        let source = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let migration = Self::parse(conn, &source).map_err(|e| artifact_error(e.to_string()))?;
        debug!("Loaded SQL migration from {}", path.display());
        Ok(migration)
    }

    pub fn up_sql(&self) -> &str {
        &self.up_sql
    }

    pub fn down_sql(&self) -> &str {
        &self.down_sql
    }
}

impl Migration for SqlMigration {
    fn up(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(&self.up_sql)
    }

    fn down(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(&self.down_sql)
    }
}

fn section_marker(line: &str) -> Option<Section> {
    let line = line.trim();
    if line.eq_ignore_ascii_case(UP_MARKER) {
        Some(Section::Up)
    } else if line.eq_ignore_ascii_case(DOWN_MARKER) {
        Some(Section::Down)
    } else {
        None
    }
}
