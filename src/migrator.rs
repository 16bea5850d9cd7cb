//! Migration orchestration
//!
//! The [`Migrator`] reads the current version from the version table, works
//! out which migrations lie between it and the target, and runs them in
//! order inside a single transaction. Progress is narrated through an
//! injected output sink; the database state is all-or-nothing while the
//! narration is not.

use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::database::{SharedConn, VersionTable};
use crate::error::{MigrationError, Result};
use crate::locator::MigrationLocator;
use crate::migration::{Direction, Version};

/// Receives one progress message at a time
pub type OutputSink = Box<dyn FnMut(&str)>;

/// Outcome of a `migrate`, `up` or `down` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Every step ran and the new version was committed
    Committed {
        direction: Direction,
        from: Version,
        to: Version,
    },
    /// Nothing to do: already at the target, or the requested direction is
    /// already satisfied
    Unchanged { version: Version },
    /// A step failed; the transaction was rolled back and the version left
    /// at `from`
    RolledBack {
        direction: Direction,
        from: Version,
        to: Version,
        error: String,
    },
}

impl MigrationStatus {
    /// `false` only when the run was rolled back
    pub fn is_success(&self) -> bool {
        !matches!(self, MigrationStatus::RolledBack { .. })
    }

    /// Process exit code for scripting: 0 on success, 1 on rollback
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Where the database stands relative to the known migrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VersionStatus {
    /// The version table does not exist yet
    NotInstalled { latest: Version },
    /// At the latest known version
    Current { version: Version },
    /// Older migrations applied; `latest - current` migrations are pending
    Behind { current: Version, latest: Version },
    /// The database is at a version this locator does not know about
    Ahead { current: Version, latest: Version },
}

/// Applies migrations from a locator to a database
pub struct Migrator<L: MigrationLocator> {
    conn: SharedConn,
    locator: L,
    output: OutputSink,
    version_table: VersionTable,
}

impl<L: MigrationLocator> Migrator<L> {
    /// Create a migrator using the default `schema_migration.version` record
    pub fn new<F>(conn: SharedConn, locator: L, output: F) -> Result<Self>
    where
        F: FnMut(&str) + 'static,
    {
        Self::with_version_table(conn, locator, output, VersionTable::default())
    }

    /// Create a migrator that keeps its version record in `version_table`
    ///
    /// Fails if the connection already has an open transaction: the migrator
    /// owns the transaction boundary of every run.
    pub fn with_version_table<F>(
        conn: SharedConn,
        locator: L,
        output: F,
        version_table: VersionTable,
    ) -> Result<Self>
    where
        F: FnMut(&str) + 'static,
    {
        if conn.in_transaction() {
            return Err(MigrationError::Configuration(
                "Connection must not be inside a transaction for migrations.".to_string(),
            ));
        }

        Ok(Self {
            conn,
            locator,
            output: Box::new(output),
            version_table,
        })
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn version_table(&self) -> &VersionTable {
        &self.version_table
    }

    /// Create the version table with its single `0` row if it is missing
    pub fn install(&self) -> Result<bool> {
        self.version_table.install(&self.conn.conn)
    }

    /// Read the persisted version
    pub fn current_version(&self) -> Result<Version> {
        self.version_table.fetch(&self.conn.conn)
    }

    /// Highest version the locator can provide
    pub fn latest_version(&self) -> Version {
        self.locator.latest_version()
    }

    /// Compare the persisted version with the latest known one
    pub fn status(&self) -> Result<VersionStatus> {
        let latest = self.latest_version();
        if !self.version_table.exists(&self.conn.conn)? {
            return Ok(VersionStatus::NotInstalled { latest });
        }

        let current = self.current_version()?;
        Ok(match current.cmp(&latest) {
            std::cmp::Ordering::Equal => VersionStatus::Current { version: current },
            std::cmp::Ordering::Less => VersionStatus::Behind { current, latest },
            std::cmp::Ordering::Greater => VersionStatus::Ahead { current, latest },
        })
    }

    /// Move to `to`, or to the latest known version when `to` is `None`
    pub fn migrate(&mut self, to: Option<Version>) -> Result<MigrationStatus> {
        let from = self.current_version()?;
        let to = to.unwrap_or_else(|| self.locator.latest_version());

        if from == to {
            self.emit(&format!("Already at version {}, skipping migration.", to));
            return Ok(MigrationStatus::Unchanged { version: from });
        }

        let direction = if to > from {
            Direction::Up
        } else {
            Direction::Down
        };
        Ok(self.apply_migrations(direction, from, to))
    }

    /// Migrate up to `to`, or by one version when `to` is `None`
    ///
    /// Asking for a version at or below the current one is reported and
    /// treated as a no-op, not as a failure.
    pub fn up(&mut self, to: Option<Version>) -> Result<MigrationStatus> {
        let from = self.current_version()?;
        let to = to.unwrap_or_else(|| from.saturating_add(1));

        if from >= to {
            self.emit(&format!(
                "Currently at version {}, so cannot migrate up to version {}.",
                from, to
            ));
            return Ok(MigrationStatus::Unchanged { version: from });
        }

        Ok(self.apply_migrations(Direction::Up, from, to))
    }

    /// Migrate down to `to`, or by one version when `to` is `None`
    ///
    /// Asking for a version at or above the current one is reported and
    /// treated as a no-op, not as a failure.
    pub fn down(&mut self, to: Option<Version>) -> Result<MigrationStatus> {
        let from = self.current_version()?;
        let to = to.unwrap_or_else(|| from.saturating_sub(1));

        if from <= to {
            self.emit(&format!(
                "Cannot migrate down to version {} when already at or below it ({}).",
                to, from
            ));
            return Ok(MigrationStatus::Unchanged { version: from });
        }

        Ok(self.apply_migrations(Direction::Down, from, to))
    }

    fn apply_migrations(&mut self, direction: Direction, from: Version, to: Version) -> MigrationStatus {
        match self.run_transaction(direction, from, to) {
            Ok(()) => {
                info!("Migration {} from {} to {} committed", direction, from, to);
                self.emit(&format!(
                    "Migration {} from {} to {} committed!",
                    direction, from, to
                ));
                MigrationStatus::Committed {
                    direction,
                    from,
                    to,
                }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(
                    "Migration {} from {} to {} rolled back: {}",
                    direction, from, to, error
                );
                self.emit(&format!(
                    "Migration {} from {} to {} failed.",
                    direction, from, to
                ));
                self.emit(&error);
                self.emit(&format!("Rolled back to version {}.", from));
                MigrationStatus::RolledBack {
                    direction,
                    from,
                    to,
                    error,
                }
            }
        }
    }

    /// Run every step and record `to`; any early return drops the
    /// transaction guard, which rolls back
    fn run_transaction(&mut self, direction: Direction, from: Version, to: Version) -> Result<()> {
        let conn = Rc::clone(&self.conn);
        let tx = conn.transaction().map_err(MigrationError::Connection)?;

        self.emit(&format!(
            "Migrating {} from {} to {}.",
            direction, from, to
        ));

        match direction {
            Direction::Up => {
                for version in (from + 1)..=to {
                    self.locator
                        .get(version)?
                        .up()
                        .map_err(MigrationError::Execution)?;
                    self.emit(&format!("Migrated up to {}.", version));
                }
            }
            Direction::Down => {
                for version in ((to + 1)..=from).rev() {
                    self.locator
                        .get(version)?
                        .down()
                        .map_err(MigrationError::Execution)?;
                    self.emit(&format!("Migrated down from {}.", version));
                }
            }
        }

        self.version_table.store(&tx, to)?;
        tx.commit()?;
        Ok(())
    }

    fn emit(&mut self, message: &str) {
        debug!("{}", message);
        (self.output)(message);
    }
}
