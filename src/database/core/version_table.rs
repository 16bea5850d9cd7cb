//! Version table management
//!
//! The version table holds a single row whose one column is the currently
//! applied migration version. It is the only persistent state the migrator
//! owns.

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::info;

use crate::error::{MigrationError, Result};
use crate::migration::Version;

/// Default name of the table holding the current version
pub const DEFAULT_VERSION_TABLE: &str = "schema_migration";

/// Default name of the column holding the current version
pub const DEFAULT_VERSION_COLUMN: &str = "version";

/// Location of the version record: a table name and a column name
///
/// Both names are interpolated into SQL, so they are restricted to plain
/// identifiers at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTable {
    table: String,
    column: String,
}

impl Default for VersionTable {
    fn default() -> Self {
        Self {
            table: DEFAULT_VERSION_TABLE.to_string(),
            column: DEFAULT_VERSION_COLUMN.to_string(),
        }
    }
}

impl VersionTable {
    /// Create a version table description with custom names
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Result<Self> {
        let table = table.into();
        let column = column.into();
        validate_identifier(&table, "table")?;
        validate_identifier(&column, "column")?;
        Ok(Self { table, column })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Check whether the version table exists
    pub fn exists(&self, conn: &Connection) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&self.table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create the version table and seed its single row
    ///
    /// Returns `true` if the table was created or the row was seeded, and
    /// `false` if the table already held a row.
    pub fn install(&self, conn: &Connection) -> Result<bool> {
        let existed = self.exists(conn)?;
        if !existed {
            conn.execute(
                &format!(
                    "CREATE TABLE {} ({} INTEGER NOT NULL DEFAULT 0)",
                    self.table, self.column
                ),
                [],
            )?;
        }

        let rows: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        if rows > 0 {
            return Ok(!existed);
        }

        conn.execute(
            &format!("INSERT INTO {} ({}) VALUES (0)", self.table, self.column),
            [],
        )?;
        info!("Installed version table {}.{}", self.table, self.column);
        Ok(true)
    }

    /// Read the current version
    ///
    /// The stored value is coerced to an integer: NULL reads as 0, and text
    /// or real values are parsed. Anything other than exactly one row is an
    /// error.
    pub fn fetch(&self, conn: &Connection) -> Result<Version> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM {}", self.column, self.table))?;
        let values = stmt
            .query_map([], |row| coerce_version(row.get_ref(0)?))?
            .collect::<rusqlite::Result<Vec<Option<i64>>>>()?;

        match values.as_slice() {
            [value] => self.to_version(*value),
            [] => Err(MigrationError::VersionRecord(format!(
                "Version table {} holds no version row.",
                self.table
            ))),
            rows => Err(MigrationError::VersionRecord(format!(
                "Version table {} holds {} rows, expected exactly one.",
                self.table,
                rows.len()
            ))),
        }
    }

    /// Overwrite the current version
    pub fn store(&self, conn: &Connection, version: Version) -> Result<()> {
        let updated = conn.execute(
            &format!("UPDATE {} SET {} = ?1", self.table, self.column),
            [version],
        )?;
        if updated != 1 {
            return Err(MigrationError::VersionRecord(format!(
                "Version table {} updated {} rows, expected exactly one.",
                self.table, updated
            )));
        }
        Ok(())
    }

    fn to_version(&self, value: Option<i64>) -> Result<Version> {
        let Some(value) = value else {
            return Err(MigrationError::VersionRecord(format!(
                "Version table {} holds a non-numeric version.",
                self.table
            )));
        };
        Version::try_from(value).map_err(|_| {
            MigrationError::VersionRecord(format!(
                "Version table {} holds invalid version {}.",
                self.table, value
            ))
        })
    }
}

/// `None` marks a value that cannot be read as a number at all
fn coerce_version(value: ValueRef<'_>) -> rusqlite::Result<Option<i64>> {
    Ok(match value {
        ValueRef::Null => Some(0),
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f.trunc() as i64),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok()),
        ValueRef::Blob(_) => None,
    })
}

fn validate_identifier(name: &str, kind: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(MigrationError::Configuration(format!(
            "Invalid version {} name [{}].",
            kind, name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_default_names() {
        let table = VersionTable::default();
        assert_eq!(table.table(), "schema_migration");
        assert_eq!(table.column(), "version");
    }

    #[test]
    fn test_rejects_invalid_identifiers() {
        assert!(matches!(
            VersionTable::new("schema migration", "version"),
            Err(MigrationError::Configuration(_))
        ));
        assert!(matches!(
            VersionTable::new("schema_migration", "version; DROP TABLE x"),
            Err(MigrationError::Configuration(_))
        ));
        assert!(matches!(
            VersionTable::new("", "version"),
            Err(MigrationError::Configuration(_))
        ));
        assert!(VersionTable::new("_meta2", "v").is_ok());
    }

    #[test]
    fn test_install_is_idempotent() {
        let conn = create_test_db();
        let table = VersionTable::default();

        assert!(!table.exists(&conn).unwrap());
        assert!(table.install(&conn).unwrap());
        assert!(table.exists(&conn).unwrap());
        assert!(!table.install(&conn).unwrap());

        assert_eq!(table.fetch(&conn).unwrap(), 0);
    }

    #[test]
    fn test_install_seeds_empty_table() {
        let conn = create_test_db();
        conn.execute("CREATE TABLE schema_migration (version INT)", [])
            .unwrap();
        let table = VersionTable::default();

        assert!(table.install(&conn).unwrap());
        assert_eq!(table.fetch(&conn).unwrap(), 0);
    }

    #[test]
    fn test_store_and_fetch() {
        let conn = create_test_db();
        let table = VersionTable::new("migrations_meta", "current").unwrap();
        table.install(&conn).unwrap();

        table.store(&conn, 7).unwrap();
        assert_eq!(table.fetch(&conn).unwrap(), 7);
    }

    #[test]
    fn test_fetch_coerces_values() {
        let conn = create_test_db();
        conn.execute("CREATE TABLE schema_migration (version)", [])
            .unwrap();
        let table = VersionTable::default();

        conn.execute("INSERT INTO schema_migration (version) VALUES (NULL)", [])
            .unwrap();
        assert_eq!(table.fetch(&conn).unwrap(), 0);

        conn.execute("UPDATE schema_migration SET version = '3'", [])
            .unwrap();
        assert_eq!(table.fetch(&conn).unwrap(), 3);

        conn.execute("UPDATE schema_migration SET version = 2.0", [])
            .unwrap();
        assert_eq!(table.fetch(&conn).unwrap(), 2);

        conn.execute("UPDATE schema_migration SET version = -1", [])
            .unwrap();
        assert!(matches!(
            table.fetch(&conn),
            Err(MigrationError::VersionRecord(_))
        ));
    }

    #[test]
    fn test_fetch_requires_exactly_one_row() {
        let conn = create_test_db();
        conn.execute("CREATE TABLE schema_migration (version INT)", [])
            .unwrap();
        let table = VersionTable::default();

        assert!(matches!(
            table.fetch(&conn),
            Err(MigrationError::VersionRecord(_))
        ));

        conn.execute("INSERT INTO schema_migration (version) VALUES (1), (2)", [])
            .unwrap();
        assert!(matches!(
            table.fetch(&conn),
            Err(MigrationError::VersionRecord(_))
        ));
    }

    #[test]
    fn test_fetch_missing_table() {
        let conn = create_test_db();
        let table = VersionTable::default();
        assert!(matches!(
            table.fetch(&conn),
            Err(MigrationError::Database(_))
        ));
    }

    #[test]
    fn test_store_without_row_fails() {
        let conn = create_test_db();
        conn.execute("CREATE TABLE schema_migration (version INT)", [])
            .unwrap();
        let table = VersionTable::default();

        assert!(matches!(
            table.store(&conn, 1),
            Err(MigrationError::VersionRecord(_))
        ));
    }
}
