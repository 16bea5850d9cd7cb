//! Database connection management
//!
//! This module provides the connection wrapper shared by the migrator and
//! every migration it runs.

use std::rc::Rc;

use anyhow::{anyhow, Result};
use rusqlite::Connection;

/// Connection handle shared between the migrator, its locator and the
/// migrations the locator instantiates.
///
/// Migrations run synchronously on a single thread, so a plain `Rc` is
/// enough; the handle is deliberately not `Send`.
pub type SharedConn = Rc<DatabaseConn>;

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure(path.is_some())?;
        Ok(db)
    }

    /// Open a database at the specified path (convenience method)
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    /// Wrap this connection for sharing with a migrator and its migrations
    pub fn into_shared(self) -> SharedConn {
        Rc::new(self)
    }

    fn configure(&self, on_disk: bool) -> Result<()> {
        if on_disk {
            // in-memory databases report "memory" and ignore WAL
            let _: String = self
                .conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;
        }

        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        self.conn
            .busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))?;

        Ok(())
    }

    /// Execute a single SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Execute a script of semicolon-separated statements
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| anyhow!("Failed to execute SQL batch: {}", e))
    }

    /// Begin an unchecked transaction
    ///
    /// The returned guard rolls back when dropped without `commit()`.
    /// Statements issued through other clones of the shared handle while the
    /// guard is alive run inside the same transaction.
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))
    }

    /// Whether a transaction is currently open on this connection
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_path_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite3");
        let db = DatabaseConn::open_path(path.to_str().unwrap()).unwrap();
        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)")
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_execute_surfaces_errors() {
        let db = DatabaseConn::open_in_memory().unwrap();
        assert!(db.execute("DROP TABLE missing_table").is_err());
        assert!(db.execute_batch("CREATE TABLE a (id INT); BOGUS;").is_err());
    }

    #[test]
    fn test_transaction_rolls_back_on_drop() {
        let db = DatabaseConn::open_in_memory().unwrap().into_shared();
        let other = SharedConn::clone(&db);

        {
            let _tx = db.transaction().unwrap();
            assert!(db.in_transaction());
            other
                .execute("CREATE TABLE scratch (id INTEGER)")
                .unwrap();
        }

        assert!(!db.in_transaction());
        assert!(!db.table_exists("scratch").unwrap());
    }

    #[test]
    fn test_transaction_commit() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let tx = db.transaction().unwrap();
        tx.execute("CREATE TABLE kept (id INTEGER)", []).unwrap();
        tx.commit().unwrap();

        assert!(db.table_exists("kept").unwrap());
    }
}
