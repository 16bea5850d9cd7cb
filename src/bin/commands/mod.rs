pub mod config;
pub mod init;
pub mod migrate;
pub mod status;

use anyhow::Result;
use sqlshift::database::{DatabaseConn, SharedConn};
use sqlshift::{GlobLocator, Migrator, SqlshiftConfig};

/// Open the configured database and discover its migrations
///
/// Progress messages go to stdout, one per line.
pub(crate) fn open_migrator(config: &SqlshiftConfig) -> Result<Migrator<GlobLocator>> {
    let conn = DatabaseConn::open_path(&config.database_path)?.into_shared();
    let locator = GlobLocator::new(SharedConn::clone(&conn), &config.migrations_dir)?;
    let migrator = Migrator::with_version_table(
        conn,
        locator,
        |message: &str| println!("{}", message),
        config.version_table()?,
    )?;
    Ok(migrator)
}
