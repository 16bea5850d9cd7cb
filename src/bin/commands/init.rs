use anyhow::Result;
use sqlshift::database::DatabaseConn;
use sqlshift::SqlshiftConfig;

pub fn run(config: &SqlshiftConfig) -> Result<i32> {
    let conn = DatabaseConn::open_path(&config.database_path)?;
    let table = config.version_table()?;

    if table.install(&conn.conn)? {
        println!(
            "Installed version table {}.{} in {}.",
            table.table(),
            table.column(),
            config.database_path
        );
    } else {
        println!(
            "Version table {}.{} already installed in {}.",
            table.table(),
            table.column(),
            config.database_path
        );
    }
    Ok(0)
}
