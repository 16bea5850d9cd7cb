use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlshift::{SqlshiftConfig, Version, VersionStatus};

use super::open_migrator;

/// Arguments for the Status command
#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    database_path: String,
    migrations_dir: String,
    latest_version: Version,
    status: VersionStatus,
}

pub fn run(config: &SqlshiftConfig, args: StatusArgs) -> Result<i32> {
    let migrator = open_migrator(config)?;

    let report = StatusReport {
        database_path: config.database_path.clone(),
        migrations_dir: migrator.locator().directory().display().to_string(),
        latest_version: migrator.latest_version(),
        status: migrator.status()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    println!("Database:        {}", report.database_path);
    println!("Migrations:      {}", report.migrations_dir);
    println!("Latest version:  {}", report.latest_version);
    match report.status {
        VersionStatus::NotInstalled { .. } => {
            println!("Current version: not installed (run `sqlshift init`)")
        }
        VersionStatus::Current { version } => {
            println!("Current version: {} (up to date)", version)
        }
        VersionStatus::Behind { current, latest } => println!(
            "Current version: {} ({} pending)",
            current,
            latest - current
        ),
        VersionStatus::Ahead { current, .. } => {
            println!("Current version: {} (newer than available migrations)", current)
        }
    }
    Ok(0)
}
