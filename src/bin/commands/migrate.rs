use anyhow::Result;
use clap::Args;
use sqlshift::{SqlshiftConfig, Version};

use super::open_migrator;

/// Arguments shared by the migrate, up and down commands
#[derive(Args)]
pub struct MigrateArgs {
    /// Target version
    #[clap(short, long)]
    pub to: Option<Version>,
}

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Migrate,
    Up,
    Down,
}

/// Run one migration step; the exit code is 1 only when the run rolled back
pub fn run(config: &SqlshiftConfig, step: Step, args: MigrateArgs) -> Result<i32> {
    let mut migrator = open_migrator(config)?;

    let status = match step {
        Step::Migrate => migrator.migrate(args.to)?,
        Step::Up => migrator.up(args.to)?,
        Step::Down => migrator.down(args.to)?,
    };

    Ok(status.exit_code())
}
