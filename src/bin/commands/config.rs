use anyhow::Result;
use clap::Args;
use sqlshift::SqlshiftConfig;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Print a commented configuration template instead
    #[clap(long)]
    pub template: bool,
}

pub fn run(config: &SqlshiftConfig, args: ConfigArgs) -> Result<i32> {
    if args.template {
        print!("{}", SqlshiftConfig::template());
        return Ok(0);
    }

    println!("{}", config.summary());
    Ok(0)
}
