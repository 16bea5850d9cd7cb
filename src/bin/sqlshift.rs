use clap::{Parser, Subcommand};
use sqlshift::SqlshiftConfig;
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::migrate::{MigrateArgs, Step};
use commands::status::StatusArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./sqlshift.toml is used if present
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the version table with its single row if it is missing
    Init,

    /// Migrate to a target version, by default the latest available one
    Migrate(MigrateArgs),

    /// Migrate up, by default by one version
    Up(MigrateArgs),

    /// Migrate down, by default by one version
    Down(MigrateArgs),

    /// Show the current and latest available versions
    Status(StatusArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            // filter spans/events with level INFO or higher.
            .with_max_level(Level::INFO)
            .init();
    }

    let config = match SqlshiftConfig::new(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Init => commands::init::run(&config),
        Commands::Migrate(args) => commands::migrate::run(&config, Step::Migrate, args),
        Commands::Up(args) => commands::migrate::run(&config, Step::Up, args),
        Commands::Down(args) => commands::migrate::run(&config, Step::Down, args),
        Commands::Status(args) => commands::status::run(&config, args),
        Commands::Config(args) => commands::config::run(&config, args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}
