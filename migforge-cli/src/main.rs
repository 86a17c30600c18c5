use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::OutputFormat;
use config::MigforgeConfig;

#[derive(Parser)]
#[command(name = "migforge")]
#[command(about = "Scaffold database migrations and keep their registry in execution order")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to current directory)
    #[arg(short = 'P', long, global = true)]
    project: Option<PathBuf>,

    /// Config file (defaults to migforge.toml in the project directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Migrations directory, overrides the config file
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Registry file, overrides the config file
    #[arg(short, long, global = true)]
    registry: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new migration and rebuild the registry
    Create(commands::create::CreateCommand),

    /// Rebuild the registry from the migrations directory
    Rebuild {
        /// Print the registry instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Fail if the registry is out of date
    Check,

    /// List migrations in execution order
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Database operations
    Db(commands::db::DbCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let project_path = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };

    let mut config = MigforgeConfig::load(&project_path, cli.config.as_deref())?;
    if let Some(dir) = &cli.dir {
        config = config.with_directory(dir);
    }
    if let Some(registry) = &cli.registry {
        config = config.with_registry(registry);
    }
    log::debug!(
        "Migrations in {}, registry at {}",
        config.directory.display(),
        config.registry.display()
    );

    match cli.command {
        Commands::Create(create_cmd) => create_cmd.execute(&config).await,
        Commands::Rebuild { dry_run } => commands::rebuild::run(&config, dry_run).await,
        Commands::Check => commands::rebuild::check(&config).await,
        Commands::List { format } => commands::list::run(&config, format).await,
        Commands::Db(db_cmd) => db_cmd.execute(&config).await,
    }
}
