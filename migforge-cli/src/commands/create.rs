//! `migforge create`

use crate::config::MigforgeConfig;
use anyhow::{Context, Result};
use clap::Args;
use migforge::{CreateOptions, Creator, MigrationKind, Rebuilder};

#[derive(Debug, Args)]
pub struct CreateCommand {
    /// Migration name, e.g. "add users table"
    pub name: String,

    /// Migration kind (classic, change). Defaults to the configured kind
    #[arg(short, long)]
    pub kind: Option<String>,

    /// SQL for the up (or change) body
    #[arg(long)]
    pub up: Option<String>,

    /// SQL for the down body
    #[arg(long)]
    pub down: Option<String>,

    /// Do not rebuild the registry afterwards
    #[arg(long)]
    pub no_rebuild: bool,
}

impl CreateCommand {
    pub async fn execute(self, config: &MigforgeConfig) -> Result<()> {
        let kind = match self.kind.as_deref() {
            Some(kind) => kind.parse::<MigrationKind>()?,
            None => config.default_kind,
        };

        let engine = config.engine()?;
        let creator = Creator::new(&engine, &config.extension)?;

        let options = CreateOptions::new(self.name, config.package.clone())
            .kind(kind)
            .driver(config.driver)
            .up(self.up.unwrap_or_default())
            .down(self.down.unwrap_or_default());

        let created = creator
            .create(&config.directory, &options)
            .with_context(|| format!("Failed to create migration '{}'", options.name))?;

        println!("✅ Created {} migration: {}", created.kind, created.path.display());
        println!("   Identifier: {}", created.stamp.identifier);

        if self.no_rebuild {
            println!("\n📝 Registry not updated. Run `migforge rebuild` when ready.");
            return Ok(());
        }

        let rebuilder = Rebuilder::new(&engine, &config.extension)?;
        let outcome = rebuilder
            .rebuild(&config.directory, &config.package, &config.registry)
            .with_context(|| format!("Failed to rebuild registry '{}'", config.registry.display()))?;

        println!(
            "📋 Registry updated: {} ({} migrations)",
            config.registry.display(),
            outcome.count
        );
        Ok(())
    }
}
