//! `migforge list`

use super::OutputFormat;
use crate::config::MigforgeConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat};
use migforge::scanner::{MigrationPattern, MigrationSet};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ListedMigration {
    key: i64,
    identifier: String,
    name: String,
    path: String,
    /// Creation time recovered from the key
    created_at: Option<String>,
}

pub async fn run(config: &MigforgeConfig, format: OutputFormat) -> Result<()> {
    let pattern = MigrationPattern::new(&config.extension)?;
    let set = MigrationSet::scan(&config.directory, &pattern)
        .with_context(|| format!("Failed to scan '{}'", config.directory.display()))?;

    let migrations: Vec<ListedMigration> = set
        .iter()
        .map(|m| ListedMigration {
            key: m.key.value(),
            identifier: m.identifier(),
            name: m.name.clone(),
            path: m.display_path(),
            created_at: DateTime::from_timestamp(m.key.value(), 0)
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&migrations)?);
        }
        OutputFormat::Table => {
            if migrations.is_empty() {
                println!("No migrations found in {}", config.directory.display());
                return Ok(());
            }

            println!("📋 Migrations in {}:\n", config.directory.display());
            println!("{:<14} {:<22} {:<45} {}", "Key", "Created", "Identifier", "File");
            println!("{:-<100}", "");

            for migration in &migrations {
                println!(
                    "{:<14} {:<22} {:<45} {}",
                    migration.key,
                    migration.created_at.as_deref().unwrap_or("-"),
                    migration.identifier,
                    migration.path
                );
            }
        }
    }

    Ok(())
}
