//! Database connection commands

use crate::config::MigforgeConfig;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use migforge::driver::mask_url;
use migforge::{Driver, MigforgeError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

#[derive(Debug, Args)]
pub struct DbCommand {
    #[command(subcommand)]
    pub action: DbAction,
}

#[derive(Debug, Subcommand)]
pub enum DbAction {
    /// Test database connection
    TestConnection {
        /// Connection string (defaults to DATABASE_URL or the config file)
        #[arg(long)]
        url: Option<String>,
    },
}

impl DbCommand {
    pub async fn execute(self, config: &MigforgeConfig) -> Result<()> {
        match self.action {
            DbAction::TestConnection { url } => test_connection(config, url).await,
        }
    }
}

/// Pick the connection string: flag first, then configuration
fn database_url(config: &MigforgeConfig, url: Option<String>) -> Result<String> {
    let url = url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| config.database_url.clone())
        .ok_or(MigforgeError::MissingDatabaseUrl)?;
    Ok(url)
}

/// Check the scheme and shape of a connection string before dialing
fn validate_url(database_url: &str) -> Result<(Driver, url::Url)> {
    let driver = Driver::from_url(database_url)?;
    let parsed = url::Url::parse(database_url).map_err(|e| MigforgeError::InvalidDatabaseUrl {
        url: mask_url(database_url),
        reason: e.to_string(),
    })?;
    Ok((driver, parsed))
}

/// Open a connection pool for `database_url`
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let (driver, _) = validate_url(database_url)?;

    match driver {
        Driver::Postgres => PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to {}", mask_url(database_url))),
    }
}

/// Test database connection
async fn test_connection(config: &MigforgeConfig, url: Option<String>) -> Result<()> {
    println!("🔌 Testing database connection...");

    let database_url = database_url(config, url)?;
    let (_, parsed) = validate_url(&database_url)?;
    println!("📍 Connecting to: {}", mask_url(&database_url));

    let pool = connect(&database_url).await?;
    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&pool)
        .await
        .context("Connected, but the server did not answer a version query")?;
    pool.close().await;

    println!("✅ Connection successful!");
    let database = parsed.path().trim_start_matches('/');
    if !database.is_empty() {
        println!("📊 Database: {}", database);
    }
    println!("🐘 Server: {}", version);

    Ok(())
}
