//! `migforge rebuild` and `migforge check`

use crate::config::MigforgeConfig;
use anyhow::{Context, Result};
use migforge::Rebuilder;

/// Rebuild the registry, or print it with `dry_run`
pub async fn run(config: &MigforgeConfig, dry_run: bool) -> Result<()> {
    let engine = config.engine()?;
    let rebuilder = Rebuilder::new(&engine, &config.extension)?;

    if dry_run {
        let content = rebuilder
            .render(&config.directory, &config.package, &config.registry)
            .with_context(|| format!("Failed to render registry for '{}'", config.directory.display()))?;
        print!("{}", content);
        return Ok(());
    }

    let outcome = rebuilder
        .rebuild(&config.directory, &config.package, &config.registry)
        .with_context(|| format!("Failed to rebuild registry '{}'", config.registry.display()))?;

    if outcome.changed {
        println!(
            "✅ Registry rebuilt: {} ({} migrations)",
            config.registry.display(),
            outcome.count
        );
    } else {
        println!(
            "✅ Registry already up to date: {} ({} migrations)",
            config.registry.display(),
            outcome.count
        );
    }
    Ok(())
}

/// Fail when the registry on disk differs from a fresh rebuild
pub async fn check(config: &MigforgeConfig) -> Result<()> {
    let engine = config.engine()?;
    let rebuilder = Rebuilder::new(&engine, &config.extension)?;

    let up_to_date = rebuilder
        .check(&config.directory, &config.package, &config.registry)
        .with_context(|| format!("Failed to check registry '{}'", config.registry.display()))?;

    if !up_to_date {
        anyhow::bail!(
            "Registry '{}' is out of date. Run `migforge rebuild`.",
            config.registry.display()
        );
    }

    println!("✅ Registry is up to date: {}", config.registry.display());
    Ok(())
}
