//! CLI configuration
//!
//! Settings come from `migforge.toml` in the project directory (or the file
//! given with `--config`), then `MIGFORGE_*` environment variables, then
//! command-line flags. Relative paths resolve against the project directory.

use anyhow::{Context, Result};
use migforge::codegen::HandlebarsEngine;
use migforge::{Driver, MigrationKind};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "migforge.toml";

const DEFAULT_DIRECTORY: &str = "migrations";
const DEFAULT_PACKAGE: &str = "migrations";
const DEFAULT_EXTENSION: &str = "rs";
const DEFAULT_REGISTRY_FILE: &str = "mod.rs";

/// Raw settings as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub directory: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub package: Option<String>,
    pub extension: Option<String>,
    pub driver: Option<String>,
    pub default_kind: Option<String>,
    pub templates_dir: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'. Check TOML syntax.", path.display()))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("MIGFORGE_DIR") {
            self.directory = Some(PathBuf::from(dir));
        }
        if let Some(registry) = lookup("MIGFORGE_REGISTRY") {
            self.registry = Some(PathBuf::from(registry));
        }
        if let Some(package) = lookup("MIGFORGE_PACKAGE") {
            self.package = Some(package);
        }
        if let Some(extension) = lookup("MIGFORGE_EXTENSION") {
            self.extension = Some(extension);
        }
        if let Some(driver) = lookup("MIGFORGE_DRIVER") {
            self.driver = Some(driver);
        }
        if let Some(kind) = lookup("MIGFORGE_KIND") {
            self.default_kind = Some(kind);
        }
        if let Some(templates) = lookup("MIGFORGE_TEMPLATES_DIR") {
            self.templates_dir = Some(PathBuf::from(templates));
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
    }
}

/// Resolved settings used by every command
#[derive(Debug, Clone)]
pub struct MigforgeConfig {
    pub project: PathBuf,
    pub directory: PathBuf,
    pub registry: PathBuf,
    pub package: String,
    pub extension: String,
    pub driver: Driver,
    pub default_kind: MigrationKind,
    pub templates_dir: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl MigforgeConfig {
    /// Load from the config file and the process environment
    pub fn load(project: &Path, config_file: Option<&Path>) -> Result<Self> {
        let mut file_config = match config_file {
            Some(path) => FileConfig::from_file(&resolve(project, path))?,
            None => {
                let default_path = project.join(CONFIG_FILE);
                if default_path.is_file() {
                    FileConfig::from_file(&default_path)?
                } else {
                    log::debug!("No {} in {}, using defaults", CONFIG_FILE, project.display());
                    FileConfig::default()
                }
            }
        };

        file_config.apply_env_overrides(|key| std::env::var(key).ok());
        Self::resolve(project, file_config)
    }

    pub fn resolve(project: &Path, raw: FileConfig) -> Result<Self> {
        let directory = resolve(
            project,
            raw.directory.as_deref().unwrap_or(Path::new(DEFAULT_DIRECTORY)),
        );
        let registry = match raw.registry.as_deref() {
            Some(path) => resolve(project, path),
            None => directory.join(DEFAULT_REGISTRY_FILE),
        };

        let driver = match raw.driver.as_deref() {
            Some(driver) => driver.parse::<Driver>().context("Invalid `driver` setting")?,
            None => Driver::default(),
        };
        let default_kind = match raw.default_kind.as_deref() {
            Some(kind) => kind.parse::<MigrationKind>().context("Invalid `default_kind` setting")?,
            None => MigrationKind::default(),
        };

        Ok(Self {
            project: project.to_path_buf(),
            directory,
            registry,
            package: raw.package.unwrap_or_else(|| DEFAULT_PACKAGE.to_string()),
            extension: raw.extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            driver,
            default_kind,
            templates_dir: raw.templates_dir.map(|p| resolve(project, &p)),
            database_url: raw.database_url.filter(|url| !url.trim().is_empty()),
        })
    }

    /// Override the migrations directory. A registry left at its default
    /// location moves with it.
    pub fn with_directory(mut self, directory: &Path) -> Self {
        let registry_follows = self.registry == self.directory.join(DEFAULT_REGISTRY_FILE);
        self.directory = resolve(&self.project, directory);
        if registry_follows {
            self.registry = self.directory.join(DEFAULT_REGISTRY_FILE);
        }
        self
    }

    pub fn with_registry(mut self, registry: &Path) -> Self {
        self.registry = resolve(&self.project, registry);
        self
    }

    /// Template engine with any configured overrides applied
    pub fn engine(&self) -> Result<HandlebarsEngine> {
        let engine = match &self.templates_dir {
            Some(dir) => HandlebarsEngine::with_overrides(dir)
                .with_context(|| format!("Failed to load templates from '{}'", dir.display()))?,
            None => HandlebarsEngine::builtin()?,
        };
        Ok(engine)
    }
}

fn resolve(project: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MigforgeConfig::resolve(Path::new("/project"), FileConfig::default()).unwrap();

        assert_eq!(config.directory, PathBuf::from("/project/migrations"));
        assert_eq!(config.registry, PathBuf::from("/project/migrations/mod.rs"));
        assert_eq!(config.package, "migrations");
        assert_eq!(config.extension, "rs");
        assert_eq!(config.driver, Driver::Postgres);
        assert_eq!(config.default_kind, MigrationKind::Classic);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_file_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
directory = "db/migrations"
registry = "src/migrations.rs"
package = "schema"
default_kind = "change"
database_url = "postgres://localhost/app"
"#,
        )
        .unwrap();

        let raw = FileConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
        let config = MigforgeConfig::resolve(dir.path(), raw).unwrap();

        assert_eq!(config.directory, dir.path().join("db/migrations"));
        assert_eq!(config.registry, dir.path().join("src/migrations.rs"));
        assert_eq!(config.package, "schema");
        assert_eq!(config.default_kind, MigrationKind::Change);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/app"));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [("MIGFORGE_PACKAGE", "from_env"), ("MIGFORGE_KIND", "change")]
            .into_iter()
            .collect();

        let mut raw = FileConfig {
            package: Some("from_file".to_string()),
            ..Default::default()
        };
        raw.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        let config = MigforgeConfig::resolve(Path::new("/p"), raw).unwrap();
        assert_eq!(config.package, "from_env");
        assert_eq!(config.default_kind, MigrationKind::Change);
    }

    #[test]
    fn test_unknown_kind_in_config_is_rejected() {
        let raw = FileConfig {
            default_kind: Some("seed".to_string()),
            ..Default::default()
        };
        let err = MigforgeConfig::resolve(Path::new("/p"), raw).unwrap_err();
        assert!(format!("{:#}", err).contains("Unsupported migration kind 'seed'"));
    }

    #[test]
    fn test_unknown_driver_in_config_is_rejected() {
        let raw = FileConfig {
            driver: Some("mysql".to_string()),
            ..Default::default()
        };
        assert!(MigforgeConfig::resolve(Path::new("/p"), raw).is_err());
    }

    #[test]
    fn test_bad_toml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "directory = [").unwrap();

        let err = FileConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_directory_override_moves_default_registry() {
        let config = MigforgeConfig::resolve(Path::new("/p"), FileConfig::default())
            .unwrap()
            .with_directory(Path::new("other"));

        assert_eq!(config.directory, PathBuf::from("/p/other"));
        assert_eq!(config.registry, PathBuf::from("/p/other/mod.rs"));
    }

    #[test]
    fn test_directory_override_keeps_explicit_registry() {
        let raw = FileConfig {
            registry: Some(PathBuf::from("src/registry.rs")),
            ..Default::default()
        };
        let config = MigforgeConfig::resolve(Path::new("/p"), raw)
            .unwrap()
            .with_directory(Path::new("other"));

        assert_eq!(config.registry, PathBuf::from("/p/src/registry.rs"));
    }

    #[test]
    fn test_blank_database_url_is_unset() {
        let raw = FileConfig {
            database_url: Some("  ".to_string()),
            ..Default::default()
        };
        let config = MigforgeConfig::resolve(Path::new("/p"), raw).unwrap();
        assert!(config.database_url.is_none());
    }
}
