//! Registry rebuilding
//!
//! The registry is a pure function of the migrations directory: scan, sort,
//! render, then replace the registry file in one step. Nothing is written
//! unless the scan and the render both succeed.

use crate::codegen::TemplateEngine;
use crate::scanner::{MigrationPattern, MigrationSet};
use crate::writer;
use crate::{MigforgeError, Result};
use std::fs;
use std::path::Path;

/// Result of a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOutcome {
    /// Number of migrations listed
    pub count: usize,
    /// False when the registry already had this exact content
    pub changed: bool,
}

/// Rebuilds the registry from the migrations directory
pub struct Rebuilder<'a> {
    engine: &'a dyn TemplateEngine,
    pattern: MigrationPattern,
}

impl<'a> Rebuilder<'a> {
    pub fn new(engine: &'a dyn TemplateEngine, extension: &str) -> Result<Self> {
        Ok(Self {
            engine,
            pattern: MigrationPattern::new(extension)?,
        })
    }

    /// Discover every migration under `dir`, ordered by key
    pub fn scan(&self, dir: &Path) -> Result<MigrationSet> {
        MigrationSet::scan(dir, &self.pattern)
    }

    /// Render the registry destined for `registry_path` without writing it
    pub fn render(&self, dir: &Path, package_name: &str, registry_path: &Path) -> Result<String> {
        let set = self.scan(dir)?;
        self.render_set(&set, package_name, registry_path)
    }

    /// Module paths in the output are relative to the registry's own directory
    pub fn render_set(&self, set: &MigrationSet, package_name: &str, registry_path: &Path) -> Result<String> {
        let registry_dir = registry_path.parent().unwrap_or(Path::new(""));
        self.engine.render_registry(&set.registry_data(package_name, registry_dir))
    }

    /// Render the registry and replace `registry_path` with it
    pub fn rebuild(&self, dir: &Path, package_name: &str, registry_path: &Path) -> Result<RebuildOutcome> {
        let set = self.scan(dir)?;
        let content = self.render_set(&set, package_name, registry_path)?;

        let changed = read_existing(registry_path)?.as_deref() != Some(content.as_bytes());
        if changed {
            writer::write_atomic(registry_path, &content)?;
        } else {
            log::debug!("{} is up to date", registry_path.display());
        }

        Ok(RebuildOutcome {
            count: set.len(),
            changed,
        })
    }

    /// True when `registry_path` matches a fresh render byte for byte
    pub fn check(&self, dir: &Path, package_name: &str, registry_path: &Path) -> Result<bool> {
        let content = self.render(dir, package_name, registry_path)?;
        Ok(read_existing(registry_path)?.as_deref() == Some(content.as_bytes()))
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MigforgeError::io(path, e)),
    }
}
