//! Migration discovery
//!
//! Recovers the migration set from a directory listing. A file takes part
//! when its name matches `<digits>_<name>.<ext>`; everything else in the
//! directory is ignored.

use crate::codegen::{RegistryData, RegistryEntry};
use crate::naming::{self, MigrationKey, MigrationName};
use crate::{MigforgeError, Result};
use regex::Regex;
use std::collections::btree_map::{self, BTreeMap};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Filename convention for one extension
#[derive(Debug, Clone)]
pub struct MigrationPattern {
    regex: Regex,
    extension: String,
}

impl MigrationPattern {
    pub fn new(extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(MigforgeError::InvalidExtension(extension.to_string()));
        }

        let regex = Regex::new(&format!(r"^(\d+)_(.+)\.{}$", regex::escape(extension)))
            .map_err(|_| MigforgeError::InvalidExtension(extension.to_string()))?;

        Ok(Self {
            regex,
            extension: extension.to_string(),
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Split a file name into key and name fragment.
    ///
    /// Returns `None` when the name does not follow the convention or the
    /// digit run does not fit in an `i64`.
    pub fn parse(&self, file_name: &str) -> Option<(MigrationKey, String)> {
        let captures = self.regex.captures(file_name)?;
        let digits = captures.get(1)?.as_str();
        let fragment = captures.get(2)?.as_str();

        match digits.parse::<i64>() {
            Ok(key) => Some((MigrationKey::new(key), fragment.to_string())),
            Err(e) => {
                log::debug!("Skipping '{}': key {} does not parse ({})", file_name, digits, e);
                None
            }
        }
    }
}

/// A migration file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMigration {
    pub key: MigrationKey,
    /// Name fragment recovered from the file name, extension stripped
    pub name: String,
    pub path: PathBuf,
    /// Path relative to the scanned directory
    pub relative_path: PathBuf,
}

impl DiscoveredMigration {
    /// `Migration<key><PascalName>`, rebuilt from the file name
    pub fn identifier(&self) -> String {
        naming::identifier(self.key, &MigrationName::new(self.name.as_str()))
    }

    /// Rust module name for the registry: `m<key>_<snake_name>`
    pub fn module_name(&self) -> String {
        format!("m{}_{}", self.key, naming::to_snake_case(&self.name))
    }

    /// Path under the scanned directory with `/` separators
    pub fn display_path(&self) -> String {
        slash_path(self.relative_path.components())
    }

    /// Path as seen from `registry_dir`, the value for a `#[path]` attribute
    pub fn registry_path(&self, registry_dir: &Path) -> String {
        relative_to(&self.path, registry_dir)
    }
}

fn slash_path<'a>(components: impl Iterator<Item = Component<'a>>) -> String {
    components
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `target` relative to `base`, stepping out with `..` where needed.
///
/// Paths are compared lexically. When no relative form exists, for example
/// one side absolute and the other not, `target` is returned as is.
fn relative_to(target: &Path, base: &Path) -> String {
    let target_parts: Vec<Component> = target.components().filter(|c| *c != Component::CurDir).collect();
    let base_parts: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(t, b)| t == b)
        .count();
    let rest_target = &target_parts[common..];
    let rest_base = &base_parts[common..];

    if !is_plain(rest_target) || !is_plain(rest_base) {
        return target.to_string_lossy().into_owned();
    }

    let ups = rest_base.iter().map(|_| Component::ParentDir);
    slash_path(ups.chain(rest_target.iter().copied()))
}

fn is_plain(parts: &[Component<'_>]) -> bool {
    parts.iter().all(|c| matches!(c, Component::Normal(_)))
}

/// Migrations keyed and ordered by ascending key
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    migrations: BTreeMap<MigrationKey, DiscoveredMigration>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `dir` recursively and collect every migration file
    pub fn scan(dir: &Path, pattern: &MigrationPattern) -> Result<Self> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| MigforgeError::Walk {
                path: e.path().unwrap_or(dir).to_path_buf(),
                source: e,
            })?;

            if entry.file_type().is_dir() {
                continue;
            }
            paths.push(entry.into_path());
        }

        let set = Self::from_paths(dir, paths, pattern)?;
        log::debug!("Found {} migrations in {}", set.len(), dir.display());
        Ok(set)
    }

    /// Build a set from file paths in any order.
    ///
    /// Two files with the same key are an error; non-matching paths are
    /// skipped.
    pub fn from_paths<I>(root: &Path, paths: I, pattern: &MigrationPattern) -> Result<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut set = Self::new();

        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let Some((key, name)) = pattern.parse(file_name) else {
                log::debug!("Ignoring {}", path.display());
                continue;
            };

            let relative_path = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(file_name));

            set.insert(DiscoveredMigration {
                key,
                name,
                path,
                relative_path,
            })?;
        }

        Ok(set)
    }

    /// Add a migration, rejecting a key that is already taken
    pub fn insert(&mut self, migration: DiscoveredMigration) -> Result<()> {
        match self.migrations.entry(migration.key) {
            btree_map::Entry::Occupied(existing) => {
                // Report in path order so the message is stable
                let (first, second) = if existing.get().path <= migration.path {
                    (existing.get().path.clone(), migration.path)
                } else {
                    (migration.path, existing.get().path.clone())
                };
                Err(MigforgeError::DuplicateKey {
                    key: migration.key.value(),
                    first,
                    second,
                })
            }
            btree_map::Entry::Vacant(slot) => {
                slot.insert(migration);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn get(&self, key: MigrationKey) -> Option<&DiscoveredMigration> {
        self.migrations.get(&key)
    }

    /// Migrations in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredMigration> {
        self.migrations.values()
    }

    /// Identifiers in ascending key order
    pub fn identifiers(&self) -> Vec<String> {
        self.iter().map(DiscoveredMigration::identifier).collect()
    }

    /// Template input for a registry file living in `registry_dir`
    pub fn registry_data(&self, package_name: &str, registry_dir: &Path) -> RegistryData {
        let migrations: Vec<RegistryEntry> = self
            .iter()
            .map(|m| RegistryEntry {
                key: m.key.value(),
                name: m.name.clone(),
                identifier: m.identifier(),
                module: m.module_name(),
                path: m.registry_path(registry_dir),
            })
            .collect();

        RegistryData {
            package_name: package_name.to_string(),
            migration_identifiers: migrations.iter().map(|e| e.identifier.clone()).collect(),
            migrations,
        }
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a DiscoveredMigration;
    type IntoIter = btree_map::Values<'a, MigrationKey, DiscoveredMigration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.values()
    }
}
