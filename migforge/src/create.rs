//! Migration creation
//!
//! Renders a new, empty migration of the requested kind and writes it into
//! the migrations directory.

use crate::codegen::{self, MigrationData, TemplateEngine};
use crate::driver::Driver;
use crate::kind::MigrationKind;
use crate::naming::MigrationStamp;
use crate::scanner::{MigrationPattern, MigrationSet};
use crate::writer;
use crate::{MigforgeError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// What to generate
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub name: String,
    pub kind: MigrationKind,
    pub package_name: String,
    pub driver: Driver,
    pub up_body: String,
    pub down_body: String,
}

impl CreateOptions {
    pub fn new(name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MigrationKind::default(),
            package_name: package_name.into(),
            driver: Driver::default(),
            up_body: String::new(),
            down_body: String::new(),
        }
    }

    pub fn kind(mut self, kind: MigrationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    pub fn up(mut self, body: impl Into<String>) -> Self {
        self.up_body = body.into();
        self
    }

    pub fn down(mut self, body: impl Into<String>) -> Self {
        self.down_body = body.into();
        self
    }
}

/// A migration file that was written
#[derive(Debug, Clone)]
pub struct CreatedMigration {
    pub stamp: MigrationStamp,
    pub kind: MigrationKind,
    pub path: PathBuf,
}

/// Creates migration files
pub struct Creator<'a> {
    engine: &'a dyn TemplateEngine,
    pattern: MigrationPattern,
}

impl<'a> Creator<'a> {
    pub fn new(engine: &'a dyn TemplateEngine, extension: &str) -> Result<Self> {
        Ok(Self {
            engine,
            pattern: MigrationPattern::new(extension)?,
        })
    }

    /// Name, render and write a migration created at `instant`.
    ///
    /// Nothing is written when the name is empty after normalization, when
    /// the key is already used by a file in `dir`, or when rendering fails.
    pub fn create_at(
        &self,
        dir: &Path,
        options: &CreateOptions,
        instant: DateTime<Utc>,
    ) -> Result<CreatedMigration> {
        let stamp = MigrationStamp::new(&options.name, instant, self.pattern.extension());
        if stamp.name.is_empty() {
            return Err(MigforgeError::EmptyName(options.name.clone()));
        }

        if dir.exists() {
            let existing = MigrationSet::scan(dir, &self.pattern)?;
            if let Some(taken) = existing.get(stamp.key) {
                return Err(MigforgeError::DuplicateKey {
                    key: stamp.key.value(),
                    first: taken.path.clone(),
                    second: dir.join(&stamp.file_name),
                });
            }
        }

        let data = MigrationData {
            package_name: options.package_name.clone(),
            identifier: stamp.identifier.clone(),
            key: stamp.key.value(),
            driver_name: options.driver.type_name(),
            normalized_name: stamp.name.snake_case(),
            up_body: options.up_body.clone(),
            down_body: options.down_body.clone(),
            raw_fence: codegen::raw_fence(&[options.up_body.as_str(), options.down_body.as_str()]),
            created_at: stamp.created_at_rfc3339(),
        };
        let content = self.engine.render_migration(options.kind, &data)?;

        let path = dir.join(&stamp.file_name);
        writer::write_new(&path, &content)?;

        Ok(CreatedMigration {
            stamp,
            kind: options.kind,
            path,
        })
    }

    /// Create a migration stamped with the current time
    pub fn create(&self, dir: &Path, options: &CreateOptions) -> Result<CreatedMigration> {
        // One clock read for key, filename and timestamp
        self.create_at(dir, options, Utc::now())
    }
}
