//! Code generation module
//!
//! Rendering goes through the [`TemplateEngine`] trait so callers can inject
//! their own templates (or a stub in tests). [`HandlebarsEngine`] is the
//! production implementation:
//! - built-in templates embedded at build time
//! - per-file overrides from a templates directory
//! - strict mode, so a template naming a missing field fails to render

use crate::kind::MigrationKind;
use crate::naming::{to_pascal_case, to_snake_case};
use crate::{MigforgeError, Result};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

pub mod templates;

/// Data handed to a migration template
#[derive(Debug, Clone, Serialize)]
pub struct MigrationData {
    pub package_name: String,
    pub identifier: String,
    pub key: i64,
    /// PascalCase driver name, e.g. `Postgres`
    pub driver_name: String,
    /// snake_case migration name
    pub normalized_name: String,
    pub up_body: String,
    pub down_body: String,
    /// `#` run that closes a raw string around either body, see [`raw_fence`]
    pub raw_fence: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// One registry line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub key: i64,
    pub name: String,
    pub identifier: String,
    /// Rust module name, e.g. `m1700000000_add_users_table`
    pub module: String,
    /// Path relative to the registry file's directory, `/`-separated
    pub path: String,
}

/// Data handed to the registry template
#[derive(Debug, Clone, Serialize)]
pub struct RegistryData {
    pub package_name: String,
    /// Identifiers in ascending key order
    pub migration_identifiers: Vec<String>,
    pub migrations: Vec<RegistryEntry>,
}

/// Renders migration and registry files
pub trait TemplateEngine {
    fn render_migration(&self, kind: MigrationKind, data: &MigrationData) -> Result<String>;

    fn render_registry(&self, data: &RegistryData) -> Result<String>;
}

/// Handlebars-backed template engine
pub struct HandlebarsEngine {
    handlebars: Handlebars<'static>,
}

impl HandlebarsEngine {
    /// Create an engine with helpers registered and no templates
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Output is source code, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars.register_helper("snake_case", Box::new(snake_case_helper));
        handlebars.register_helper("pascal_case", Box::new(pascal_case_helper));

        Self { handlebars }
    }

    /// Create an engine loaded with the built-in templates
    pub fn builtin() -> Result<Self> {
        let mut engine = Self::new();
        for (name, source) in templates::BUILTIN_TEMPLATES {
            engine.register_template(name, source)?;
        }
        Ok(engine)
    }

    /// Built-in templates, with any `<name>.hbs` found in `dir` taking precedence
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut engine = Self::builtin()?;

        for (name, _) in templates::BUILTIN_TEMPLATES {
            let path = dir.join(format!("{}.hbs", name));
            if !path.is_file() {
                continue;
            }

            let source = std::fs::read_to_string(&path).map_err(|e| MigforgeError::io(&path, e))?;
            engine.register_template(name, &source)?;
            log::debug!("Template '{}' overridden by {}", name, path.display());
        }

        Ok(engine)
    }

    /// Register a template
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| MigforgeError::TemplateRegistration {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Render a template with context
    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| MigforgeError::Template {
                name: template_name.to_string(),
                source: Box::new(e),
            })
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render_migration(&self, kind: MigrationKind, data: &MigrationData) -> Result<String> {
        self.render(kind.template_name(), data)
    }

    fn render_registry(&self, data: &RegistryData) -> Result<String> {
        self.render(templates::REGISTRY, data)
    }
}

/// Shortest `#` run such that `"` followed by it appears in no body.
///
/// Bodies are pasted into `r#"..."#` literals; SQL containing `"#` needs a
/// longer fence.
pub fn raw_fence(bodies: &[&str]) -> String {
    let mut fence = String::from("#");
    while bodies.iter().any(|body| body.contains(&format!("\"{}", fence))) {
        fence.push('#');
    }
    fence
}

// Handlebars helper functions

fn snake_case_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let input = string_param(h, "snake_case")?;
    out.write(&to_snake_case(input))?;
    Ok(())
}

fn pascal_case_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let input = string_param(h, "pascal_case")?;
    out.write(&to_pascal_case(input))?;
    Ok(())
}

fn string_param<'a>(
    h: &'a handlebars::Helper,
    helper: &str,
) -> std::result::Result<&'a str, handlebars::RenderError> {
    let param = h.param(0).ok_or_else(|| {
        handlebars::RenderError::new(format!("{} helper requires a parameter", helper))
    })?;

    param.value().as_str().ok_or_else(|| {
        handlebars::RenderError::new(format!("{} helper requires a string parameter", helper))
    })
}
