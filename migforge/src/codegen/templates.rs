//! Built-in template definitions
//!
//! Embedded at build time. A templates directory configured at runtime can
//! override any of them by file name (`classic.hbs`, `change.hbs`,
//! `registry.hbs`).

/// Migration with separate `up` and `down` bodies
pub const CLASSIC_TEMPLATE: &str = include_str!("templates/classic.hbs");

/// Migration with a single reversible `change` body
pub const CHANGE_TEMPLATE: &str = include_str!("templates/change.hbs");

/// Registry listing every migration in execution order
pub const REGISTRY_TEMPLATE: &str = include_str!("templates/registry.hbs");

/// Template name used for the registry
pub const REGISTRY: &str = "registry";

/// `(name, source)` for every built-in template
pub const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("classic", CLASSIC_TEMPLATE),
    ("change", CHANGE_TEMPLATE),
    (REGISTRY, REGISTRY_TEMPLATE),
];
