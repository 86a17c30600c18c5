//! Tests for rebuilding the registry from a migrations directory

use migforge::codegen::{HandlebarsEngine, MigrationData, RegistryData, TemplateEngine};
use migforge::{MigforgeError, MigrationKind, Rebuilder};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Lists identifiers one per line, so ordering is easy to assert
struct LineEngine;

impl TemplateEngine for LineEngine {
    fn render_migration(&self, _kind: MigrationKind, data: &MigrationData) -> migforge::Result<String> {
        Ok(data.identifier.clone())
    }

    fn render_registry(&self, data: &RegistryData) -> migforge::Result<String> {
        Ok(format!("{}\n{}\n", data.package_name, data.migration_identifiers.join("\n")))
    }
}

/// Always fails to render the registry
struct FailingEngine;

impl TemplateEngine for FailingEngine {
    fn render_migration(&self, _kind: MigrationKind, _data: &MigrationData) -> migforge::Result<String> {
        Ok(String::new())
    }

    fn render_registry(&self, _data: &RegistryData) -> migforge::Result<String> {
        let mut engine = HandlebarsEngine::new();
        engine.register_template("registry", "{{missing}}")?;
        engine.render("registry", &serde_json::json!({}))
    }
}

fn touch(dir: &Path, name: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "// migration\n").unwrap();
}

#[test]
fn test_example_ordering() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "1000_create_users.rs");
    touch(dir.path(), "2000_add_index.rs");
    touch(dir.path(), "500_init.rs");

    let engine = LineEngine;
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();
    let content = rebuilder.render(dir.path(), "db", &dir.path().join("mod.rs")).unwrap();

    assert_eq!(
        content,
        "db\nMigration500Init\nMigration1000CreateUsers\nMigration2000AddIndex\n"
    );
}

#[test]
fn test_rebuild_writes_registry() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "1700000100_add_index.rs");
    touch(dir.path(), "1700000000_add_users_table.rs");

    let engine = HandlebarsEngine::builtin().unwrap();
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();
    let registry = dir.path().join("mod.rs");

    let outcome = rebuilder.rebuild(dir.path(), "migrations", &registry).unwrap();
    assert_eq!(outcome.count, 2);
    assert!(outcome.changed);

    let content = fs::read_to_string(&registry).unwrap();
    let users = content.find("\"Migration1700000000AddUsersTable\"").unwrap();
    let index = content.find("\"Migration1700000100AddIndex\"").unwrap();
    assert!(users < index);
    assert!(content.contains("#[path = \"1700000000_add_users_table.rs\"]"));
    assert!(content.contains("mod m1700000000_add_users_table;"));
    assert!(content.contains("`migrations` package"));
}

#[test]
fn test_rebuild_is_idempotent() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "300_c.rs");
    touch(dir.path(), "100_a.rs");
    touch(dir.path(), "nested/200_b.rs");

    let engine = HandlebarsEngine::builtin().unwrap();
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();
    let registry = dir.path().join("mod.rs");

    rebuilder.rebuild(dir.path(), "migrations", &registry).unwrap();
    let first = fs::read(&registry).unwrap();

    let outcome = rebuilder.rebuild(dir.path(), "migrations", &registry).unwrap();
    let second = fs::read(&registry).unwrap();

    assert_eq!(first, second);
    assert!(!outcome.changed);
    assert!(rebuilder.check(dir.path(), "migrations", &registry).unwrap());
}

#[test]
fn test_registry_tracks_directory() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "100_a.rs");
    touch(dir.path(), "200_b.rs");

    let engine = LineEngine;
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();
    let registry = dir.path().join("registry.txt");

    rebuilder.rebuild(dir.path(), "db", &registry).unwrap();
    fs::remove_file(dir.path().join("100_a.rs")).unwrap();
    touch(dir.path(), "300_c.rs");

    assert!(!rebuilder.check(dir.path(), "db", &registry).unwrap());
    rebuilder.rebuild(dir.path(), "db", &registry).unwrap();

    assert_eq!(
        fs::read_to_string(&registry).unwrap(),
        "db\nMigration200B\nMigration300C\n"
    );
}

#[test]
fn test_unrelated_files_do_not_fail_rebuild() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "100_a.rs");
    touch(dir.path(), "README.md");
    touch(dir.path(), "helpers.rs");
    touch(dir.path(), "200_b.sql");
    fs::create_dir_all(dir.path().join("300_not_a_file.rs")).unwrap();

    let engine = LineEngine;
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();

    assert_eq!(
        rebuilder.render(dir.path(), "db", &dir.path().join("mod.rs")).unwrap(),
        "db\nMigration100A\n"
    );
}

#[test]
fn test_duplicate_keys_fail_without_writing() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "100_a.rs");
    touch(dir.path(), "other/100_b.rs");

    let engine = LineEngine;
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();
    let registry = dir.path().join("registry.txt");
    fs::write(&registry, "previous").unwrap();

    let err = rebuilder.rebuild(dir.path(), "db", &registry).unwrap_err();
    assert!(matches!(err, MigforgeError::DuplicateKey { key: 100, .. }));
    assert_eq!(fs::read_to_string(&registry).unwrap(), "previous");
}

#[test]
fn test_missing_directory_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let registry = dir.path().join("registry.txt");

    let engine = LineEngine;
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();

    let err = rebuilder
        .rebuild(&dir.path().join("does_not_exist"), "db", &registry)
        .unwrap_err();
    assert!(matches!(err, MigforgeError::Walk { .. }));
    assert!(!registry.exists());
}

#[test]
fn test_render_failure_leaves_registry_untouched() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "100_a.rs");
    let registry = dir.path().join("mod.rs");
    fs::write(&registry, "previous").unwrap();

    let engine = FailingEngine;
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();

    let err = rebuilder.rebuild(dir.path(), "db", &registry).unwrap_err();
    assert!(matches!(err, MigforgeError::Template { .. }));
    assert_eq!(fs::read_to_string(&registry).unwrap(), "previous");
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let engine = HandlebarsEngine::builtin().unwrap();
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();

    let outcome = rebuilder
        .rebuild(dir.path(), "migrations", &dir.path().join("mod.rs"))
        .unwrap();
    assert_eq!(outcome.count, 0);
    assert!(fs::read_to_string(dir.path().join("mod.rs"))
        .unwrap()
        .contains("pub const MIGRATIONS: &[&str] = &["));
}

#[test]
fn test_registry_outside_migrations_directory() {
    let project = TempDir::new().unwrap();
    let migrations = project.path().join("db").join("migrations");
    touch(&migrations, "100_init.rs");
    touch(&migrations, "2024/200_add_index.rs");
    let registry = project.path().join("src").join("migrations.rs");

    let engine = HandlebarsEngine::builtin().unwrap();
    let rebuilder = Rebuilder::new(&engine, "rs").unwrap();
    rebuilder.rebuild(&migrations, "migrations", &registry).unwrap();

    let content = fs::read_to_string(&registry).unwrap();
    let registry_dir = registry.parent().unwrap();
    let paths: Vec<&str> = content
        .lines()
        .filter_map(|line| line.strip_prefix("#[path = \""))
        .filter_map(|rest| rest.strip_suffix("\"]"))
        .collect();

    assert_eq!(paths, vec!["../db/migrations/100_init.rs", "../db/migrations/2024/200_add_index.rs"]);
    for path in paths {
        assert!(registry_dir.join(path).is_file(), "{path} does not resolve");
    }
}
