//! Migration naming
//!
//! Turns a user-supplied name and a creation instant into the key, filename
//! and type identifier used everywhere else. The same instant drives all
//! three, so the filename's leading digits always equal the key embedded in
//! the identifier.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Prefix of every generated migration type identifier
pub const IDENTIFIER_PREFIX: &str = "Migration";

/// Seconds since the Unix epoch at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationKey(i64);

impl MigrationKey {
    pub fn new(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Floor an instant to whole seconds
    pub fn from_instant(instant: &DateTime<Utc>) -> Self {
        Self(instant.timestamp())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MigrationKey {
    fn from(seconds: i64) -> Self {
        Self(seconds)
    }
}

/// A human-supplied migration label and its normalized forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationName {
    raw: String,
    words: Vec<String>,
}

impl MigrationName {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let words = split_words(&raw);
        Self { raw, words }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True when nothing alphanumeric survives normalization
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// `add users table` -> `add_users_table`
    pub fn snake_case(&self) -> String {
        self.words.join("_")
    }

    /// `add users table` -> `AddUsersTable`
    pub fn pascal_case(&self) -> String {
        self.words.iter().map(|word| capitalize(word)).collect()
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Build `Migration<key><PascalName>`
pub fn identifier(key: MigrationKey, name: &MigrationName) -> String {
    format!("{}{}{}", IDENTIFIER_PREFIX, key, name.pascal_case())
}

/// Build `<key>_<snake_name>.<extension>`
pub fn file_name(key: MigrationKey, name: &MigrationName, extension: &str) -> String {
    format!("{}_{}.{}", key, name.snake_case(), extension)
}

/// Everything derived from one `(name, instant)` pair
#[derive(Debug, Clone)]
pub struct MigrationStamp {
    pub key: MigrationKey,
    pub name: MigrationName,
    pub identifier: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl MigrationStamp {
    pub fn new(raw_name: &str, instant: DateTime<Utc>, extension: &str) -> Self {
        let key = MigrationKey::from_instant(&instant);
        let name = MigrationName::new(raw_name);

        Self {
            identifier: identifier(key, &name),
            file_name: file_name(key, &name, extension),
            key,
            name,
            created_at: instant,
        }
    }

    /// RFC 3339 creation timestamp, second precision
    pub fn created_at_rfc3339(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

// String transformation utilities

/// Split into lowercase words on non-alphanumerics and camel-case boundaries
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = input.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            flush_word(&mut words, &mut current);
            continue;
        }

        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |c| c.is_lowercase());
            // fooBar, or the last capital of an acronym: HTTPServer
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                flush_word(&mut words, &mut current);
            }
        }

        // Lowercasing can yield combining marks (`İ` -> `i` + U+0307)
        current.extend(ch.to_lowercase().filter(|c| c.is_alphanumeric() && !c.is_uppercase()));
    }
    flush_word(&mut words, &mut current);

    words
}

fn flush_word(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

pub fn to_snake_case(input: &str) -> String {
    MigrationName::new(input).snake_case()
}

pub fn to_pascal_case(input: &str) -> String {
    MigrationName::new(input).pascal_case()
}
