//! Migration kinds
//!
//! Each kind selects the template a new migration file is rendered from.

use crate::{MigforgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationKind {
    /// Separate `up` and `down` bodies
    #[default]
    Classic,
    /// A single reversible `change` body
    Change,
}

impl MigrationKind {
    pub const ALL: [MigrationKind; 2] = [MigrationKind::Classic, MigrationKind::Change];

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationKind::Classic => "classic",
            MigrationKind::Change => "change",
        }
    }

    /// Name of the template registered for this kind
    pub fn template_name(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for MigrationKind {
    type Err = MigforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(MigrationKind::Classic),
            "change" => Ok(MigrationKind::Change),
            _ => Err(MigforgeError::UnsupportedKind(s.to_string())),
        }
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
