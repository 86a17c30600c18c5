//! Datastore drivers
//!
//! Only Postgres is recognized. The driver's PascalCase name is handed to the
//! migration templates, and connection strings are validated here before the
//! CLI hands them to the database client.

use crate::naming::to_pascal_case;
use crate::{MigforgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Postgres,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
        }
    }

    /// `postgres` -> `Postgres`
    pub fn type_name(&self) -> String {
        to_pascal_case(self.as_str())
    }

    /// Pick the driver from a connection string's scheme.
    ///
    /// An empty string is a configuration error pointing at the expected URI
    /// shape; a string without a scheme is invalid; any scheme other than
    /// `postgres`/`postgresql` is unsupported.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(MigforgeError::MissingDatabaseUrl);
        }

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| MigforgeError::InvalidDatabaseUrl {
                url: mask_url(url),
                reason: format!("missing scheme, expected a URI like {}", crate::EXAMPLE_DATABASE_URL),
            })?;

        let driver: Driver = scheme.parse()?;
        if rest.is_empty() {
            return Err(MigforgeError::InvalidDatabaseUrl {
                url: mask_url(url),
                reason: "missing host".to_string(),
            });
        }
        Ok(driver)
    }
}

impl FromStr for Driver {
    type Err = MigforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            _ => Err(MigforgeError::UnsupportedDriver(s.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mask credentials for display: `postgres://u:p@h/db` -> `postgres://***@h/db`
pub fn mask_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.rfind('@') {
            Some(at_pos) => format!("{}://***{}", scheme, &rest[at_pos..]),
            None => format!("{}://{}", scheme, rest),
        },
        None => "***".to_string(),
    }
}
