//! Migration test configuration
//!
//! A `MigrationSpec` names the app under test, the migration to start from,
//! the migration to verify and optionally the database to run against.
//! Specs are built in code or loaded as a suite from a TOML file:
//!
//! ```toml
//! [invoice_total]
//! app_name = "billing"
//! migrate_from = "0005_add_invoice"
//! migrate_to = "0006_invoice_total"
//!
//! [reporting_copy]
//! app_name = "billing"
//! migrate_from = "0006"
//! migrate_to = "0007"
//! database = "reporting"
//! ```

use crate::error::{Error, Result};
use crate::migrations::{CommandOptions, MigrationTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
#[cfg(feature = "config")]
use std::fs;
#[cfg(feature = "config")]
use std::path::Path;

/// Environment variable overriding the database of every case in a suite
pub const DATABASE_ENV: &str = "RUSTF_TEST_DATABASE";

const DEFAULT_CASE_NAME: &str = "MigrationTestCase";

/// Configuration of a single migration test case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationSpec {
    /// Label used in error messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_name: Option<String>,

    #[serde(default)]
    pub app_name: Option<String>,

    #[serde(default)]
    pub migrate_from: Option<String>,

    #[serde(default)]
    pub migrate_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl MigrationSpec {
    /// Start a spec for `app_name`
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..Self::default()
        }
    }

    pub fn case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = Some(name.into());
        self
    }

    pub fn migrate_from(mut self, version: impl Into<String>) -> Self {
        self.migrate_from = Some(version.into());
        self
    }

    pub fn migrate_to(mut self, version: impl Into<String>) -> Self {
        self.migrate_to = Some(version.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Name shown in configuration errors
    pub fn display_name(&self) -> &str {
        self.case_name.as_deref().unwrap_or(DEFAULT_CASE_NAME)
    }

    /// Check that every required field is set and non-empty
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("app_name", &self.app_name),
            ("migrate_from", &self.migrate_from),
            ("migrate_to", &self.migrate_to),
        ];

        for (field, value) in required {
            let missing = value.as_deref().map_or(true, |v| v.trim().is_empty());
            if missing {
                return Err(Error::configuration(format!(
                    "MigrationTestCase '{}' must define '{}'",
                    self.display_name(),
                    field
                )));
            }
        }

        Ok(())
    }

    /// App label; empty until validated
    pub fn app(&self) -> &str {
        self.app_name.as_deref().unwrap_or_default()
    }

    /// Target the backward migration applies
    pub fn from_target(&self) -> MigrationTarget {
        MigrationTarget::parse(self.migrate_from.as_deref().unwrap_or_default())
    }

    /// Target the forward migration applies
    pub fn to_target(&self) -> MigrationTarget {
        MigrationTarget::parse(self.migrate_to.as_deref().unwrap_or_default())
    }

    /// Options passed with every apply call
    pub fn command_options(&self) -> CommandOptions {
        let database = self.database.clone().filter(|db| !db.is_empty());
        CommandOptions::new(database)
    }
}

/// Named migration test cases, keyed by case name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationSuite {
    #[serde(flatten)]
    pub cases: BTreeMap<String, MigrationSpec>,
}

impl MigrationSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_case(&mut self, name: impl Into<String>, spec: MigrationSpec) {
        self.cases.insert(name.into(), spec);
    }

    /// Get a case with its `case_name` filled in from the key
    pub fn case(&self, name: &str) -> Result<MigrationSpec> {
        let spec = self.cases.get(name).ok_or_else(|| {
            Error::configuration(format!("No migration test case named '{}'", name))
        })?;

        let mut spec = spec.clone();
        if spec.case_name.is_none() {
            spec.case_name = Some(name.to_string());
        }
        Ok(spec)
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Parse a suite from TOML text
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            Error::configuration(format!("Failed to parse migration test suite: {}", e))
        })
    }

    /// Load a suite from a TOML file and apply environment overrides
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let content = fs::read_to_string(path_ref).map_err(|e| {
            Error::configuration(format!(
                "Failed to read migration test suite '{}': {}",
                path_ref.display(),
                e
            ))
        })?;

        let mut suite: MigrationSuite = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "Failed to parse migration test suite '{}': {}. Check TOML syntax.",
                path_ref.display(),
                e
            ))
        })?;

        suite.apply_env_overrides();

        log::debug!(
            "Loaded {} migration test case(s) from {}",
            suite.len(),
            path_ref.display()
        );
        Ok(suite)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(database) = env::var(DATABASE_ENV) {
            self.override_database(&database);
        }
    }

    /// Point every case at `database`; an empty name clears it
    pub fn override_database(&mut self, database: &str) {
        for spec in self.cases.values_mut() {
            spec.database = if database.is_empty() {
                None
            } else {
                Some(database.to_string())
            };
        }
    }
}
