//! Migration targets and the apply-migration capability
//!
//! This module provides:
//! - `MigrationTarget` for naming a point in an app's migration history
//! - `CommandOptions` passed along with every apply call
//! - The `MigrationExecutor` trait implemented by migration backends
//! - A process-backed executor for projects with a migrate command

pub mod command;

pub use command::CommandExecutor;

use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// Point in an app's migration history to migrate to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MigrationTarget {
    /// A specific migration, e.g. `0006_invoice_total`
    Named(String),
    /// Every migration of the app unapplied
    Zero,
    /// The most recent migration available
    Latest,
}

impl MigrationTarget {
    /// Parse a version identifier; `"zero"` names the empty history
    pub fn parse(version: &str) -> Self {
        match version.trim() {
            "zero" => MigrationTarget::Zero,
            other => MigrationTarget::Named(other.to_string()),
        }
    }

    /// Identifier as passed on a migrate command line, `None` for `Latest`
    pub fn as_arg(&self) -> Option<&str> {
        match self {
            MigrationTarget::Named(name) => Some(name),
            MigrationTarget::Zero => Some("zero"),
            MigrationTarget::Latest => None,
        }
    }
}

impl fmt::Display for MigrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg().unwrap_or("latest"))
    }
}

impl From<&str> for MigrationTarget {
    fn from(version: &str) -> Self {
        Self::parse(version)
    }
}

/// Options passed with every apply call
///
/// Verbosity is always suppressed. The serialized form only carries
/// `database` when one was configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOptions {
    pub verbosity: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl CommandOptions {
    pub fn new(database: Option<String>) -> Self {
        Self {
            verbosity: 0,
            database,
        }
    }

    /// Render as command-line flags
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--verbosity".to_string(), self.verbosity.to_string()];
        if let Some(database) = &self.database {
            args.push("--database".to_string());
            args.push(database.clone());
        }
        args
    }
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Capability that applies an app's migrations up or down to a target
///
/// Implementations run synchronously and return once the schema is at
/// `target`. Failures are returned as-is to the test; nothing retries them.
pub trait MigrationExecutor {
    fn apply(&self, app: &str, target: &MigrationTarget, options: &CommandOptions) -> Result<()>;
}

impl<T: MigrationExecutor + ?Sized> MigrationExecutor for &T {
    fn apply(&self, app: &str, target: &MigrationTarget, options: &CommandOptions) -> Result<()> {
        (**self).apply(app, target, options)
    }
}

impl<T: MigrationExecutor + ?Sized> MigrationExecutor for Box<T> {
    fn apply(&self, app: &str, target: &MigrationTarget, options: &CommandOptions) -> Result<()> {
        (**self).apply(app, target, options)
    }
}
