//! In-memory doubles for the migration capabilities
//!
//! Useful for testing code built on `MigrationTestCase` without a database.

use crate::error::{Error, Result};
use crate::migrations::{CommandOptions, MigrationExecutor, MigrationTarget};
use crate::snapshot::{ProjectState, SchemaLoader};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// One recorded apply call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub app: String,
    pub target: MigrationTarget,
    pub options: CommandOptions,
}

/// Executor that records every apply call instead of migrating
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: RefCell<Vec<AppliedMigration>>,
    failing: HashSet<MigrationTarget>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every apply to `target` fail; the failed call is still recorded
    pub fn fail_on(mut self, target: impl Into<MigrationTarget>) -> Self {
        self.failing.insert(target.into());
        self
    }

    pub fn calls(&self) -> Vec<AppliedMigration> {
        self.calls.borrow().clone()
    }

    pub fn targets(&self) -> Vec<MigrationTarget> {
        self.calls.borrow().iter().map(|c| c.target.clone()).collect()
    }

    pub fn last_target(&self) -> Option<MigrationTarget> {
        self.calls.borrow().last().map(|c| c.target.clone())
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl MigrationExecutor for RecordingExecutor {
    fn apply(&self, app: &str, target: &MigrationTarget, options: &CommandOptions) -> Result<()> {
        self.calls.borrow_mut().push(AppliedMigration {
            app: app.to_string(),
            target: target.clone(),
            options: options.clone(),
        });

        if self.failing.contains(target) {
            return Err(Error::database_migration(format!(
                "Cannot apply {} to {}",
                target, app
            )));
        }
        Ok(())
    }
}

/// Loader serving snapshots registered up front
#[derive(Debug, Default)]
pub struct StaticSchemaLoader {
    states: HashMap<(String, MigrationTarget), ProjectState>,
}

impl StaticSchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the snapshot of `state.app` at `target`
    pub fn with_state(mut self, target: impl Into<MigrationTarget>, state: ProjectState) -> Self {
        self.states.insert((state.app.clone(), target.into()), state);
        self
    }
}

impl SchemaLoader for StaticSchemaLoader {
    fn state_at(&self, app: &str, target: &MigrationTarget) -> Result<ProjectState> {
        self.states
            .get(&(app.to_string(), target.clone()))
            .cloned()
            .ok_or_else(|| {
                Error::database_migration(format!("No snapshot for {} at {}", app, target))
            })
    }
}
