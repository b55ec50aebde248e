//! Migration test case
//!
//! `MigrationTestCase` drives an app between two points in its migration
//! history and hands out models from the snapshot that matches the current
//! position:
//!
//! ```rust,ignore
//! let spec = MigrationSpec::new("billing").migrate_from("0005").migrate_to("0006");
//! let mut case = MigrationTestCase::set_up(spec, &executor, &loader)?;
//!
//! let invoice = case.get_model_before("Invoice")?;
//! assert!(!invoice.has_field("total"));
//!
//! case.run_forward()?;
//! assert!(case.get_model_after("Invoice")?.has_field("total"));
//! // dropping `case` migrates the app back to its latest migration
//! ```

use crate::config::MigrationSpec;
use crate::error::{Error, Result};
use crate::migrations::{CommandOptions, MigrationExecutor, MigrationTarget};
use crate::snapshot::{ModelState, ProjectState, SchemaLoader};

/// Which end of the migration under test is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Schema is at `migrate_from`
    Backward,
    /// Schema is at `migrate_to`
    Forward,
}

impl MigrationState {
    pub fn is_forward(&self) -> bool {
        matches!(self, MigrationState::Forward)
    }
}

/// Test fixture toggling an app between `migrate_from` and `migrate_to`
///
/// The app is migrated to its latest migration when the case is finalized,
/// either explicitly or when it is dropped.
pub struct MigrationTestCase<E: MigrationExecutor, L: SchemaLoader> {
    spec: MigrationSpec,
    executor: E,
    loader: L,
    state: MigrationState,
    snapshot: Option<ProjectState>,
    finalized: bool,
}

impl<E: MigrationExecutor, L: SchemaLoader> MigrationTestCase<E, L> {
    /// Validate `spec` and migrate the app back to `migrate_from`
    ///
    /// If the backward migration fails the case is finalized before the
    /// error is returned.
    pub fn set_up(spec: MigrationSpec, executor: E, loader: L) -> Result<Self> {
        spec.validate()?;

        let mut case = Self {
            spec,
            executor,
            loader,
            state: MigrationState::Forward,
            snapshot: None,
            finalized: false,
        };

        if let Err(e) = case.run_backward() {
            if let Err(teardown) = case.finalize() {
                log::error!(
                    "Failed to restore {} after a failed set up: {}",
                    case.spec.app(),
                    teardown
                );
            }
            return Err(e);
        }

        Ok(case)
    }

    /// Apply `migrate_to` and load the post-migration snapshot
    pub fn run_forward(&mut self) -> Result<()> {
        if self.state.is_forward() {
            return Err(Error::state("Forward migration already run"));
        }
        let target = self.spec.to_target();
        self.transition(target, MigrationState::Forward)
    }

    /// Apply `migrate_from` and load the pre-migration snapshot
    pub fn run_backward(&mut self) -> Result<()> {
        if !self.state.is_forward() {
            return Err(Error::state("Forward migration not run"));
        }
        let target = self.spec.from_target();
        self.transition(target, MigrationState::Backward)
    }

    fn transition(&mut self, target: MigrationTarget, next: MigrationState) -> Result<()> {
        let app = self.spec.app();
        log::debug!("Migrating {} to {}", app, target);

        // Resolve first so a missing snapshot leaves the schema untouched
        let snapshot = self.loader.state_at(app, &target)?;
        self.finalized = false;
        self.executor.apply(app, &target, &self.command_options())?;

        self.snapshot = Some(snapshot);
        self.state = next;

        log::info!("{} is now at {} ({:?})", app, target, next);
        Ok(())
    }

    /// Model as it was before the migration under test
    pub fn get_model_before(&self, name: &str) -> Result<&ModelState> {
        if self.state.is_forward() {
            return Err(Error::state(
                "Migration already run, please run the backward migration",
            ));
        }
        self.current_snapshot()?.get_model(name)
    }

    /// Model as it is after the migration under test
    pub fn get_model_after(&self, name: &str) -> Result<&ModelState> {
        if !self.state.is_forward() {
            return Err(Error::state(
                "Migration not run, please run the forward migration",
            ));
        }
        self.current_snapshot()?.get_model(name)
    }

    fn current_snapshot(&self) -> Result<&ProjectState> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| Error::internal("No schema snapshot loaded for the current state"))
    }

    /// Migrate the app to its latest migration
    ///
    /// Runs regardless of the current state and may be called repeatedly.
    /// Model lookups fail afterwards until the case is migrated again.
    pub fn finalize(&mut self) -> Result<()> {
        let app = self.spec.app();
        log::debug!("Finalizing migration test for {}", app);

        self.finalized = true;
        self.snapshot = None;
        self.executor
            .apply(app, &MigrationTarget::Latest, &self.command_options())
    }

    /// Options passed with every apply call
    pub fn command_options(&self) -> CommandOptions {
        self.spec.command_options()
    }

    pub fn spec(&self) -> &MigrationSpec {
        &self.spec
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Snapshot for the current state
    pub fn snapshot(&self) -> Option<&ProjectState> {
        self.snapshot.as_ref()
    }
}

impl<E: MigrationExecutor, L: SchemaLoader> Drop for MigrationTestCase<E, L> {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        if let Err(e) = self.finalize() {
            log::error!(
                "Failed to migrate {} back to latest: {}",
                self.spec.app(),
                e
            );
        }
    }
}

/// Run `body` against a freshly set up case, then always finalize
///
/// Returns the first error in order: set up, body, finalize.
pub fn run_migration_test<E, L, F>(spec: MigrationSpec, executor: E, loader: L, body: F) -> Result<()>
where
    E: MigrationExecutor,
    L: SchemaLoader,
    F: FnOnce(&mut MigrationTestCase<E, L>) -> Result<()>,
{
    let mut case = MigrationTestCase::set_up(spec, executor, loader)?;
    let outcome = body(&mut case);
    let teardown = case.finalize();

    match (outcome, teardown) {
        (Err(e), Err(teardown)) => {
            log::warn!("Teardown also failed: {}", teardown);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), result) => result,
    }
}
