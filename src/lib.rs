//! RustF migration tests - verify database schema migrations
//!
//! Provides a test-case helper that:
//! - Migrates an app back to the migration before the one under test
//! - Applies the migration under test on demand, and can undo it
//! - Exposes model snapshots from before and after the migration
//! - Migrates the app back to its latest migration when the test ends

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod config;
pub mod error;
pub mod migrations;
pub mod snapshot;
pub mod testcase;
pub mod testing;

// Re-export main types for public API
pub use config::{MigrationSpec, MigrationSuite};
pub use error::{Error, Result};
pub use migrations::{CommandExecutor, CommandOptions, MigrationExecutor, MigrationTarget};
pub use snapshot::{FieldState, ModelState, ProjectState, SchemaLoader, YamlSnapshotLoader};
pub use testcase::{run_migration_test, MigrationState, MigrationTestCase};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::*;
    pub use crate::testing::{RecordingExecutor, StaticSchemaLoader};
}
