use thiserror::Error;

pub mod context;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export context helpers
pub use context::ErrorContext;

/// Boxed error raised by an external migration capability
pub type ExternalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for RustF migration tests
#[derive(Error, Debug)]
pub enum Error {
    /// A required test-case field is missing or empty
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation was called in the wrong migration state
    #[error("State error: {0}")]
    State(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Database migration error: {0}")]
    DatabaseMigration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    // Errors from user-provided executors and loaders, passed through as-is
    #[error(transparent)]
    External(ExternalError),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn model_not_found(msg: impl Into<String>) -> Self {
        Self::ModelNotFound(msg.into())
    }

    pub fn database_migration(msg: impl Into<String>) -> Self {
        Self::DatabaseMigration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(err: impl Into<ExternalError>) -> Self {
        Self::External(err.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if the error comes from misusing the test case rather than from
    /// the migration itself
    pub fn is_usage_error(&self) -> bool {
        match self {
            Error::Configuration(_) | Error::State(_) => true,
            Error::WithContext { source, .. } => source.is_usage_error(),
            _ => false,
        }
    }

    /// Get a stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "E_CONFIGURATION",
            Error::State(_) => "E_STATE",
            Error::ModelNotFound(_) => "E_MODEL_NOT_FOUND",
            Error::DatabaseMigration(_) => "E_DB_MIGRATION",
            Error::Io(_) => "E_IO",
            Error::Yaml(_) => "E_YAML",
            Error::Internal(_) => "E_INTERNAL",
            Error::External(_) => "E_EXTERNAL",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}
