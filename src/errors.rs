use thiserror::Error;

/// Error type shared by every layer of the rollup engine.
#[derive(Debug, Error)]
pub enum RollupError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Field `{field}` is not numeric: {value}")]
    NumericCoercion { field: &'static str, value: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RollupError {
    /// Storage failures may succeed when the caller tries again; everything
    /// else is deterministic for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RollupError::Storage(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RollupError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RollupError>;

/// Errors surfaced by the command shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] RollupError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::io::Error> for RollupError {
    fn from(err: std::io::Error) -> Self {
        RollupError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(err: serde_json::Error) -> Self {
        RollupError::Storage(err.to_string())
    }
}
