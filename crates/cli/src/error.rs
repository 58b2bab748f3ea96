//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Hub startup error
    #[error("Failed to start FDIR hub: {0}")]
    HubStartup(#[from] fdir::FdirError),

    /// A background task panicked or was aborted
    #[error("Task '{task}' failed: {message}")]
    TaskJoin { task: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn task_join(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskJoin {
            task: task.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
