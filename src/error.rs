//! Error types for the db-agent.
//!
//! Configuration problems are reported through [`ConfigError`] before any
//! collaborator is touched. Everything that happens afterwards surfaces as an
//! [`AgentError`]; driver, store and HTTP errors are carried through unchanged.

use thiserror::Error;

/// Raised while loading configuration, before any connection is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", keys.join(", "))]
    MissingEnv { keys: Vec<&'static str> },

    #[error("Invalid connection string: {message}")]
    InvalidConnectionString { message: String },
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] tiberius::error::Error),

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("LLM error: {message}")]
    Llm { message: String },

    #[error("Permission denied: {operation} - {reason}")]
    Permission { operation: String, reason: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Training data not found: {id}")]
    NotFound { id: String },
}

impl AgentError {
    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a permission error.
    pub fn permission(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permission {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// True when the error came from one of the external collaborators
    /// (SQL Server, vector store, LLM API) rather than from our own checks.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Store(_) | Self::Http(_) | Self::Llm { .. }
        )
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
