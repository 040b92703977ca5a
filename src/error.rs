//! Error types for the scriptorium query federation engine.

use std::time::Duration;
use thiserror::Error;

/// Document-store client errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store call cancelled")]
    Cancelled,

    #[error("Store I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Type registry lookup and construction errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No collection registered for type tag '{0}'")]
    UnregisteredType(String),

    #[error("Type tag '{0}' registered more than once")]
    DuplicateType(String),
}

/// Errors raised while reading a stored payload into a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document of type '{type_tag}' has no id")]
    MissingId { type_tag: String },

    #[error("Malformed document payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Query graph construction and execution errors
#[derive(Debug, Error)]
pub enum FederationError {
    #[error("Dependency cycle between query nodes: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Unknown query node #{0}")]
    UnknownNode(usize),

    #[error("Producer '{producer}' has no result for consumer '{consumer}'")]
    MissingProducerResult { producer: String, consumer: String },

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Query node '{node}' failed: {source}")]
    Store {
        node: String,
        #[source]
        source: StoreError,
    },

    #[error("Query resolution cancelled")]
    Cancelled,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl FederationError {
    /// True for errors caused by a malformed graph rather than by the store.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FederationError::Cycle { .. }
                | FederationError::UnknownNode(_)
                | FederationError::MissingProducerResult { .. }
        )
    }
}

/// Top-level engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Federation error: {0}")]
    Federation(#[from] FederationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Invalid search command: {0}")]
    InvalidCommand(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to render output: {0}")]
    Output(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
