use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GraphError {
    pub fn storage(message: impl Into<String>) -> Self {
        GraphError::Storage(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        GraphError::Configuration(message.into())
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
