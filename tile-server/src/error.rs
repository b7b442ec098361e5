//! Server error type.

use tileworld_core::WorldError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid config value {key}={value:?}")]
    Config { key: &'static str, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("World error: {0}")]
    World(#[from] WorldError),
    #[error("World generation aborted before completion")]
    GenerationAborted,
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
