//! Error types for the bridge

use std::path::PathBuf;
use thiserror::Error;

use mcp_server::ServerError;

/// Failure to obtain the OpenAPI document from disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read OpenAPI spec {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OpenAPI spec {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced to the entry point
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize OpenAPI document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
