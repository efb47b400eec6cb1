//! Typed error conditions surfaced to callers as recoverable failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No catalog item carries the requested program code.
    #[error("Ranking not found: {id}")]
    NotFound { id: String },

    /// The process-wide catalog snapshot was already installed.
    #[error("Catalog snapshot is already installed")]
    AlreadyInstalled,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize stored state")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },
}
