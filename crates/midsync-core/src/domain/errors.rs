//! Domain error types
//!
//! Validation failures raised while constructing identifiers, paths,
//! checksums and run settings.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid local path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid email address format
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Invalid checksum format (expected a hex digest)
    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    /// Invalid server-side path format
    #[error("Invalid server path: {0}")]
    InvalidServerPath(String),

    /// Invalid remote folder/item/principal identifier
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Unknown synchronization mode
    #[error("Unsupported mode '{0}': only check, upload or download are supported")]
    InvalidMode(String),

    /// Invalid remote endpoint URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// A required run parameter was not supplied
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
}
