//! midsync Midas - Midas web API client
//!
//! Provides an async client for the JSON web API of a Midas server:
//! - API-key login producing an explicit session
//! - Folder listings, folder and item details, principal lookups
//! - Two-step uploads (upload token, then streamed upload)
//! - Recursive folder upload and download
//!
//! ## Modules
//!
//! - [`auth`] - API-key login
//! - [`client`] - HTTP client and response envelope handling
//! - [`paths`] - Server path to folder lookup
//! - [`upload`] - File and folder tree uploads
//! - [`download`] - Folder tree downloads
//! - [`provider`] - [`IRemoteStore`](midsync_core::ports::IRemoteStore) implementation

pub mod auth;
pub mod client;
pub mod download;
pub mod paths;
pub mod provider;
pub mod upload;

pub use client::MidasClient;
pub use provider::MidasRemoteStore;

use thiserror::Error;

/// API error code for an invalid or expired session token
pub const CODE_INVALID_TOKEN: i64 = -101;
/// API error code for a request the session's policy does not allow
pub const CODE_INVALID_POLICY: i64 = -151;

/// Errors that can occur when communicating with the Midas web API
#[derive(Debug, Error)]
pub enum MidasError {
    /// Login failed or the session token is invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API reported a failure
    #[error("API error {code}: {message}")]
    Api {
        /// Midas error code
        code: i64,
        /// Message returned by the server
        message: String,
    },

    /// A network-level error occurred
    ///
    /// The request URL is stripped: it carries the API key or session token.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A local file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MidasError {
    /// Classify an API failure by its error code
    pub fn from_api(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            CODE_INVALID_TOKEN => Self::Unauthorized(message),
            CODE_INVALID_POLICY => Self::Forbidden(message),
            _ => Self::Api { code, message },
        }
    }
}

impl From<reqwest::Error> for MidasError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }
}
