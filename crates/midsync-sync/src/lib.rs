//! midsync Sync - Tree diff and mirror engine
//!
//! Provides:
//! - Streamed MD5 fingerprints of local files
//! - Level-by-level comparison of a local tree against a remote folder tree
//! - Server path resolution for remote folders
//! - Mirroring of a diff report onto the remote store, or of a remote
//!   folder into an empty local directory
//! - The check / upload / download run driver
//!
//! ## Modules
//!
//! - [`filesystem`] - Local filesystem adapter (level listing, MD5 checksums)
//! - [`differ`] - Tree differ producing a [`DiffReport`](midsync_core::domain::DiffReport)
//! - [`resolver`] - Destination resolver (folder id to server path)
//! - [`mirror`] - Mirror executor for upload and download runs
//! - [`confirm`] - Interactive yes/no prompt
//! - [`sanity`] - Pre-flight checks run before any diff
//! - [`driver`] - Synchronization driver

pub mod confirm;
pub mod differ;
pub mod driver;
pub mod filesystem;
pub mod mirror;
pub mod resolver;
pub mod sanity;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a synchronization run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid run configuration, detected before contacting the remote store
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login failed or the caller may not use the remote root folder
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// A remote folder could not be mapped to a server path
    #[error("Cannot resolve remote destination: {0}")]
    Resolution(String),

    /// Download mode requires an empty local directory
    #[error("Local directory is not empty: {0}")]
    DestinationNotEmpty(PathBuf),

    /// A remote call needed to continue the run failed
    #[error("Remote store error: {0:#}")]
    Remote(#[source] anyhow::Error),

    /// The local tree could not be read
    #[error("Local filesystem error: {0:#}")]
    Local(#[source] anyhow::Error),

    /// An I/O error occurred while checking the local root
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A domain-level error propagated from midsync-core
    #[error("{0}")]
    Domain(#[from] midsync_core::domain::DomainError),
}
