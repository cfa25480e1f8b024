//! Local filesystem port (driven/secondary port)
//!
//! This module defines the read side of the local tree used while
//! diffing: listing one directory level, fingerprinting files, and
//! checking that a download destination is empty.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Hidden entries (names starting with `.`) are filtered by the adapter,
//!   so callers never see them.

use std::path::Path;

use crate::domain::newtypes::Checksum;

/// Marker character that starts the name of a hidden entry
pub const HIDDEN_PREFIX: char = '.';

/// Returns true if an entry name denotes a hidden file or directory
#[must_use]
pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX)
}

/// Visible contents of one local directory level
///
/// Both lists are sorted by name so traversal order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalLevel {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl LocalLevel {
    /// Build a level from raw names, dropping hidden ones and sorting
    #[must_use]
    pub fn from_names(
        dirs: impl IntoIterator<Item = String>,
        files: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut dirs: Vec<String> = dirs.into_iter().filter(|n| !is_hidden(n)).collect();
        let mut files: Vec<String> = files.into_iter().filter(|n| !is_hidden(n)).collect();
        dirs.sort();
        files.sort();
        Self { dirs, files }
    }
}

/// Port trait for local filesystem operations
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Lists the visible sub-directories and regular files of `dir`
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read
    async fn list_level(&self, dir: &Path) -> anyhow::Result<LocalLevel>;

    /// Computes the content checksum of a file with bounded memory
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or a read fails
    /// part way; a partial digest is never returned
    async fn compute_checksum(&self, path: &Path) -> anyhow::Result<Checksum>;

    /// Returns true if `dir` exists and has no entries at all
    async fn is_empty_dir(&self, dir: &Path) -> anyhow::Result<bool>;
}
