//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Streamed MD5**: Files are hashed in fixed-size blocks so memory use
//!   does not grow with file size. Midas stores MD5 bitstream checksums, so
//!   local and remote digests compare directly.
//! - **Symlinks**: Entries are classified through `metadata`, which follows
//!   links. Dangling links and special files are skipped.
//! - **Hidden entries**: Dot-prefixed names never leave this adapter.

use std::path::Path;

use midsync_core::{
    domain::newtypes::Checksum,
    ports::local_filesystem::{ILocalFileSystem, LocalLevel},
};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument, warn};

/// Read size for checksum computation
pub const CHECKSUM_BLOCK_SIZE: usize = 8192;

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn list_level(&self, dir: &Path) -> anyhow::Result<LocalLevel> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = ?entry.path(), "Skipping entry with non UTF-8 name");
                continue;
            };

            let metadata = match tokio::fs::metadata(entry.path()).await {
                Ok(m) => m,
                Err(err) => {
                    warn!(path = ?entry.path(), %err, "Skipping unreadable entry");
                    continue;
                }
            };

            if metadata.is_dir() {
                dirs.push(name);
            } else if metadata.is_file() {
                files.push(name);
            }
        }

        let level = LocalLevel::from_names(dirs, files);
        debug!(dirs = level.dirs.len(), files = level.files.len(), "level listed");
        Ok(level)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn compute_checksum(&self, path: &Path) -> anyhow::Result<Checksum> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; CHECKSUM_BLOCK_SIZE];

        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            context.consume(&buffer[..read]);
        }

        let checksum = Checksum::from_bytes(&context.compute().0);
        debug!(checksum = %checksum, "checksum computed");
        Ok(checksum)
    }

    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn is_empty_dir(&self, dir: &Path) -> anyhow::Result<bool> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        Ok(entries.next_entry().await?.is_none())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
