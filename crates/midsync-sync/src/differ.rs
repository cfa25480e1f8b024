//! Tree differ
//!
//! Walks the local tree one directory level at a time, in step with the
//! remote folder listing for that level, and classifies every entity into
//! the buckets of a [`DiffReport`].
//!
//! ## Walk rules
//!
//! 1. The local root maps to the remote root folder. Every local directory
//!    whose name matches a remote child folder inherits that folder's id
//!    and is walked in turn.
//! 2. A local directory without a same-named remote folder is recorded once
//!    as an entire only-local directory. Its contents are not visited.
//! 3. A local file without a same-named remote item is only-local, tagged
//!    with the folder that should receive it. A matched file is compared by
//!    checksum against the item's latest revision.
//! 4. Remote folders and items not matched by a local name are only-remote.
//!
//! Item details for one level are fetched concurrently, but results are
//! collected in listing order so the report is the same as a sequential walk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use midsync_core::domain::{
    DiffReport, FolderId, ItemRef, LocalFileEntry, RemoteFolderEntry, RemoteItemEntry,
    RemoteLocator, Session, UnverifiedEntry, UpdateEntry,
};
use midsync_core::ports::{ILocalFileSystem, IRemoteStore};
use tracing::{debug, info, warn};

use crate::SyncError;

/// Maximum item detail requests in flight for one directory level
pub const MAX_CONCURRENT_DETAILS: usize = 8;

/// Outcome of comparing one matched local file with its remote item
#[derive(Debug)]
enum FileComparison {
    InSync,
    NeedsUpdate(UpdateEntry),
    Unverified(UnverifiedEntry),
}

/// Compares a local directory tree with a remote folder tree
pub struct TreeDiffer {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalFileSystem>,
}

impl TreeDiffer {
    pub fn new(remote: Arc<dyn IRemoteStore>, local: Arc<dyn ILocalFileSystem>) -> Self {
        Self { remote, local }
    }

    /// Produces the diff report between `local_root` and `root_folder`
    ///
    /// # Arguments
    /// * `session` - Authenticated session
    /// * `local_root` - Local directory matched to `root_folder`
    /// * `root_folder` - Remote folder id of the tree root
    /// * `endpoint` - Remote endpoint used to build only-remote locators
    ///
    /// # Errors
    /// Fails if a local directory cannot be listed or a remote folder
    /// listing fails. Per-file problems land in the `unverified` bucket.
    #[tracing::instrument(skip(self, session), fields(root = %local_root.display()))]
    pub async fn diff(
        &self,
        session: &Session,
        local_root: &Path,
        root_folder: &FolderId,
        endpoint: &str,
    ) -> Result<DiffReport, SyncError> {
        let mut report = DiffReport::default();
        // Only matched directories are pushed, each with its remote folder
        let mut pending = vec![(local_root.to_path_buf(), root_folder.clone())];

        while let Some((dir, folder_id)) = pending.pop() {
            let level = self
                .local
                .list_level(&dir)
                .await
                .map_err(|e| SyncError::Local(e.context(format!("Failed to read {}", dir.display()))))?;
            let listing = self
                .remote
                .list_children(session, &folder_id)
                .await
                .map_err(|e| {
                    SyncError::Remote(e.context(format!("Failed to list remote folder {folder_id}")))
                })?;
            debug!(
                dir = %dir.display(),
                folder = %folder_id,
                local_dirs = level.dirs.len(),
                local_files = level.files.len(),
                remote_folders = listing.folders.len(),
                remote_items = listing.items.len(),
                "Comparing level"
            );

            let mut matched_dirs = Vec::new();
            for name in &level.dirs {
                let path = dir.join(name);
                match listing.folders.get(name) {
                    Some(folder) => matched_dirs.push((path, folder.id.clone())),
                    None => report.only_local.entire_dirs.push(path),
                }
            }

            let mut candidates = Vec::new();
            for name in &level.files {
                let path = dir.join(name);
                match listing.items.get(name) {
                    Some(item) => candidates.push((path, item.clone())),
                    None => report.only_local.files.push(LocalFileEntry {
                        path,
                        folder_id: folder_id.clone(),
                    }),
                }
            }

            let comparisons: Vec<FileComparison> = stream::iter(candidates)
                .map(|(path, item)| self.compare(session, path, item))
                .buffered(MAX_CONCURRENT_DETAILS)
                .collect()
                .await;
            for comparison in comparisons {
                match comparison {
                    FileComparison::InSync => {}
                    FileComparison::NeedsUpdate(entry) => report.needs_update.files.push(entry),
                    FileComparison::Unverified(entry) => report.unverified.files.push(entry),
                }
            }

            let local_dirs: HashSet<&str> = level.dirs.iter().map(String::as_str).collect();
            let local_files: HashSet<&str> = level.files.iter().map(String::as_str).collect();
            for (name, folder) in &listing.folders {
                if !local_dirs.contains(name.as_str()) {
                    report.only_remote.entire_folders.push(RemoteFolderEntry {
                        id: folder.id.clone(),
                        name: name.clone(),
                        locator: RemoteLocator::folder(endpoint, &folder.id),
                    });
                }
            }
            for (name, item) in &listing.items {
                if !local_files.contains(name.as_str()) {
                    report.only_remote.items.push(RemoteItemEntry {
                        id: item.id.clone(),
                        name: name.clone(),
                        locator: RemoteLocator::item(endpoint, &item.id),
                    });
                }
            }

            // Reversed so the stack pops directories in name order
            pending.extend(matched_dirs.into_iter().rev());
        }

        info!(
            only_local_dirs = report.only_local.entire_dirs.len(),
            only_local_files = report.only_local.files.len(),
            only_remote_folders = report.only_remote.entire_folders.len(),
            only_remote_items = report.only_remote.items.len(),
            needs_update = report.needs_update.files.len(),
            unverified = report.unverified.files.len(),
            "Diff complete"
        );
        Ok(report)
    }

    /// Compares one local file with the latest revision of its remote item
    async fn compare(&self, session: &Session, path: PathBuf, item: ItemRef) -> FileComparison {
        let detail = match self.remote.get_item_detail(session, &item.id).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(path = %path.display(), item = %item.id, error = %format!("{err:#}"), "Item detail unavailable");
                return FileComparison::Unverified(UnverifiedEntry {
                    path,
                    item_id: Some(item.id),
                    reason: format!("remote item detail unavailable: {err:#}"),
                });
            }
        };

        let local = match self.local.compute_checksum(&path).await {
            Ok(checksum) => checksum,
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "Local checksum failed");
                return FileComparison::Unverified(UnverifiedEntry {
                    path,
                    item_id: Some(item.id),
                    reason: format!("local checksum failed: {err:#}"),
                });
            }
        };

        if detail.latest_checksum().matches(&local) {
            FileComparison::InSync
        } else {
            debug!(path = %path.display(), item = %item.id, "Checksum mismatch");
            FileComparison::NeedsUpdate(UpdateEntry {
                path,
                item_id: item.id,
            })
        }
    }
}
