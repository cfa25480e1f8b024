//! Mirror executor
//!
//! Applies a [`DiffReport`] to the remote store (upload runs) or copies the
//! remote root into an empty local directory (download runs).
//!
//! Upload order is fixed: entire only-local directories, then only-local
//! files, then revisions for changed files, then (after confirmation)
//! deletion of only-remote entries. A failing entry is recorded in the
//! [`MirrorSummary`] and the remaining entries are still processed.

use std::path::Path;
use std::sync::Arc;

use midsync_core::domain::{
    DeletionDecision, DiffReport, FolderId, LocalFileEntry, MirrorAction, MirrorSummary,
    ServerPath, Session,
};
use midsync_core::ports::{IConfirmation, ILocalFileSystem, IRemoteStore};
use tracing::{info, warn};

use crate::resolver::DestinationResolver;
use crate::SyncError;

/// Applies diff reports to the remote store
pub struct MirrorExecutor {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalFileSystem>,
    confirmation: Arc<dyn IConfirmation>,
    resolver: DestinationResolver,
}

impl MirrorExecutor {
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalFileSystem>,
        confirmation: Arc<dyn IConfirmation>,
    ) -> Self {
        Self {
            resolver: DestinationResolver::new(Arc::clone(&remote)),
            remote,
            local,
            confirmation,
        }
    }

    /// Uploads the only-local and changed entries of `report`, then offers
    /// to delete its only-remote entries
    ///
    /// Unverified entries are left alone.
    #[tracing::instrument(skip_all, fields(root = %local_root.display(), folder = %root_folder))]
    pub async fn upload(
        &self,
        session: &Session,
        local_root: &Path,
        root_folder: &FolderId,
        report: &DiffReport,
    ) -> MirrorSummary {
        let mut summary = MirrorSummary::default();

        if !report.only_local.entire_dirs.is_empty() {
            match self.resolver.server_path(session, root_folder).await {
                Ok(root_path) => {
                    for dir in &report.only_local.entire_dirs {
                        self.upload_entire_dir(session, local_root, &root_path, dir, &mut summary)
                            .await;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Cannot place only-local directories");
                    for dir in &report.only_local.entire_dirs {
                        summary.fail(MirrorAction::UploadFolder, dir.display().to_string(), err.to_string());
                    }
                }
            }
        }

        for entry in &report.only_local.files {
            let target = entry.path.display().to_string();
            match self.upload_new_file(session, entry).await {
                Ok(()) => summary.record(MirrorAction::UploadFile, target),
                Err(err) => {
                    warn!(path = %target, error = %format!("{err:#}"), "Upload failed");
                    summary.fail(MirrorAction::UploadFile, target, format!("{err:#}"));
                }
            }
        }

        for entry in &report.needs_update.files {
            let target = entry.path.display().to_string();
            match self
                .remote
                .upload_revision(session, &entry.item_id, &entry.path)
                .await
            {
                Ok(()) => summary.record(MirrorAction::UploadRevision, target),
                Err(err) => {
                    warn!(path = %target, error = %format!("{err:#}"), "Revision upload failed");
                    summary.fail(MirrorAction::UploadRevision, target, format!("{err:#}"));
                }
            }
        }

        if report.has_remote_only() {
            self.delete_remote_only(session, report, &mut summary).await;
        }

        info!(
            completed = summary.completed.len(),
            failed = summary.failures.len(),
            deletions = ?summary.deletions,
            "Upload mirror finished"
        );
        summary
    }

    /// Uploads one entire local directory below its matched parent folder
    async fn upload_entire_dir(
        &self,
        session: &Session,
        local_root: &Path,
        root_path: &ServerPath,
        dir: &Path,
        summary: &mut MirrorSummary,
    ) {
        let target = dir.display().to_string();

        let destination = dir
            .strip_prefix(local_root)
            .map_err(|_| format!("{} is outside {}", dir.display(), local_root.display()))
            .and_then(|relative| {
                let parent = relative.parent().unwrap_or_else(|| Path::new(""));
                root_path.join_relative(parent).map_err(|e| e.to_string())
            });

        let destination = match destination {
            Ok(path) => path,
            Err(reason) => {
                warn!(path = %target, %reason, "Cannot place directory");
                summary.fail(MirrorAction::UploadFolder, target, reason);
                return;
            }
        };

        match self.remote.upload_folder(session, dir, &destination).await {
            Ok(()) => summary.record(MirrorAction::UploadFolder, target),
            Err(err) => {
                warn!(path = %target, destination = %destination, error = %format!("{err:#}"), "Folder upload failed");
                summary.fail(MirrorAction::UploadFolder, target, format!("{err:#}"));
            }
        }
    }

    /// Creates an item for a new local file and uploads its first bitstream
    async fn upload_new_file(&self, session: &Session, entry: &LocalFileEntry) -> anyhow::Result<()> {
        let name = entry
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("file name is not valid UTF-8"))?;

        let item_id = self.remote.create_item(session, name, &entry.folder_id).await?;
        self.remote
            .upload_bitstream(session, &item_id, &entry.path)
            .await
    }

    /// Asks once, then deletes every only-remote folder and item
    async fn delete_remote_only(&self, session: &Session, report: &DiffReport, summary: &mut MirrorSummary) {
        let question = format!(
            "Delete {} remote folder(s) and {} remote item(s) that do not exist locally?",
            report.only_remote.entire_folders.len(),
            report.only_remote.items.len()
        );

        let confirmed = match self.confirmation.confirm(&question).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Confirmation failed; keeping remote entries");
                false
            }
        };

        if !confirmed {
            info!("Deletion of remote-only entries declined");
            summary.deletions = DeletionDecision::Declined;
            return;
        }
        summary.deletions = DeletionDecision::Confirmed;

        for folder in &report.only_remote.entire_folders {
            let target = folder.locator.to_string();
            match self.remote.delete_folder(session, &folder.id).await {
                Ok(()) => summary.record(MirrorAction::DeleteFolder, target),
                Err(err) => summary.fail(MirrorAction::DeleteFolder, target, format!("{err:#}")),
            }
        }

        for item in &report.only_remote.items {
            let target = item.locator.to_string();
            match self.remote.delete_item(session, &item.id).await {
                Ok(()) => summary.record(MirrorAction::DeleteItem, target),
                Err(err) => summary.fail(MirrorAction::DeleteItem, target, format!("{err:#}")),
            }
        }
    }

    /// Downloads the remote root into the empty `local_root`
    ///
    /// # Errors
    /// Returns [`SyncError::DestinationNotEmpty`] before any write if
    /// `local_root` has entries, and a resolution error if the remote
    /// root has no server path. A failed transfer is recorded in the
    /// summary.
    #[tracing::instrument(skip_all, fields(root = %local_root.display(), folder = %root_folder))]
    pub async fn download(
        &self,
        session: &Session,
        local_root: &Path,
        root_folder: &FolderId,
    ) -> Result<MirrorSummary, SyncError> {
        let empty = self
            .local
            .is_empty_dir(local_root)
            .await
            .map_err(|e| SyncError::Local(e.context(format!("Failed to read {}", local_root.display()))))?;
        if !empty {
            return Err(SyncError::DestinationNotEmpty(local_root.to_path_buf()));
        }

        let source = self.resolver.server_path(session, root_folder).await?;
        let mut summary = MirrorSummary::default();
        match self.remote.download_folder(session, &source, local_root).await {
            Ok(()) => summary.record(MirrorAction::Download, source.to_string()),
            Err(err) => {
                warn!(source = %source, error = %format!("{err:#}"), "Download failed");
                summary.fail(MirrorAction::Download, source.to_string(), format!("{err:#}"));
            }
        }

        info!(source = %source, success = summary.is_success(), "Download mirror finished");
        Ok(summary)
    }
}
