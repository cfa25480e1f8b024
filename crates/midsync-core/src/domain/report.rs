//! Diff report and mirror summary
//!
//! A [`DiffReport`] classifies every local and remote entity seen during one
//! synchronization pass. A [`MirrorSummary`] records what a mirror run did
//! with a report, entry by entry.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::newtypes::{FolderId, ItemId, RemoteLocator};

/// Local file with no same-named remote item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileEntry {
    pub path: PathBuf,
    /// Remote folder that should receive the file
    pub folder_id: FolderId,
}

/// Local file whose content differs from the remote latest revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub path: PathBuf,
    pub item_id: ItemId,
}

/// Remote folder with no local counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolderEntry {
    pub id: FolderId,
    pub name: String,
    pub locator: RemoteLocator,
}

/// Remote item with no local counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItemEntry {
    pub id: ItemId,
    pub name: String,
    pub locator: RemoteLocator,
}

/// Matched file whose comparison could not be completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnverifiedEntry {
    pub path: PathBuf,
    pub item_id: Option<ItemId>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlyLocal {
    /// Directories with no remote counterpart, recorded at the highest
    /// unmatched level; their contents are never listed separately
    pub entire_dirs: Vec<PathBuf>,
    pub files: Vec<LocalFileEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlyRemote {
    pub entire_folders: Vec<RemoteFolderEntry>,
    pub items: Vec<RemoteItemEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedsUpdate {
    pub files: Vec<UpdateEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unverified {
    pub files: Vec<UnverifiedEntry>,
}

/// Classified difference between a local tree and a remote folder tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub only_local: OnlyLocal,
    pub only_remote: OnlyRemote,
    pub needs_update: NeedsUpdate,
    pub unverified: Unverified,
}

impl DiffReport {
    /// Returns true if every bucket is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_converged()
            && self.only_remote.entire_folders.is_empty()
            && self.only_remote.items.is_empty()
    }

    /// Returns true if nothing remains to upload or verify
    ///
    /// Remote-only entries are ignored: the user may choose to keep them.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.only_local.entire_dirs.is_empty()
            && self.only_local.files.is_empty()
            && self.needs_update.files.is_empty()
            && self.unverified.files.is_empty()
    }

    /// Returns true if the report lists remote-only folders or items
    #[must_use]
    pub fn has_remote_only(&self) -> bool {
        !self.only_remote.entire_folders.is_empty() || !self.only_remote.items.is_empty()
    }
}

/// Kind of remote mutation performed by a mirror run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorAction {
    UploadFolder,
    UploadFile,
    UploadRevision,
    DeleteFolder,
    DeleteItem,
    Download,
}

impl MirrorAction {
    /// Short human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UploadFolder => "uploaded folder",
            Self::UploadFile => "uploaded file",
            Self::UploadRevision => "uploaded revision",
            Self::DeleteFolder => "deleted folder",
            Self::DeleteItem => "deleted item",
            Self::Download => "downloaded",
        }
    }
}

/// One entry a mirror run completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorOutcome {
    pub action: MirrorAction,
    pub target: String,
}

/// One entry a mirror run failed to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorFailure {
    pub action: MirrorAction,
    pub target: String,
    pub reason: String,
}

/// What happened to the remote-only entries of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionDecision {
    /// There was nothing to delete, so nobody was asked
    #[default]
    NotNeeded,
    Confirmed,
    Declined,
}

/// Result of applying a diff report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSummary {
    pub completed: Vec<MirrorOutcome>,
    pub failures: Vec<MirrorFailure>,
    pub deletions: DeletionDecision,
}

impl MirrorSummary {
    pub fn record(&mut self, action: MirrorAction, target: impl Into<String>) {
        self.completed.push(MirrorOutcome {
            action,
            target: target.into(),
        });
    }

    pub fn fail(&mut self, action: MirrorAction, target: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(MirrorFailure {
            action,
            target: target.into(),
            reason: reason.into(),
        });
    }

    /// Returns true if no entry failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of completed entries of the given kind
    #[must_use]
    pub fn count(&self, action: MirrorAction) -> usize {
        self.completed.iter().filter(|o| o.action == action).count()
    }
}
