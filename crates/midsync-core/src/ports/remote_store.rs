//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for reading and mutating a remote
//! hierarchical object store: folders containing items, items owning
//! revisions, revisions owning a checksummed bitstream.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport and API errors are
//!   adapter-specific and don't need domain-level classification.
//! - Every operation except [`IRemoteStore::authenticate`] takes an
//!   explicit [`Session`]; adapters keep no ambient login state.
//! - Mutating operations are irreversible remote writes and are never
//!   retried by the adapter. Callers decide whether a failure aborts.

use std::path::Path;

use crate::domain::newtypes::{Email, FolderId, ItemId, PrincipalId, ServerPath};
use crate::domain::remote::{CommunityInfo, FolderDetail, FolderListing, ItemDetail, Session, UserInfo};
use crate::domain::settings::Credentials;

/// Port trait for remote store operations
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Logs in with an account email and API key
    ///
    /// # Returns
    /// A session handle to pass to every other operation
    async fn authenticate(&self, credentials: &Credentials) -> anyhow::Result<Session>;

    /// Lists the child folders and items of a folder, keyed by name
    ///
    /// One round trip per call. An empty folder yields an empty listing;
    /// an invalid session or transport failure is an error.
    async fn list_children(
        &self,
        session: &Session,
        folder_id: &FolderId,
    ) -> anyhow::Result<FolderListing>;

    /// Fetches an item with its revisions and bitstream checksums
    async fn get_item_detail(&self, session: &Session, item_id: &ItemId)
        -> anyhow::Result<ItemDetail>;

    /// Fetches a folder's name and parent
    async fn get_folder_detail(
        &self,
        session: &Session,
        folder_id: &FolderId,
    ) -> anyhow::Result<FolderDetail>;

    /// Creates an empty item named `name` in `parent`
    ///
    /// # Returns
    /// The identifier of the new item
    async fn create_item(
        &self,
        session: &Session,
        name: &str,
        parent: &FolderId,
    ) -> anyhow::Result<ItemId>;

    /// Uploads a local file as the initial bitstream of a new item
    async fn upload_bitstream(
        &self,
        session: &Session,
        item_id: &ItemId,
        local_path: &Path,
    ) -> anyhow::Result<()>;

    /// Uploads a local file as a new revision of an existing item,
    /// replacing its latest bitstream
    async fn upload_revision(
        &self,
        session: &Session,
        item_id: &ItemId,
        local_path: &Path,
    ) -> anyhow::Result<()>;

    /// Recursively uploads a local directory into the folder at `destination`
    ///
    /// A folder named after the directory is created under `destination`;
    /// its sub-directories and files are created and uploaded beneath it.
    /// Hidden entries are skipped.
    async fn upload_folder(
        &self,
        session: &Session,
        local_dir: &Path,
        destination: &ServerPath,
    ) -> anyhow::Result<()>;

    /// Recursively downloads the contents of the folder at `source` into
    /// the existing local directory `local_dir`
    async fn download_folder(
        &self,
        session: &Session,
        source: &ServerPath,
        local_dir: &Path,
    ) -> anyhow::Result<()>;

    /// Deletes a folder and everything below it
    async fn delete_folder(&self, session: &Session, folder_id: &FolderId) -> anyhow::Result<()>;

    /// Deletes an item and all of its revisions
    async fn delete_item(&self, session: &Session, item_id: &ItemId) -> anyhow::Result<()>;

    /// Looks up a user by identifier
    async fn get_user(&self, session: &Session, user_id: &PrincipalId) -> anyhow::Result<UserInfo>;

    /// Looks up a user by account email
    async fn find_user_by_email(&self, session: &Session, email: &Email)
        -> anyhow::Result<UserInfo>;

    /// Looks up a community by identifier
    async fn get_community(
        &self,
        session: &Session,
        community_id: &PrincipalId,
    ) -> anyhow::Result<CommunityInfo>;
}
