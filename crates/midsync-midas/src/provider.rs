//! MidasRemoteStore - IRemoteStore implementation for the Midas web API
//!
//! Wraps the [`MidasClient`] and delegates to the auth, upload, download
//! and paths modules to fulfil the [`IRemoteStore`] port contract.
//!
//! ## Design Notes
//!
//! - The client is stateless, so no interior mutability is needed: the
//!   session travels with every call.
//! - Errors are returned as `anyhow::Error` with context; the underlying
//!   [`MidasError`](crate::MidasError) stays reachable through `downcast_ref`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use midsync_core::domain::{
    CommunityInfo, Credentials, Email, FolderDetail, FolderId, FolderListing, ItemDetail, ItemId,
    PrincipalId, ServerPath, Session, UserInfo,
};
use midsync_core::ports::IRemoteStore;

use crate::client::{CommunityQuery, MidasClient, UserQuery};
use crate::upload::{INITIAL_UPLOAD_NOTE, REVISION_UPLOAD_NOTE};
use crate::{auth, download, paths, upload};

/// Remote store backed by a Midas server
pub struct MidasRemoteStore {
    client: MidasClient,
}

impl MidasRemoteStore {
    /// Creates a new `MidasRemoteStore` wrapping the given [`MidasClient`]
    pub fn new(client: MidasClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &MidasClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteStore for MidasRemoteStore {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        auth::login(&self.client, credentials)
            .await
            .with_context(|| format!("Failed to log in to {}", self.client.base_url()))
    }

    async fn list_children(&self, session: &Session, folder_id: &FolderId) -> Result<FolderListing> {
        debug!(folder = %folder_id, "MidasRemoteStore::list_children");
        self.client
            .folder_children(session, folder_id)
            .await
            .with_context(|| format!("Failed to list children of folder {folder_id}"))
    }

    async fn get_item_detail(&self, session: &Session, item_id: &ItemId) -> Result<ItemDetail> {
        debug!(item = %item_id, "MidasRemoteStore::get_item_detail");
        self.client
            .item_get(session, item_id)
            .await
            .with_context(|| format!("Failed to fetch item {item_id}"))
    }

    async fn get_folder_detail(&self, session: &Session, folder_id: &FolderId) -> Result<FolderDetail> {
        debug!(folder = %folder_id, "MidasRemoteStore::get_folder_detail");
        self.client
            .folder_get(session, folder_id)
            .await
            .with_context(|| format!("Failed to fetch folder {folder_id}"))
    }

    async fn create_item(&self, session: &Session, name: &str, parent: &FolderId) -> Result<ItemId> {
        debug!(parent = %parent, name, "MidasRemoteStore::create_item");
        self.client
            .item_create(session, name, parent)
            .await
            .with_context(|| format!("Failed to create item '{name}' in folder {parent}"))
    }

    async fn upload_bitstream(&self, session: &Session, item_id: &ItemId, local_path: &Path) -> Result<()> {
        debug!(item = %item_id, path = %local_path.display(), "MidasRemoteStore::upload_bitstream");
        upload::upload_file(&self.client, session, item_id, local_path, INITIAL_UPLOAD_NOTE)
            .await
            .with_context(|| format!("Failed to upload {} to item {item_id}", local_path.display()))
    }

    async fn upload_revision(&self, session: &Session, item_id: &ItemId, local_path: &Path) -> Result<()> {
        debug!(item = %item_id, path = %local_path.display(), "MidasRemoteStore::upload_revision");
        upload::upload_file(&self.client, session, item_id, local_path, REVISION_UPLOAD_NOTE)
            .await
            .with_context(|| {
                format!(
                    "Failed to upload {} as a new revision of item {item_id}",
                    local_path.display()
                )
            })
    }

    async fn upload_folder(&self, session: &Session, local_dir: &Path, destination: &ServerPath) -> Result<()> {
        debug!(dir = %local_dir.display(), %destination, "MidasRemoteStore::upload_folder");
        let parent = paths::find_folder(&self.client, session, destination)
            .await
            .with_context(|| format!("Failed to locate destination {destination}"))?;
        upload::upload_tree(&self.client, session, local_dir, &parent)
            .await
            .with_context(|| format!("Failed to upload {} into {destination}", local_dir.display()))?;
        Ok(())
    }

    async fn download_folder(&self, session: &Session, source: &ServerPath, local_dir: &Path) -> Result<()> {
        debug!(%source, dir = %local_dir.display(), "MidasRemoteStore::download_folder");
        let folder = paths::find_folder(&self.client, session, source)
            .await
            .with_context(|| format!("Failed to locate source {source}"))?;
        download::download_tree(&self.client, session, &folder, local_dir)
            .await
            .with_context(|| format!("Failed to download {source} into {}", local_dir.display()))?;
        Ok(())
    }

    async fn delete_folder(&self, session: &Session, folder_id: &FolderId) -> Result<()> {
        debug!(folder = %folder_id, "MidasRemoteStore::delete_folder");
        self.client
            .folder_delete(session, folder_id)
            .await
            .with_context(|| format!("Failed to delete folder {folder_id}"))
    }

    async fn delete_item(&self, session: &Session, item_id: &ItemId) -> Result<()> {
        debug!(item = %item_id, "MidasRemoteStore::delete_item");
        self.client
            .item_delete(session, item_id)
            .await
            .with_context(|| format!("Failed to delete item {item_id}"))
    }

    async fn get_user(&self, session: &Session, user_id: &PrincipalId) -> Result<UserInfo> {
        self.client
            .user_get(session, UserQuery::Id(user_id))
            .await
            .with_context(|| format!("Failed to look up user {user_id}"))
    }

    async fn find_user_by_email(&self, session: &Session, email: &Email) -> Result<UserInfo> {
        self.client
            .user_get(session, UserQuery::Email(email))
            .await
            .with_context(|| format!("Failed to look up user {email}"))
    }

    async fn get_community(&self, session: &Session, community_id: &PrincipalId) -> Result<CommunityInfo> {
        self.client
            .community_get(session, CommunityQuery::Id(community_id))
            .await
            .with_context(|| format!("Failed to look up community {community_id}"))
    }
}
