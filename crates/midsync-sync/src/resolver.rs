//! Destination resolver
//!
//! Maps a remote folder id to its server path by walking the parent chain
//! up to a user or community root. Root folders are named `user_<id>` or
//! `community_<id>`; the principal's display name replaces that segment in
//! the resulting path (`/users/Jane_Doe/Public/run1`).

use std::collections::HashSet;
use std::sync::Arc;

use midsync_core::domain::{FolderId, FolderParent, PrincipalId, PrincipalKind, ServerPath, Session};
use midsync_core::ports::IRemoteStore;
use tracing::debug;

use crate::SyncError;

/// Longest parent chain followed before giving up
pub const MAX_ANCESTOR_DEPTH: usize = 256;

/// Owner and position of a remote folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerChain {
    /// Kind of the principal owning the tree
    pub kind: PrincipalKind,
    /// Principal id taken from the root folder name
    pub principal: PrincipalId,
    /// Folder names below the principal root, top-down
    pub folders: Vec<String>,
}

/// Resolves remote folders to server paths
pub struct DestinationResolver {
    remote: Arc<dyn IRemoteStore>,
}

impl DestinationResolver {
    pub fn new(remote: Arc<dyn IRemoteStore>) -> Self {
        Self { remote }
    }

    /// Walks the parents of `folder_id` up to a sentinel root
    ///
    /// # Errors
    /// Returns [`SyncError::Resolution`] if the chain ends at an unknown
    /// parent, loops, exceeds [`MAX_ANCESTOR_DEPTH`] or the root folder
    /// name does not encode a principal, and [`SyncError::Remote`] if a
    /// folder lookup fails
    pub async fn owner_chain(
        &self,
        session: &Session,
        folder_id: &FolderId,
    ) -> Result<OwnerChain, SyncError> {
        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut current = folder_id.clone();

        let kind = loop {
            if names.len() >= MAX_ANCESTOR_DEPTH {
                return Err(SyncError::Resolution(format!(
                    "folder {folder_id} is nested deeper than {MAX_ANCESTOR_DEPTH} levels"
                )));
            }
            if !visited.insert(current.clone()) {
                return Err(SyncError::Resolution(format!(
                    "parent chain of folder {folder_id} loops at folder {current}"
                )));
            }

            let detail = self
                .remote
                .get_folder_detail(session, &current)
                .await
                .map_err(|e| SyncError::Remote(e.context(format!("Failed to get folder {current}"))))?;
            debug!(folder = %detail.id, name = %detail.name, parent = ?detail.parent, "Visited ancestor");
            names.push(detail.name);

            match detail.parent {
                FolderParent::Folder(parent) => current = parent,
                FolderParent::UserRoot => break PrincipalKind::User,
                FolderParent::CommunityRoot => break PrincipalKind::Community,
                FolderParent::Unknown(raw) => {
                    return Err(SyncError::Resolution(format!(
                        "folder {current} has parent '{raw}', which is neither a folder nor a user or community root"
                    )));
                }
            }
        };

        names.reverse();
        let root_name = names.remove(0);
        let principal = root_name
            .strip_prefix(kind.root_folder_prefix())
            .and_then(|id| PrincipalId::new(id).ok())
            .ok_or_else(|| {
                SyncError::Resolution(format!(
                    "root folder '{root_name}' does not name a {}",
                    kind.root_folder_prefix().trim_end_matches('_')
                ))
            })?;

        Ok(OwnerChain {
            kind,
            principal,
            folders: names,
        })
    }

    /// Resolves the server path of `folder_id`
    ///
    /// # Errors
    /// See [`DestinationResolver::owner_chain`]; also fails if the owning
    /// principal cannot be looked up
    #[tracing::instrument(skip(self, session))]
    pub async fn server_path(
        &self,
        session: &Session,
        folder_id: &FolderId,
    ) -> Result<ServerPath, SyncError> {
        let chain = self.owner_chain(session, folder_id).await?;

        let display_name = match chain.kind {
            PrincipalKind::User => self
                .remote
                .get_user(session, &chain.principal)
                .await
                .map_err(|e| SyncError::Remote(e.context(format!("Failed to get user {}", chain.principal))))?
                .display_name(),
            PrincipalKind::Community => self
                .remote
                .get_community(session, &chain.principal)
                .await
                .map_err(|e| {
                    SyncError::Remote(e.context(format!("Failed to get community {}", chain.principal)))
                })?
                .name,
        };

        let path = ServerPath::principal_root(chain.kind, &display_name)
            .and_then(|root| chain.folders.iter().try_fold(root, |acc, name| acc.join(name)))
            .map_err(|e| SyncError::Resolution(e.to_string()))?;

        debug!(folder = %folder_id, path = %path, "Resolved server path");
        Ok(path)
    }
}
