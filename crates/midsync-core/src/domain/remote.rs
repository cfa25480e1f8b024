//! Remote store model
//!
//! Shapes returned by the remote tree accessor: folder listings, item
//! details with their revisions, folder details with their parent, and
//! the principals (users and communities) that own remote trees.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::newtypes::{Checksum, Email, FolderId, FolderParent, ItemId, PrincipalId, RemoteChecksum};

/// Reference to a child folder returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    pub id: FolderId,
    pub name: String,
}

/// Reference to a child item returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    pub name: String,
}

/// Children of one remote folder, keyed by name
///
/// Folders and items live in separate namespaces, so a folder and an item
/// may share a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderListing {
    pub folders: BTreeMap<String, FolderRef>,
    pub items: BTreeMap<String, ItemRef>,
}

impl FolderListing {
    /// Build a listing from child references
    ///
    /// If the store reports two children with the same name in one
    /// namespace, the first one wins.
    #[must_use]
    pub fn from_children(
        folders: impl IntoIterator<Item = FolderRef>,
        items: impl IntoIterator<Item = ItemRef>,
    ) -> Self {
        let mut listing = Self::default();
        for folder in folders {
            listing.folders.entry(folder.name.clone()).or_insert(folder);
        }
        for item in items {
            listing.items.entry(item.name.clone()).or_insert(item);
        }
        listing
    }
}

/// Binary payload attached to a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitstream {
    pub name: String,
    pub checksum: Option<Checksum>,
    pub size: Option<u64>,
}

/// Versioned snapshot of an item's content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub bitstreams: Vec<Bitstream>,
}

/// Full detail of a remote item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: ItemId,
    pub name: String,
    /// Revisions in ascending order; the last one is current
    pub revisions: Vec<Revision>,
}

impl ItemDetail {
    /// Checksum of the first bitstream of the latest revision
    #[must_use]
    pub fn latest_checksum(&self) -> RemoteChecksum {
        self.revisions
            .last()
            .and_then(|revision| revision.bitstreams.first())
            .and_then(|bitstream| bitstream.checksum.clone())
            .map_or(RemoteChecksum::Absent, RemoteChecksum::Present)
    }
}

/// Name and parent of a remote folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDetail {
    pub id: FolderId,
    pub name: String,
    pub parent: FolderParent,
}

/// A registered user of the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: PrincipalId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    pub root_folder_id: Option<FolderId>,
}

impl UserInfo {
    /// Display name used in server paths: `<firstname>_<lastname>`
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}_{}", self.first_name, self.last_name)
    }
}

/// A community of the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityInfo {
    pub id: PrincipalId,
    pub name: String,
    pub root_folder_id: Option<FolderId>,
}

/// Authenticated handle passed to every remote operation
///
/// Produced by authentication; the token is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    email: Email,
}

impl Session {
    /// Create a session from a token issued for `email`
    #[must_use]
    pub fn new(token: impl Into<String>, email: Email) -> Self {
        Self {
            token: token.into(),
            email,
        }
    }

    /// Token to present on every request
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Account the session was issued for
    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}
