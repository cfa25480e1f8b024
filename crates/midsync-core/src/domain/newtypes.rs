//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for remote identifiers,
//! server-side paths and content checksums. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Remote identifiers
// ============================================================================

fn validate_remote_id(kind: &str, id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::InvalidRemoteId(format!(
            "{kind} cannot be empty"
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::InvalidRemoteId(format!(
            "{kind} contains invalid characters: {id}"
        )));
    }

    Ok(())
}

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", $kind)]
            ///
            /// # Errors
            /// Returns error if the ID is empty or contains characters other
            /// than ASCII letters, digits, `-` and `_`
            pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
                let id = id.into();
                validate_remote_id($kind, &id)?;
                Ok(Self(id))
            }

            /// Get the inner string reference
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

remote_id!(
    /// Identifier of a remote folder
    FolderId,
    "FolderId"
);

remote_id!(
    /// Identifier of a remote item
    ItemId,
    "ItemId"
);

remote_id!(
    /// Identifier of a user or community owning a remote tree
    PrincipalId,
    "PrincipalId"
);

// ============================================================================
// Folder parent
// ============================================================================

/// Parent of a remote folder
///
/// Top-level folders carry a sentinel parent instead of a folder id:
/// `-1` marks the root of a user tree, `-2` the root of a community tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum FolderParent {
    /// A regular parent folder
    Folder(FolderId),
    /// Sentinel: this folder is the root of a user tree
    UserRoot,
    /// Sentinel: this folder is the root of a community tree
    CommunityRoot,
    /// A parent value that is neither a folder id nor a known sentinel
    Unknown(String),
}

impl FolderParent {
    /// Sentinel parent id marking a user root folder
    pub const USER_ROOT: &'static str = "-1";
    /// Sentinel parent id marking a community root folder
    pub const COMMUNITY_ROOT: &'static str = "-2";

    /// Parse the raw `parent_id` value returned by the remote store
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            Self::USER_ROOT => Self::UserRoot,
            Self::COMMUNITY_ROOT => Self::CommunityRoot,
            _ => match raw.parse::<i64>() {
                Ok(n) if n > 0 => FolderId::new(raw)
                    .map(Self::Folder)
                    .unwrap_or_else(|_| Self::Unknown(raw.to_string())),
                _ => Self::Unknown(raw.to_string()),
            },
        }
    }
}

// ============================================================================
// Server paths
// ============================================================================

/// Kind of principal owning a remote tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Community,
}

impl PrincipalKind {
    /// Leading server path segment for trees owned by this kind of principal
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Community => "communities",
        }
    }

    /// Prefix used in the name of a principal's root folder (`user_<id>`)
    #[must_use]
    pub const fn root_folder_prefix(self) -> &'static str {
        match self {
            Self::User => "user_",
            Self::Community => "community_",
        }
    }
}

/// Absolute `/`-separated path on the remote store
///
/// Paths look like `/users/<name>/Public/data` or `/communities/<name>/...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerPath(String);

impl ServerPath {
    /// Create a new ServerPath
    ///
    /// # Errors
    /// Returns error if path doesn't start with `/`, contains empty segments
    /// or contains a `..` segment
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(DomainError::InvalidServerPath(format!(
                "Server path must start with '/': {path}"
            )));
        }

        if path.len() > 1 && path.contains("//") {
            return Err(DomainError::InvalidServerPath(format!(
                "Server path contains empty segments: {path}"
            )));
        }

        if path.split('/').any(|segment| segment == "..") {
            return Err(DomainError::InvalidServerPath(format!(
                "Server path contains invalid traversal: {path}"
            )));
        }

        Ok(Self(path))
    }

    /// Root of a principal's tree, e.g. `/users/jane_doe`
    ///
    /// # Errors
    /// Returns error if the display name is not a valid path component
    pub fn principal_root(kind: PrincipalKind, display_name: &str) -> Result<Self, DomainError> {
        Self::new(format!("/{}", kind.path_segment()))?.join(display_name)
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a path component
    ///
    /// # Errors
    /// Returns error if component is empty, contains `/` or is `..`
    pub fn join(&self, component: &str) -> Result<Self, DomainError> {
        if component.is_empty() || component.contains('/') || component == ".." {
            return Err(DomainError::InvalidServerPath(format!(
                "Invalid path component: {component}"
            )));
        }

        let new_path = if self.0 == "/" {
            format!("/{component}")
        } else {
            format!("{}/{component}", self.0)
        };

        Self::new(new_path)
    }

    /// Join every component of a relative local path
    ///
    /// # Errors
    /// Returns error if a component is not valid UTF-8 or not a valid
    /// path component
    pub fn join_relative(&self, relative: &std::path::Path) -> Result<Self, DomainError> {
        relative.components().try_fold(self.clone(), |acc, component| {
            let name = component.as_os_str().to_str().ok_or_else(|| {
                DomainError::InvalidServerPath(format!(
                    "Non UTF-8 path component in {}",
                    relative.display()
                ))
            })?;
            acc.join(name)
        })
    }
}

impl Display for ServerPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServerPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ServerPath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ServerPath> for String {
    fn from(path: ServerPath) -> Self {
        path.0
    }
}

// ============================================================================
// Checksums
// ============================================================================

/// Content fingerprint of a file, as a lowercase hex digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    /// Create a new Checksum from a hex digest (case-insensitive)
    ///
    /// # Errors
    /// Returns error if the digest is empty or not hexadecimal
    pub fn new(hex: impl Into<String>) -> Result<Self, DomainError> {
        let hex = hex.into();
        if hex.is_empty() {
            return Err(DomainError::InvalidChecksum(
                "Checksum cannot be empty".to_string(),
            ));
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidChecksum(format!(
                "Checksum must be hexadecimal: {hex}"
            )));
        }

        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Create a Checksum from raw digest bytes
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Get the inner hex string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Checksum {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        checksum.0
    }
}

/// Checksum of the latest revision of a remote item
///
/// `Absent` covers items with no revisions and revisions with no bitstream.
/// An absent checksum never matches a local one, which forces an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteChecksum {
    Present(Checksum),
    Absent,
}

impl RemoteChecksum {
    /// Returns true only if the remote checksum is present and equal to `local`
    #[must_use]
    pub fn matches(&self, local: &Checksum) -> bool {
        match self {
            Self::Present(remote) => remote == local,
            Self::Absent => false,
        }
    }
}

// ============================================================================
// Remote locators
// ============================================================================

/// Fully-qualified locator string for a remote folder or item
///
/// Rendered as `{endpoint}/folder/{id}` or `{endpoint}/item/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteLocator(String);

impl RemoteLocator {
    /// Locator of a remote folder
    #[must_use]
    pub fn folder(endpoint: &str, id: &FolderId) -> Self {
        Self(format!("{}/folder/{id}", endpoint.trim_end_matches('/')))
    }

    /// Locator of a remote item
    #[must_use]
    pub fn item(endpoint: &str, id: &ItemId) -> Self {
        Self(format!("{}/item/{id}", endpoint.trim_end_matches('/')))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Email
// ============================================================================

/// Account email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Create a new Email
    ///
    /// # Errors
    /// Returns error if the address has no local part, no `@` or no domain
    pub fn new(email: impl Into<String>) -> Result<Self, DomainError> {
        let email = email.into();
        let trimmed = email.trim();
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(DomainError::InvalidEmail(email)),
        }
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}
