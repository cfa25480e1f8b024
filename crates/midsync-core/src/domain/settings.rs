//! Synchronization settings
//!
//! Immutable run configuration built once from command line input merged
//! over the configuration file.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{Email, FolderId, RemoteLocator};

/// Application name sent with the API key when none is configured
pub const DEFAULT_APP_NAME: &str = "Default";

/// What a synchronization run does after computing the diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Compute and display the diff only
    Check,
    /// Mirror the local tree onto the remote folder
    Upload,
    /// Populate an empty local directory from the remote folder
    Download,
}

impl SyncMode {
    /// Returns true if the mode needs write access to the local root
    #[must_use]
    pub const fn writes_locally(self) -> bool {
        matches!(self, Self::Download)
    }

    /// Returns true if the mode may mutate the remote store
    #[must_use]
    pub const fn writes_remotely(self) -> bool {
        matches!(self, Self::Upload)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl Display for SyncMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check" | "info" => Ok(Self::Check),
            "upload" => Ok(Self::Upload),
            "download" => Ok(Self::Download),
            _ => Err(DomainError::InvalidMode(s.to_string())),
        }
    }
}

/// Account credentials for the remote store
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: Email,
    pub api_key: String,
    pub app_name: String,
}

impl Credentials {
    /// Create credentials with the default application name
    ///
    /// # Errors
    /// Returns error if the API key is empty
    pub fn new(email: Email, api_key: impl Into<String>) -> Result<Self, DomainError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DomainError::MissingParameter("api key".to_string()));
        }
        Ok(Self {
            email,
            api_key,
            app_name: DEFAULT_APP_NAME.to_string(),
        })
    }

    #[must_use]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .field("app_name", &self.app_name)
            .finish()
    }
}

/// Normalize a remote endpoint URL
///
/// Trailing `/` characters are stripped so locators and API paths can be
/// appended uniformly.
///
/// # Errors
/// Returns error if the URL does not use http or https
pub fn normalize_endpoint(url: &str) -> Result<String, DomainError> {
    let trimmed = url.trim().trim_end_matches('/');
    let has_host = trimmed
        .split_once("://")
        .is_some_and(|(scheme, rest)| matches!(scheme, "http" | "https") && !rest.is_empty());
    if !has_host {
        return Err(DomainError::InvalidEndpoint(url.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Immutable configuration of one synchronization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    mode: SyncMode,
    local_root: PathBuf,
    endpoint: String,
    credentials: Credentials,
    root_folder_id: FolderId,
}

impl SyncSettings {
    /// Create run settings
    ///
    /// # Errors
    /// Returns error if the endpoint is not an http(s) URL or the local
    /// root path is empty
    pub fn new(
        mode: SyncMode,
        local_root: impl Into<PathBuf>,
        endpoint: &str,
        credentials: Credentials,
        root_folder_id: FolderId,
    ) -> Result<Self, DomainError> {
        let local_root = local_root.into();
        if local_root.as_os_str().is_empty() {
            return Err(DomainError::InvalidPath(
                "local root cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            mode,
            local_root,
            endpoint: normalize_endpoint(endpoint)?,
            credentials,
            root_folder_id,
        })
    }

    #[must_use]
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    #[must_use]
    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    /// Endpoint URL without a trailing `/`
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn root_folder_id(&self) -> &FolderId {
        &self.root_folder_id
    }

    /// Locator of the remote root folder
    #[must_use]
    pub fn root_locator(&self) -> RemoteLocator {
        RemoteLocator::folder(&self.endpoint, &self.root_folder_id)
    }
}
