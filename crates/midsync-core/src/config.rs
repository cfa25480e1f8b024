//! Configuration module for midsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults and the merge of command line
//! overrides into immutable run settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::newtypes::{Email, FolderId};
use crate::domain::settings::{
    normalize_endpoint, Credentials, SyncMode, SyncSettings, DEFAULT_APP_NAME,
};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for midsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Remote store connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the Midas instance, e.g. `https://midas.example.org/midas`.
    pub url: Option<String>,
    /// Account email used to log in.
    pub email: Option<String>,
    /// API key generated for the account.
    pub api_key: Option<String>,
    /// Remote root folder to synchronize against.
    pub folder_id: Option<String>,
    /// Application name the API key was generated for.
    pub app_name: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Local side settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local root directory.
    pub root: Option<PathBuf>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when neither `-v` nor `RUST_LOG` is given.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/midsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("midsync")
            .join("config.yaml")
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            email: None,
            api_key: None,
            folder_id: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("email", &self.email)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("folder_id", &self.folder_id)
            .field("app_name", &self.app_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote.url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// Unset optional values are not errors here; they are reported when
    /// run settings are resolved. An empty vector means the configuration
    /// is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if let Some(url) = &self.remote.url {
            if let Err(e) = normalize_endpoint(url) {
                errors.push(ValidationError {
                    field: "remote.url".into(),
                    message: e.to_string(),
                });
            }
        }
        if let Some(email) = &self.remote.email {
            if let Err(e) = Email::new(email.as_str()) {
                errors.push(ValidationError {
                    field: "remote.email".into(),
                    message: e.to_string(),
                });
            }
        }
        if let Some(folder_id) = &self.remote.folder_id {
            if let Err(e) = FolderId::new(folder_id.as_str()) {
                errors.push(ValidationError {
                    field: "remote.folder_id".into(),
                    message: e.to_string(),
                });
            }
        }
        if self.remote.app_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "remote.app_name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.remote.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- sync ---
        // Check sync root only when it does not start with `~` (tilde is expanded at runtime).
        if let Some(root) = &self.sync.root {
            if !root.to_string_lossy().starts_with('~') && !root.is_dir() {
                errors.push(ValidationError {
                    field: "sync.root".into(),
                    message: format!("directory does not exist: {}", root.display()),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Run settings resolution
// ---------------------------------------------------------------------------

/// Per-run values given on the command line.
///
/// Every `Some` value takes precedence over the matching config entry.
#[derive(Clone, Default)]
pub struct RunOverrides {
    pub mode: Option<String>,
    pub local_root: Option<PathBuf>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub folder_id: Option<String>,
}

impl std::fmt::Debug for RunOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOverrides")
            .field("mode", &self.mode)
            .field("local_root", &self.local_root)
            .field("url", &self.url)
            .field("email", &self.email)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

impl RunOverrides {
    /// Returns true if the command line supplies the config entry `field`
    fn supplies(&self, field: &str) -> bool {
        match field {
            "remote.url" => self.url.is_some(),
            "remote.email" => self.email.is_some(),
            "remote.api_key" => self.api_key.is_some(),
            "remote.folder_id" => self.folder_id.is_some(),
            "sync.root" => self.local_root.is_some(),
            _ => false,
        }
    }
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::MissingParameter(flag.to_string()))
}

impl Config {
    /// Validation errors for the entries a run with `overrides` would use
    ///
    /// Entries replaced by a command line value are not reported.
    pub fn validate_for(&self, overrides: &RunOverrides) -> Vec<ValidationError> {
        self.validate()
            .into_iter()
            .filter(|e| !overrides.supplies(&e.field))
            .collect()
    }

    /// Merge command line overrides over this configuration into run settings.
    ///
    /// The mode is validated first so an unsupported mode is reported even
    /// when other parameters are missing.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidMode`] for an unknown mode,
    /// [`DomainError::MissingParameter`] naming the flag of the first
    /// parameter missing from both sources, or the validation error of a
    /// malformed value.
    pub fn resolve_settings(&self, overrides: RunOverrides) -> Result<SyncSettings, DomainError> {
        let mode: SyncMode = required(overrides.mode, "-m/--mode")?.parse()?;
        let local_root = required(
            overrides.local_root.or_else(|| self.sync.root.clone()),
            "-l/--local-dir",
        )?;
        let url = required(
            overrides.url.or_else(|| self.remote.url.clone()),
            "-u/--url",
        )?;
        let email = required(
            overrides.email.or_else(|| self.remote.email.clone()),
            "-e/--email",
        )?;
        let api_key = required(
            overrides.api_key.or_else(|| self.remote.api_key.clone()),
            "-a/--api-key",
        )?;
        let folder_id = required(
            overrides.folder_id.or_else(|| self.remote.folder_id.clone()),
            "-f/--folder-id",
        )?;

        let credentials =
            Credentials::new(Email::new(email)?, api_key)?.with_app_name(self.remote.app_name.clone());
        SyncSettings::new(mode, local_root, &url, credentials, FolderId::new(folder_id)?)
    }
}
