//! Pre-flight checks
//!
//! Everything here runs before the first diff, and nothing here mutates
//! the remote store. Local checks come first so a bad directory never
//! causes a login.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use midsync_core::domain::{PrincipalKind, Session, SyncMode, SyncSettings};
use midsync_core::ports::IRemoteStore;
use tracing::{debug, info};

use crate::resolver::DestinationResolver;
use crate::SyncError;

/// Returns true if the current process may write into `dir`
#[must_use]
pub fn is_writable(dir: &Path) -> bool {
    let Ok(c_path) = CString::new(dir.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
}

/// Checks the local root before anything contacts the remote store
///
/// # Errors
/// Returns [`SyncError::Config`] if the root is missing, not a directory,
/// or not writable in download mode
pub async fn check_local_root(settings: &SyncSettings) -> Result<(), SyncError> {
    let root = settings.local_root();
    match tokio::fs::metadata(root).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(SyncError::Config(format!(
                "{} is not a directory",
                root.display()
            )))
        }
        Err(_) => {
            return Err(SyncError::Config(format!(
                "Local directory {} does not exist",
                root.display()
            )))
        }
    }

    if settings.mode() == SyncMode::Download && !is_writable(root) {
        return Err(SyncError::Config(format!(
            "Download mode needs write permission for {}",
            root.display()
        )));
    }

    Ok(())
}

/// Logs in and verifies access to the remote root folder
///
/// In upload mode the root must also belong to the logged-in user or to
/// a community.
///
/// # Errors
/// Returns [`SyncError::Authorization`] if login fails, the root folder
/// cannot be read, or it belongs to another user
#[tracing::instrument(skip_all, fields(mode = %settings.mode(), folder = %settings.root_folder_id()))]
pub async fn check_remote_access(
    remote: &dyn IRemoteStore,
    resolver: &DestinationResolver,
    settings: &SyncSettings,
) -> Result<Session, SyncError> {
    let session = remote
        .authenticate(settings.credentials())
        .await
        .map_err(|e| SyncError::Authorization(format!("Login failed: {e:#}")))?;
    debug!("Login succeeded");

    let root = settings.root_folder_id();
    remote
        .get_folder_detail(&session, root)
        .await
        .map_err(|e| SyncError::Authorization(format!("Cannot access remote folder {root}: {e:#}")))?;

    if settings.mode() == SyncMode::Upload {
        let owner = resolver.owner_chain(&session, root).await.map_err(|e| {
            SyncError::Authorization(format!("Cannot determine the owner of folder {root}: {e}"))
        })?;

        if owner.kind == PrincipalKind::User {
            let me = remote
                .find_user_by_email(&session, session.email())
                .await
                .map_err(|e| {
                    SyncError::Authorization(format!(
                        "Cannot look up account {}: {e:#}",
                        session.email()
                    ))
                })?;
            if me.id != owner.principal {
                return Err(SyncError::Authorization(format!(
                    "Remote folder {root} belongs to another user; upload needs a folder you own"
                )));
            }
        }
    }

    info!("Sanity check passed");
    Ok(session)
}
