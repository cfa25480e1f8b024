//! Upload operations for the Midas web API
//!
//! Provides functions for uploading local content:
//! - [`upload_file`] - Two-step upload of one file as a new item revision
//! - [`upload_tree`] - Recursive upload of a local directory as a new folder
//!
//! ## Upload handshake
//!
//! 1. `midas.upload.generatetoken` with the item id and file name returns
//!    an upload token.
//! 2. `midas.upload.perform` with that token, the file name and length
//!    receives the file content streamed as the request body and stores
//!    it as a new revision of the item.

use std::path::{Path, PathBuf};

use midsync_core::domain::{FolderId, ItemId, Session};
use midsync_core::ports::is_hidden;
use reqwest::{Body, Method};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::client::MidasClient;
use crate::MidasError;

/// Revision note attached to the first upload of an item
pub const INITIAL_UPLOAD_NOTE: &str = "Initial upload";

/// Revision note attached to uploads replacing an item's content
pub const REVISION_UPLOAD_NOTE: &str = "Updated from local copy";

/// Response of `midas.upload.generatetoken`
#[derive(Debug, Deserialize)]
struct UploadTokenResponse {
    token: String,
}

/// Returns the final component of `path` as UTF-8
pub(crate) fn file_name(path: &Path) -> Result<&str, MidasError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            MidasError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path has no UTF-8 file name: {}", path.display()),
            ))
        })
}

/// Uploads a local file as a new revision of `item_id`
///
/// The file is streamed from disk; it is never fully loaded in memory.
///
/// # Arguments
/// * `client` - Midas API client
/// * `session` - Authenticated session
/// * `item_id` - Item receiving the revision
/// * `local_path` - File to upload
/// * `changes` - Revision note
pub async fn upload_file(
    client: &MidasClient,
    session: &Session,
    item_id: &ItemId,
    local_path: &Path,
    changes: &str,
) -> Result<(), MidasError> {
    let name = file_name(local_path)?;
    let file = tokio::fs::File::open(local_path).await?;
    let length = file.metadata().await?.len();

    let token: UploadTokenResponse = client
        .call_with_session(
            session,
            "midas.upload.generatetoken",
            &[("itemid", item_id.as_str()), ("filename", name)],
        )
        .await?;

    debug!(item = %item_id, name, length, "Performing upload");

    let length_param = length.to_string();
    let response = client
        .request(Method::POST, "midas.upload.perform")
        .query(&[
            ("uploadtoken", token.token.as_str()),
            ("filename", name),
            ("length", length_param.as_str()),
            ("itemid", item_id.as_str()),
            ("changes", changes),
        ])
        .header(reqwest::header::CONTENT_LENGTH, length)
        .body(Body::wrap_stream(ReaderStream::new(file)))
        .send()
        .await?;

    let _: serde_json::Value = MidasClient::decode("midas.upload.perform", response).await?;

    debug!(item = %item_id, name, "Upload completed");
    Ok(())
}

/// Recursively uploads `local_dir` as a new folder under `parent`
///
/// Creates a folder named after `local_dir`, then one folder per visible
/// sub-directory and one item per visible file below it. Hidden entries
/// are skipped.
///
/// # Returns
/// The number of files uploaded
pub async fn upload_tree(
    client: &MidasClient,
    session: &Session,
    local_dir: &Path,
    parent: &FolderId,
) -> Result<usize, MidasError> {
    let root_name = file_name(local_dir)?;
    let root_id = client.folder_create(session, root_name, parent).await?;
    info!(dir = %local_dir.display(), folder = %root_id, "Uploading directory tree");

    let mut uploaded = 0;
    let mut pending: Vec<(PathBuf, FolderId)> = vec![(local_dir.to_path_buf(), root_id)];

    while let Some((dir, folder_id)) = pending.pop() {
        let (dirs, files) = read_visible_entries(&dir).await?;

        for name in dirs {
            let child_id = client.folder_create(session, &name, &folder_id).await?;
            pending.push((dir.join(&name), child_id));
        }

        for name in files {
            let path = dir.join(&name);
            let item_id = client.item_create(session, &name, &folder_id).await?;
            upload_file(client, session, &item_id, &path, INITIAL_UPLOAD_NOTE).await?;
            uploaded += 1;
        }
    }

    info!(dir = %local_dir.display(), files = uploaded, "Directory tree uploaded");
    Ok(uploaded)
}

/// Sorted visible sub-directory and file names of `dir`
async fn read_visible_entries(dir: &Path) -> Result<(Vec<String>, Vec<String>), MidasError> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %entry.path().display(), "Skipping non UTF-8 name");
            continue;
        };
        if is_hidden(&name) {
            continue;
        }

        let metadata = match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(path = %entry.path().display(), %err, "Skipping unreadable entry");
                continue;
            }
        };
        if metadata.is_dir() {
            dirs.push(name);
        } else if metadata.is_file() {
            files.push(name);
        }
    }

    dirs.sort();
    files.sort();
    Ok((dirs, files))
}
