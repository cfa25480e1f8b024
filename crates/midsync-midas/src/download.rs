//! Download operations for the Midas web API
//!
//! - [`download_item`] - Streams the latest content of one item to a file
//! - [`download_tree`] - Recreates a remote folder's contents locally

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use midsync_core::domain::{FolderId, ItemId, Session};
use midsync_core::ports::is_hidden;
use reqwest::{header, Method};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::client::{status_error, MidasClient};
use crate::MidasError;

/// Returns true if a remote name can be used as a single local path component
fn is_safe_local_name(name: &str) -> bool {
    !name.is_empty()
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !is_hidden(name)
}

/// Streams the content of `item_id` into a new file at `destination`
///
/// # Returns
/// The number of bytes written
pub async fn download_item(
    client: &MidasClient,
    session: &Session,
    item_id: &ItemId,
    destination: &Path,
) -> Result<u64, MidasError> {
    debug!(item = %item_id, dest = %destination.display(), "Downloading item");

    let response = client
        .request(Method::GET, "midas.item.download")
        .query(&[("id", item_id.as_str()), ("token", session.token())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(status_error("midas.item.download", status).unwrap_or_else(|| {
            MidasError::InvalidResponse(format!("midas.item.download returned HTTP {status}"))
        }));
    }

    // A JSON body here is an API failure envelope, not file content
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        let _: serde_json::Value = MidasClient::decode("midas.item.download", response).await?;
        return Err(MidasError::InvalidResponse(format!(
            "midas.item.download returned metadata instead of content for item {item_id}"
        )));
    }

    let written = match write_body(response, destination).await {
        Ok(written) => written,
        Err(err) => {
            // A truncated file would later look like a local edit
            if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                warn!(dest = %destination.display(), %remove_err, "Failed to remove partial download");
            }
            return Err(err);
        }
    };

    debug!(item = %item_id, bytes = written, "Item downloaded");
    Ok(written)
}

/// Streams a response body into a new file at `destination`
async fn write_body(response: reqwest::Response, destination: &Path) -> Result<u64, MidasError> {
    let mut file = tokio::fs::File::create(destination).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Recreates the contents of `folder_id` inside the existing `local_dir`
///
/// Child folders become directories and items become files named after
/// the item. Names that are hidden or not a single path component are
/// skipped with a warning.
///
/// # Returns
/// The number of files written
pub async fn download_tree(
    client: &MidasClient,
    session: &Session,
    folder_id: &FolderId,
    local_dir: &Path,
) -> Result<usize, MidasError> {
    info!(folder = %folder_id, dir = %local_dir.display(), "Downloading folder tree");

    let mut downloaded = 0;
    let mut pending: Vec<(FolderId, PathBuf)> = vec![(folder_id.clone(), local_dir.to_path_buf())];

    while let Some((folder, dir)) = pending.pop() {
        let listing = client.folder_children(session, &folder).await?;

        for (name, child) in listing.folders {
            if !is_safe_local_name(&name) {
                warn!(folder = %child.id, name, "Skipping folder with unusable name");
                continue;
            }
            let child_dir = dir.join(&name);
            tokio::fs::create_dir(&child_dir).await?;
            pending.push((child.id, child_dir));
        }

        for (name, item) in listing.items {
            if !is_safe_local_name(&name) {
                warn!(item = %item.id, name, "Skipping item with unusable name");
                continue;
            }
            download_item(client, session, &item.id, &dir.join(&name)).await?;
            downloaded += 1;
        }
    }

    info!(folder = %folder_id, files = downloaded, "Folder tree downloaded");
    Ok(downloaded)
}
