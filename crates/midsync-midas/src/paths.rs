//! Server path lookup
//!
//! Maps a server path such as `/users/Jane_Doe/Public/data` or
//! `/communities/Lab/Public` to the id of the folder it names: the
//! principal is looked up by name to find its root folder, then each
//! remaining segment is matched against the children of the previous one.

use midsync_core::domain::{FolderId, PrincipalKind, ServerPath, Session};
use tracing::debug;

use crate::client::{CommunityQuery, MidasClient, UserQuery};
use crate::MidasError;

/// A server path split into its principal and folder segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    pub kind: PrincipalKind,
    pub principal: &'a str,
    pub folders: Vec<&'a str>,
}

/// Splits a server path into principal kind, principal name and folder names
///
/// # Errors
/// Returns [`MidasError::NotFound`] if the path does not start with
/// `/users/<name>` or `/communities/<name>`
pub fn parse_server_path(path: &ServerPath) -> Result<ParsedPath<'_>, MidasError> {
    let mut segments = path.as_str().split('/').filter(|s| !s.is_empty());

    let kind = match segments.next() {
        Some(s) if s == PrincipalKind::User.path_segment() => PrincipalKind::User,
        Some(s) if s == PrincipalKind::Community.path_segment() => PrincipalKind::Community,
        _ => {
            return Err(MidasError::NotFound(format!(
                "{path}: expected /users/<name> or /communities/<name>"
            )))
        }
    };
    let principal = segments
        .next()
        .ok_or_else(|| MidasError::NotFound(format!("{path}: missing principal name")))?;

    Ok(ParsedPath {
        kind,
        principal,
        folders: segments.collect(),
    })
}

/// Root folder of the user or community named in a parsed path
async fn principal_root(
    client: &MidasClient,
    session: &Session,
    parsed: &ParsedPath<'_>,
) -> Result<FolderId, MidasError> {
    let root = match parsed.kind {
        PrincipalKind::User => {
            let (first, last) = parsed.principal.split_once('_').ok_or_else(|| {
                MidasError::NotFound(format!(
                    "user name '{}' is not of the form <firstname>_<lastname>",
                    parsed.principal
                ))
            })?;
            client
                .user_get(session, UserQuery::Name { first, last })
                .await?
                .root_folder_id
        }
        PrincipalKind::Community => {
            client
                .community_get(session, CommunityQuery::Name(parsed.principal))
                .await?
                .root_folder_id
        }
    };

    root.ok_or_else(|| {
        MidasError::NotFound(format!("{} has no root folder", parsed.principal))
    })
}

/// Resolves the folder named by `path`
///
/// # Errors
/// Returns [`MidasError::NotFound`] if the principal or any segment does not exist
pub async fn find_folder(
    client: &MidasClient,
    session: &Session,
    path: &ServerPath,
) -> Result<FolderId, MidasError> {
    let parsed = parse_server_path(path)?;
    let mut current = principal_root(client, session, &parsed).await?;

    for segment in &parsed.folders {
        let listing = client.folder_children(session, &current).await?;
        current = listing
            .folders
            .get(*segment)
            .map(|f| f.id.clone())
            .ok_or_else(|| MidasError::NotFound(format!("{path}: no folder named '{segment}'")))?;
    }

    debug!(%path, folder = %current, "Resolved server path");
    Ok(current)
}
