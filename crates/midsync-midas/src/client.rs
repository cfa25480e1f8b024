//! Midas web API client
//!
//! Provides a typed HTTP client for the JSON web API of a Midas server.
//! Every call goes to `{base_url}/api/json?method=midas.<name>` and returns
//! an envelope of the form:
//!
//! ```json
//! {"stat": "ok", "code": "0", "message": "", "data": { ... }}
//! ```
//!
//! Failures carry `"stat": "fail"` with a numeric `code` and a `message`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use midsync_midas::client::MidasClient;
//!
//! # async fn example(session: &midsync_core::domain::Session) -> anyhow::Result<()> {
//! let client = MidasClient::new("https://midas.example.org/midas");
//! let folder = client
//!     .folder_get(session, &"12".parse()?)
//!     .await?;
//! println!("{}", folder.name);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use midsync_core::domain::{
    Bitstream, Checksum, CommunityInfo, Email, FolderDetail, FolderId, FolderListing,
    FolderParent, FolderRef, ItemDetail, ItemId, ItemRef, PrincipalId, Revision, Session,
    UserInfo,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::MidasError;

/// Path of the JSON web API below the server base URL
const API_PATH: &str = "/api/json";

// ============================================================================
// Response envelope and wire types
// ============================================================================

/// Envelope wrapping every JSON web API response
#[derive(Debug, Deserialize)]
struct Envelope {
    stat: String,
    #[serde(default)]
    code: serde_json::Value,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl Envelope {
    fn into_data<T: DeserializeOwned>(self, api_method: &str) -> Result<T, MidasError> {
        if self.stat != "ok" {
            let code = match &self.code {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .unwrap_or(-1);
            return Err(MidasError::from_api(code, self.message));
        }

        serde_json::from_value(self.data).map_err(|e| {
            MidasError::InvalidResponse(format!("Failed to parse {api_method} response: {e}"))
        })
    }
}

/// Deserializers for fields the server sends either as strings or numbers
mod flexible {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_string<E: Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!("expected string or number, got {other}"))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        to_string(Value::deserialize(d)?)?.ok_or_else(|| D::Error::custom("unexpected null"))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        to_string(Value::deserialize(d)?)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFolder {
    #[serde(deserialize_with = "flexible::string")]
    folder_id: String,
    name: String,
    #[serde(default, deserialize_with = "flexible::opt_string")]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireItemRef {
    #[serde(deserialize_with = "flexible::string")]
    item_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireChildren {
    #[serde(default)]
    folders: Vec<WireFolder>,
    #[serde(default)]
    items: Vec<WireItemRef>,
}

#[derive(Debug, Deserialize)]
struct WireBitstream {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "flexible::opt_string")]
    checksum: Option<String>,
    #[serde(default, deserialize_with = "flexible::opt_string")]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRevision {
    #[serde(default)]
    bitstreams: Vec<WireBitstream>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(deserialize_with = "flexible::string")]
    item_id: String,
    name: String,
    #[serde(default)]
    revisions: Vec<WireRevision>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(deserialize_with = "flexible::string")]
    user_id: String,
    #[serde(default)]
    firstname: String,
    #[serde(default)]
    lastname: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "flexible::opt_string")]
    folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCommunity {
    #[serde(deserialize_with = "flexible::string")]
    community_id: String,
    name: String,
    #[serde(default, deserialize_with = "flexible::opt_string")]
    folder_id: Option<String>,
}

fn invalid<E: std::fmt::Display>(what: &str) -> impl FnOnce(E) -> MidasError + '_ {
    move |e| MidasError::InvalidResponse(format!("{what}: {e}"))
}

fn folder_id(raw: String) -> Result<FolderId, MidasError> {
    FolderId::new(raw).map_err(invalid("folder id"))
}

fn item_id(raw: String) -> Result<ItemId, MidasError> {
    ItemId::new(raw).map_err(invalid("item id"))
}

fn optional_folder_id(raw: Option<String>) -> Result<Option<FolderId>, MidasError> {
    raw.filter(|s| !s.is_empty()).map(folder_id).transpose()
}

impl WireFolder {
    pub(crate) fn into_detail(self) -> Result<FolderDetail, MidasError> {
        Ok(FolderDetail {
            id: folder_id(self.folder_id)?,
            name: self.name,
            parent: FolderParent::from_raw(self.parent_id.as_deref().unwrap_or_default()),
        })
    }

    pub(crate) fn into_ref(self) -> Result<FolderRef, MidasError> {
        Ok(FolderRef {
            id: folder_id(self.folder_id)?,
            name: self.name,
        })
    }
}

impl WireItemRef {
    pub(crate) fn into_ref(self) -> Result<ItemRef, MidasError> {
        Ok(ItemRef {
            id: item_id(self.item_id)?,
            name: self.name,
        })
    }
}

impl WireItem {
    fn into_detail(self) -> Result<ItemDetail, MidasError> {
        let revisions = self
            .revisions
            .into_iter()
            .map(|revision| -> Result<Revision, MidasError> {
                let bitstreams = revision
                    .bitstreams
                    .into_iter()
                    .map(|b| -> Result<Bitstream, MidasError> {
                        let checksum = b
                            .checksum
                            .filter(|c| !c.is_empty())
                            .map(Checksum::new)
                            .transpose()
                            .map_err(invalid("bitstream checksum"))?;
                        Ok(Bitstream {
                            name: b.name,
                            checksum,
                            size: b.size.and_then(|s| s.parse().ok()),
                        })
                    })
                    .collect::<Result<Vec<_>, MidasError>>()?;
                Ok(Revision { bitstreams })
            })
            .collect::<Result<Vec<_>, MidasError>>()?;

        Ok(ItemDetail {
            id: item_id(self.item_id)?,
            name: self.name,
            revisions,
        })
    }
}

impl WireUser {
    fn into_info(self) -> Result<UserInfo, MidasError> {
        Ok(UserInfo {
            id: PrincipalId::new(self.user_id).map_err(invalid("user id"))?,
            first_name: self.firstname,
            last_name: self.lastname,
            email: self.email.and_then(|e| Email::new(e).ok()),
            root_folder_id: optional_folder_id(self.folder_id)?,
        })
    }
}

impl WireCommunity {
    fn into_info(self) -> Result<CommunityInfo, MidasError> {
        Ok(CommunityInfo {
            id: PrincipalId::new(self.community_id).map_err(invalid("community id"))?,
            name: self.name,
            root_folder_id: optional_folder_id(self.folder_id)?,
        })
    }
}

/// How to look up a user with `midas.user.get`
#[derive(Debug, Clone, Copy)]
pub enum UserQuery<'a> {
    Id(&'a PrincipalId),
    Email(&'a Email),
    Name { first: &'a str, last: &'a str },
}

/// How to look up a community with `midas.community.get`
#[derive(Debug, Clone, Copy)]
pub enum CommunityQuery<'a> {
    Id(&'a PrincipalId),
    Name(&'a str),
}

// ============================================================================
// MidasClient
// ============================================================================

/// HTTP client for Midas JSON web API calls
///
/// Wraps `reqwest::Client` with API URL construction and envelope
/// decoding. The client is stateless: the session token is passed on
/// every call.
#[derive(Debug, Clone)]
pub struct MidasClient {
    /// The underlying HTTP client
    client: Client,
    /// Server base URL without a trailing `/`
    base_url: String,
}

impl MidasClient {
    /// Creates a new MidasClient for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_parts(Client::new(), base_url.into())
    }

    /// Creates a new MidasClient that gives up when connecting or waiting
    /// for the next chunk of a response takes longer than `timeout`
    ///
    /// There is no deadline for a whole request, so long streamed uploads
    /// and downloads are not cut off while data keeps flowing.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MidasError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self::from_parts(client, base_url.into()))
    }

    fn from_parts(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for the given API method
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `api_method` - Web API method name (e.g., "midas.folder.get")
    pub fn request(&self, method: Method, api_method: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, API_PATH);
        self.client
            .request(method, &url)
            .query(&[("method", api_method)])
    }

    /// Calls an API method without a session and decodes its `data`
    pub async fn call<T: DeserializeOwned>(
        &self,
        api_method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MidasError> {
        debug!(api_method, "Calling Midas API");
        let response = self
            .request(Method::POST, api_method)
            .query(params)
            .send()
            .await?;
        Self::decode(api_method, response).await
    }

    /// Calls an API method on behalf of `session` and decodes its `data`
    pub async fn call_with_session<T: DeserializeOwned>(
        &self,
        session: &Session,
        api_method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MidasError> {
        debug!(api_method, "Calling Midas API");
        let response = self
            .request(Method::POST, api_method)
            .query(&[("token", session.token())])
            .query(params)
            .send()
            .await?;
        Self::decode(api_method, response).await
    }

    /// Decodes a response envelope
    pub(crate) async fn decode<T: DeserializeOwned>(
        api_method: &str,
        response: Response,
    ) -> Result<T, MidasError> {
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<Envelope>(&body) {
            Ok(envelope) => envelope.into_data(api_method),
            Err(e) => Err(status_error(api_method, status).unwrap_or_else(|| {
                MidasError::InvalidResponse(format!(
                    "{api_method} returned a non-JSON body (HTTP {status}): {e}"
                ))
            })),
        }
    }

    // ------------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------------

    /// `midas.folder.get`: name and parent of a folder
    pub async fn folder_get(&self, session: &Session, id: &FolderId) -> Result<FolderDetail, MidasError> {
        let folder: WireFolder = self
            .call_with_session(session, "midas.folder.get", &[("id", id.as_str())])
            .await?;
        folder.into_detail()
    }

    /// `midas.folder.children`: child folders and items keyed by name
    pub async fn folder_children(
        &self,
        session: &Session,
        id: &FolderId,
    ) -> Result<FolderListing, MidasError> {
        let children: WireChildren = self
            .call_with_session(session, "midas.folder.children", &[("id", id.as_str())])
            .await?;

        let folders = children
            .folders
            .into_iter()
            .map(WireFolder::into_ref)
            .collect::<Result<Vec<_>, _>>()?;
        let items = children
            .items
            .into_iter()
            .map(WireItemRef::into_ref)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            folder = %id,
            folders = folders.len(),
            items = items.len(),
            "Listed folder children"
        );
        Ok(FolderListing::from_children(folders, items))
    }

    /// `midas.folder.create`: creates a folder named `name` in `parent`
    pub async fn folder_create(
        &self,
        session: &Session,
        name: &str,
        parent: &FolderId,
    ) -> Result<FolderId, MidasError> {
        let folder: WireFolder = self
            .call_with_session(
                session,
                "midas.folder.create",
                &[("name", name), ("parentid", parent.as_str())],
            )
            .await?;
        folder_id(folder.folder_id)
    }

    /// `midas.folder.delete`: deletes a folder and its contents
    pub async fn folder_delete(&self, session: &Session, id: &FolderId) -> Result<(), MidasError> {
        let _: serde_json::Value = self
            .call_with_session(session, "midas.folder.delete", &[("id", id.as_str())])
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------------

    /// `midas.item.get`: item with its revisions and bitstreams
    pub async fn item_get(&self, session: &Session, id: &ItemId) -> Result<ItemDetail, MidasError> {
        let item: WireItem = self
            .call_with_session(session, "midas.item.get", &[("id", id.as_str())])
            .await?;
        item.into_detail()
    }

    /// `midas.item.create`: creates an empty item named `name` in `parent`
    pub async fn item_create(
        &self,
        session: &Session,
        name: &str,
        parent: &FolderId,
    ) -> Result<ItemId, MidasError> {
        let item: WireItemRef = self
            .call_with_session(
                session,
                "midas.item.create",
                &[("name", name), ("parentid", parent.as_str())],
            )
            .await?;
        item_id(item.item_id)
    }

    /// `midas.item.delete`: deletes an item and all its revisions
    pub async fn item_delete(&self, session: &Session, id: &ItemId) -> Result<(), MidasError> {
        let _: serde_json::Value = self
            .call_with_session(session, "midas.item.delete", &[("id", id.as_str())])
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Principals
    // ------------------------------------------------------------------------

    /// `midas.user.get`: looks up a user by id, email or name
    pub async fn user_get(&self, session: &Session, query: UserQuery<'_>) -> Result<UserInfo, MidasError> {
        let params: Vec<(&str, &str)> = match query {
            UserQuery::Id(id) => vec![("user_id", id.as_str())],
            UserQuery::Email(email) => vec![("email", email.as_str())],
            UserQuery::Name { first, last } => vec![("firstname", first), ("lastname", last)],
        };
        let user: WireUser = self
            .call_with_session(session, "midas.user.get", &params)
            .await?;
        user.into_info()
    }

    /// `midas.community.get`: looks up a community by id or name
    pub async fn community_get(
        &self,
        session: &Session,
        query: CommunityQuery<'_>,
    ) -> Result<CommunityInfo, MidasError> {
        let params: Vec<(&str, &str)> = match query {
            CommunityQuery::Id(id) => vec![("id", id.as_str())],
            CommunityQuery::Name(name) => vec![("name", name)],
        };
        let community: WireCommunity = self
            .call_with_session(session, "midas.community.get", &params)
            .await?;
        community.into_info()
    }
}

/// Maps HTTP statuses that carry no envelope to an error class
pub(crate) fn status_error(api_method: &str, status: StatusCode) -> Option<MidasError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(MidasError::Unauthorized(format!(
            "{api_method} rejected the session"
        ))),
        StatusCode::FORBIDDEN => Some(MidasError::Forbidden(format!(
            "{api_method} is not allowed"
        ))),
        StatusCode::NOT_FOUND => Some(MidasError::NotFound(format!(
            "{api_method} endpoint not found"
        ))),
        _ => None,
    }
}
