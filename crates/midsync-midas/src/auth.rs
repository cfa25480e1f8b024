//! API-key login for the Midas web API
//!
//! `midas.login` exchanges an account email, an API key and the name of
//! the application the key was generated for into a session token.

use midsync_core::domain::{Credentials, Session};
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::MidasClient;
use crate::MidasError;

/// Response of `midas.login`
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Logs in and returns a session for `credentials.email`
///
/// # Errors
/// Any API-level rejection is reported as [`MidasError::Unauthorized`];
/// transport failures keep their own class.
pub async fn login(client: &MidasClient, credentials: &Credentials) -> Result<Session, MidasError> {
    debug!(email = %credentials.email, app = %credentials.app_name, "Logging in");

    let response: LoginResponse = client
        .call(
            "midas.login",
            &[
                ("email", credentials.email.as_str()),
                ("apikey", credentials.api_key.as_str()),
                ("appname", credentials.app_name.as_str()),
            ],
        )
        .await
        .map_err(|e| match e {
            MidasError::Api { message, .. } | MidasError::Forbidden(message) => {
                MidasError::Unauthorized(format!("Login failed: {message}"))
            }
            other => other,
        })?;

    if response.token.is_empty() {
        return Err(MidasError::Unauthorized(
            "Login failed: server returned an empty token".to_string(),
        ));
    }

    info!(email = %credentials.email, "Logged in");
    Ok(Session::new(response.token, credentials.email.clone()))
}
