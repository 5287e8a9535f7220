//! Login round-trip against the app-setup endpoint

use url::Url;
use vernal_errors::{Error, NetworkError};
use vernal_types::server::login_url;
use vernal_types::{Credentials, LoginResponse};

use crate::client::{redacted, NetClient};

/// Build the login URL carrying `email`, `password` and `client-id`.
#[must_use]
pub fn login_request_url(credentials: &Credentials, client_id: &str) -> Url {
    let mut url = login_url(&credentials.server_base_url);
    url.query_pairs_mut()
        .append_pair("email", &credentials.username)
        .append_pair("password", &credentials.password)
        .append_pair("client-id", client_id);
    url
}

/// POST the credentials once and decode the server's answer.
///
/// A refusal from the server is a successful round-trip and comes back as
/// `LoginResponse::Failure`; only transport and decode problems are errors.
///
/// # Errors
///
/// Returns a network error if the request fails, or
/// `NetworkError::DecodeFailed` / `NetworkError::HttpError` when the body is
/// not a login payload.
pub async fn login(
    client: &NetClient,
    credentials: &Credentials,
    client_id: &str,
) -> Result<LoginResponse, Error> {
    let url = login_request_url(credentials, client_id);
    let safe_url = redacted(&url);
    tracing::debug!(url = %safe_url, username = %credentials.username, "logging in");

    let response = client.post_once(&url).await?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.without_url().to_string()))?;

    match LoginResponse::from_slice(&body) {
        Ok(decoded) => Ok(decoded),
        Err(_) if !status.is_success() => Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        }
        .into()),
        Err(e) => Err(NetworkError::DecodeFailed {
            url: safe_url,
            message: e.to_string(),
        }
        .into()),
    }
}
