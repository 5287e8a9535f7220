//! Login request and response payloads
//!
//! The login endpoint answers with one of two JSON shapes. [`LoginResponse`]
//! tries the success shape first and falls back to the failure shape; when
//! neither matches, the decode error describes why the success shape was
//! rejected so a malformed success payload is not mistaken for a refusal.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// User-supplied credentials for one installation attempt
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub server_base_url: Url,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, server_base_url: Url) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            server_base_url,
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server_base_url", &self.server_base_url.as_str())
            .finish()
    }
}

/// Where to fetch the distribution and which version it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginMessage {
    pub download_url: Url,
    #[serde(rename = "vernal_falls_version")]
    pub distribution_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch_icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub message: LoginMessage,
    /// Key/value pairs written verbatim to the service configuration file
    #[serde(rename = "vernal_falls_config")]
    pub config: BTreeMap<String, String>,
    #[serde(rename = "org")]
    pub organization: Organization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailure {
    pub error: String,
}

/// Decoded body of the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Success(LoginSuccess),
    Failure(LoginFailure),
}

impl LoginResponse {
    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the body is neither a success nor a
    /// failure payload.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

impl<'de> Deserialize<'de> for LoginResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let success_err = match LoginSuccess::deserialize(&value) {
            Ok(success) => return Ok(Self::Success(success)),
            Err(err) => err,
        };

        match LoginFailure::deserialize(&value) {
            Ok(failure) => Ok(Self::Failure(failure)),
            Err(_) => Err(de::Error::custom(format!(
                "login response is not a valid success payload: {success_err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new(
            "mike",
            "secret",
            Url::parse("https://home.spartascience.com").unwrap(),
        );
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("mike"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_success_preferred_when_both_shapes_present() {
        let body = br#"{
            "message": {"download_url": "https://example.com/a.tgz", "vernal_falls_version": "1.0"},
            "vernal_falls_config": {},
            "org": {"id": 1, "name": "Org"},
            "error": "ignored"
        }"#;
        assert!(matches!(
            LoginResponse::from_slice(body).unwrap(),
            LoginResponse::Success(_)
        ));
    }
}
