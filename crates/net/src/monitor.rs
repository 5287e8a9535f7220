//! Server reachability check

use url::Url;

use crate::client::{redacted, NetClient};

/// Polls a health endpoint and answers whether the server is reachable.
///
/// Reachable means a success status and a body that parses as JSON. Any
/// failure, including transport errors, reads as "not connected".
#[derive(Clone, Debug)]
pub struct ConnectionMonitor {
    client: NetClient,
    url: Url,
}

impl ConnectionMonitor {
    #[must_use]
    pub fn new(client: NetClient, url: Url) -> Self {
        Self { client, url }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Probe the health endpoint once.
    pub async fn update(&self) -> bool {
        let body = if self.url.scheme() == "file" {
            match self.url.to_file_path() {
                Ok(path) => tokio::fs::read(path).await.ok(),
                Err(()) => None,
            }
        } else {
            self.fetch().await
        };

        let connected = body
            .is_some_and(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).is_ok());
        tracing::debug!(url = %redacted(&self.url), connected, "health check");
        connected
    }

    async fn fetch(&self) -> Option<Vec<u8>> {
        let response = self.client.get(&self.url).await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.bytes().await.ok().map(|b| b.to_vec())
    }
}
