//! HTTP client with connection pooling and retry logic

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use url::Url;
use vernal_errors::{Error, NetworkError};

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // 5 minutes for large downloads
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: format!("vernal/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&vernal_config::NetworkConfig> for NetConfig {
    fn from(config: &vernal_config::NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            retry_count: config.retries,
            retry_delay: Duration::from_secs(config.retry_delay),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone, Debug)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Execute a GET request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts.
    pub async fn get(&self, url: &Url) -> Result<Response, Error> {
        self.retry_request(|| self.client.get(url.clone())).await
    }

    /// Execute a POST request with an empty body, exactly once
    ///
    /// Login requests carry credentials in the query and must not be
    /// replayed; the client timeout bounds the whole exchange. Any HTTP
    /// response is returned.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request cannot be completed.
    pub async fn post_once(&self, url: &Url) -> Result<Response, Error> {
        self.client.post(url.clone()).send().await.map_err(|e| {
            let url = e.url().map(redacted).unwrap_or_default();
            let e = e.without_url();
            tracing::debug!(%url, error = %e, "request failed");
            Self::transport_error(&e, url)
        })
    }

    /// Execute a request with retries
    async fn retry_request<F>(&self, build: F) -> Result<Response, Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }

            match build().send().await {
                Ok(response) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        if let Some(retry_after) = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                        {
                            return Err(NetworkError::RateLimited {
                                seconds: retry_after,
                            }
                            .into());
                        }
                    }

                    return Ok(response);
                }
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    let url = e.url().map(redacted).unwrap_or_default();
                    // Drop the URL from the error: queries may carry secrets.
                    let e = e.without_url();
                    tracing::debug!(attempt, retry, %url, error = %e, "request failed");
                    last_error = Some((e, url));
                    if !retry {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some((e, url)) => Err(Self::transport_error(&e, url)),
            None => Err(NetworkError::DownloadFailed("Unknown error".to_string()).into()),
        }
    }

    fn transport_error(error: &reqwest::Error, url: String) -> Error {
        if error.is_timeout() {
            NetworkError::Timeout { url }.into()
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string()).into()
        } else {
            NetworkError::DownloadFailed(error.to_string()).into()
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_some_and(|s| s.is_server_error())
    }
}

/// URL without its query string, safe to log
#[must_use]
pub fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
