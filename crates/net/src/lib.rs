#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for vernal
//!
//! This crate handles the HTTP side of an installation: the login
//! round-trip, the archive download and the server health probe, all on top
//! of one pooled client. GETs retry transport failures; the login POST is
//! sent once.

mod client;
mod download;
mod login;
mod monitor;

pub use client::{redacted, NetClient, NetConfig};
pub use download::{DownloadProgress, Downloader, HttpDownloader, ProgressCallback};
pub use login::{login, login_request_url};
pub use monitor::ConnectionMonitor;

use url::Url;
use vernal_errors::{Error, NetworkError};

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
