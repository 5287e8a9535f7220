//! URL validation and HTTP response validation for downloads

use url::Url;
use vernal_errors::{Error, NetworkError};

/// Check for supported protocols
pub(super) fn validate_url(url: &Url) -> Result<(), Error> {
    match url.scheme() {
        "http" | "https" | "file" => Ok(()),
        scheme => Err(NetworkError::UnsupportedProtocol {
            protocol: scheme.to_string(),
        }
        .into()),
    }
}

/// Reject non-success responses before any byte is written
pub(super) fn validate_response(response: &reqwest::Response) -> Result<(), Error> {
    let status = response.status();

    if !status.is_success() {
        return Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Expected length, treating zero or absent as unknown
pub(super) fn expected_total(content_length: Option<u64>) -> Option<u64> {
    content_length.filter(|len| *len > 0)
}
