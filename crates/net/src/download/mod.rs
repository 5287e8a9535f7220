//! Streaming download of the distribution archive
//!
//! Data lands in a `.part` sibling of the destination and is renamed into
//! place only after the last chunk is flushed. Cancellation is checked
//! between chunks; a cancelled download writes nothing further, removes the
//! partial file and returns `Error::Cancelled`.

mod core;
mod stream;
mod validation;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;
use vernal_errors::Error;

pub use self::core::HttpDownloader;

/// Bytes received so far and the expected total, if known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

/// Callback invoked as bytes arrive; may run on any task.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Fetches a URL to a local path.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `source` to `destination`, reporting progress.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` when `cancel` fires, or a network/IO error.
    async fn download(
        &self,
        source: &Url,
        destination: &Path,
        on_progress: ProgressCallback,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, Error>;
}

/// Sibling path the download is staged in
pub(crate) fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}
