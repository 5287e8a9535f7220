//! `HttpDownloader`: the production `Downloader`

use super::stream::{stream_to_file, StreamOutcome};
use super::validation::{expected_total, validate_response, validate_url};
use super::{part_path, Downloader, ProgressCallback};
use crate::client::{redacted, NetClient};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;
use vernal_errors::{Error, NetworkError};
use vernal_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext};

/// Downloads over `http`/`https` with reqwest and copies `file://` sources.
#[derive(Clone, Debug)]
pub struct HttpDownloader {
    client: NetClient,
    events: Option<EventSender>,
}

impl HttpDownloader {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self {
            client,
            events: None,
        }
    }

    /// Emit download lifecycle events on `tx`
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.events = Some(tx);
        self
    }

    async fn fetch_http(
        &self,
        source: &Url,
        part: &Path,
        on_progress: &ProgressCallback,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, Error> {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.client.get(source) => response?,
        };
        validate_response(&response)?;

        let total = expected_total(response.content_length());
        self.emit_download_started(redacted(source), total);

        stream_to_file(response.bytes_stream(), part, total, on_progress, cancel).await
    }

    async fn fetch_file(
        &self,
        source: &Url,
        part: &Path,
        on_progress: &ProgressCallback,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, Error> {
        let path = source
            .to_file_path()
            .map_err(|()| NetworkError::InvalidUrl(source.to_string()))?;
        let file = tokio_fs::File::open(&path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        let total = file
            .metadata()
            .await
            .ok()
            .and_then(|meta| expected_total(Some(meta.len())));
        self.emit_download_started(source.as_str(), total);

        stream_to_file(ReaderStream::new(file), part, total, on_progress, cancel).await
    }
}

impl EventEmitter for HttpDownloader {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        source: &Url,
        destination: &Path,
        on_progress: ProgressCallback,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, Error> {
        validate_url(source)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(parent) = destination.parent() {
            tokio_fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }

        let part = part_path(destination);
        let result = if source.scheme() == "file" {
            self.fetch_file(source, &part, &on_progress, cancel).await
        } else {
            self.fetch_http(source, &part, &on_progress, cancel).await
        };

        let url = redacted(source);
        match result {
            Ok(outcome) => {
                tokio_fs::rename(&part, destination)
                    .await
                    .map_err(|e| Error::io_with_path(&e, destination))?;
                tracing::debug!(%url, size = outcome.size, "download stored");
                self.emit_download_completed(url, outcome.size, outcome.hash.to_hex().to_string());
                Ok(destination.to_path_buf())
            }
            Err(err) => {
                let bytes_downloaded = tokio_fs::metadata(&part).await.map_or(0, |m| m.len());
                remove_partial(&part).await;
                if err.is_cancelled() {
                    self.emit(AppEvent::Download(DownloadEvent::Cancelled {
                        url,
                        bytes_downloaded,
                    }));
                } else {
                    self.emit(AppEvent::Download(DownloadEvent::Failed {
                        url,
                        failure: FailureContext::from_error(&err),
                    }));
                }
                Err(err)
            }
        }
    }
}

async fn remove_partial(part: &Path) {
    match tokio_fs::remove_file(part).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %part.display(), error = %e, "failed to remove partial download"),
    }
}
