//! Low-level streaming download mechanics

use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use vernal_errors::{Error, NetworkError};

use super::{DownloadProgress, ProgressCallback};

/// Size and BLAKE3 digest of a completed transfer
#[derive(Debug, Clone)]
pub(super) struct StreamOutcome {
    pub size: u64,
    pub hash: blake3::Hash,
}

/// Throttle progress callbacks; the first chunk always reports
fn should_report_progress(first_chunk: bool, last_update: &Instant) -> bool {
    first_chunk || last_update.elapsed() >= Duration::from_millis(50)
}

/// Copy `stream` into `part`, hashing as it goes.
///
/// The cancellation token is polled before every chunk; once it fires
/// nothing more is written and `Error::Cancelled` is returned.
pub(super) async fn stream_to_file<S, B, E>(
    mut stream: S,
    part: &Path,
    total: Option<u64>,
    on_progress: &ProgressCallback,
    cancel: &CancellationToken,
) -> Result<StreamOutcome, Error>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut file = File::create(part)
        .await
        .map_err(|e| Error::io_with_path(&e, part))?;
    let mut hasher = blake3::Hasher::new();
    let mut downloaded = 0u64;
    let mut last_progress_update = Instant::now();
    let mut first_chunk = true;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                let bytes = chunk.as_ref();
                hasher.update(bytes);
                file.write_all(bytes)
                    .await
                    .map_err(|e| Error::io_with_path(&e, part))?;
                downloaded += bytes.len() as u64;

                if should_report_progress(first_chunk, &last_progress_update) {
                    on_progress(DownloadProgress { downloaded, total });
                    last_progress_update = Instant::now();
                    first_chunk = false;
                }
            }
            Some(Err(e)) => return Err(NetworkError::DownloadFailed(e.to_string()).into()),
            None => break,
        }
    }

    file.flush()
        .await
        .map_err(|e| Error::io_with_path(&e, part))?;
    file.sync_all()
        .await
        .map_err(|e| Error::io_with_path(&e, part))?;
    drop(file);

    on_progress(DownloadProgress { downloaded, total });

    Ok(StreamOutcome {
        size: downloaded,
        hash: hasher.finalize(),
    })
}
