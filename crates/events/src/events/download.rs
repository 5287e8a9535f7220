use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Events emitted while fetching the distribution archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    Started {
        url: String,
        total_bytes: Option<u64>,
    },

    Progress {
        url: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    Completed {
        url: String,
        bytes_downloaded: u64,
        /// BLAKE3 digest of the stored archive
        hash: String,
    },

    Failed {
        url: String,
        failure: FailureContext,
    },

    /// Download stopped by cancellation; partial data was discarded
    Cancelled {
        url: String,
        bytes_downloaded: u64,
    },
}
