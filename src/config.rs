//! Configuration for the header sync engine.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration.
///
/// Consensus constants live in [`crate::consensus::ChainParams`]; this
/// covers everything operational.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the `blockchain_headers` file.
    pub data_dir: PathBuf,

    /// Optional pre-synced header file copied in when the store is first
    /// created. Best effort: a missing or unreadable seed is tolerated.
    pub headers_seed: Option<PathBuf>,

    /// Announcements more than this many blocks ahead of the local tip go
    /// through bulk chunk sync instead of the backward walk.
    pub chunk_sync_gap: u32,

    /// How long to wait on a peer response before logging and re-waiting.
    pub response_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./maza-spv-data"),
            headers_seed: None,
            chunk_sync_gap: 50,
            response_wait: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_headers_seed(mut self, seed: impl Into<PathBuf>) -> Self {
        self.headers_seed = Some(seed.into());
        self
    }

    pub fn with_chunk_sync_gap(mut self, gap: u32) -> Self {
        self.chunk_sync_gap = gap;
        self
    }

    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = wait;
        self
    }
}
