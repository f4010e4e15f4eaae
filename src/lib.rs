//! Mazacoin SPV header-chain synchronization engine.
//!
//! This library maintains a local append-only file of block headers and
//! extends it from headers announced by untrusted remote peers:
//!
//! - Parse and hash the fixed 80-byte header wire format
//! - Validate proof-of-work and difficulty continuity under the network's
//!   two historical retarget algorithms
//! - Bulk-sync large gaps in verified 2016-header chunks
//! - Walk backward to reconnect announced tips, detecting forks and
//!   rolling back to the last chunk boundary on a reorg
//! - Report each new best height to the surrounding application
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use maza_spv::{ChainParams, Config, HeaderStore, SyncWorker};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> maza_spv::Result<()> {
//! let params = ChainParams::mazacoin();
//! let config = Config::new("./maza-spv-data");
//! let store = Arc::new(HeaderStore::open(
//!     &config.data_dir,
//!     params.chunk_size,
//!     config.headers_seed.as_deref(),
//! )?);
//!
//! let (announcement_tx, announcement_rx) = mpsc::unbounded_channel();
//! let (worker, mut events) = SyncWorker::new(store, params, config, announcement_rx);
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(worker.run(shutdown.clone()));
//!
//! // Peer connections push announcements into `announcement_tx`; new best
//! // heights arrive on `events`.
//! # let _ = (announcement_tx, &mut events);
//! # Ok(())
//! # }
//! ```
//!
//! The peer transport is external: connections implement [`network::Peer`]
//! and feed `(peer, header)` announcements into the worker's queue.

pub mod chain;
pub mod config;
pub mod consensus;
pub mod error;
pub mod logging;
pub mod network;
pub mod storage;
pub mod sync;
pub mod types;

pub use chain::{BlockHash, ChainVerifier, Header, HEADER_SIZE};
pub use config::Config;
pub use consensus::{ChainParams, DifficultyEngine};
pub use error::{Result, SpvError};
pub use network::{Peer, PeerId, PeerRequest, PeerResponse};
pub use storage::HeaderStore;
pub use sync::{ChainReconnector, ChunkSyncer, HeaderAnnouncement, SyncWorker};
pub use types::{HashedHeader, HeaderChain, SpvEvent};
