//! The coordinating sync worker.
//!
//! A single background task drives all chain-mutating work: it drains the
//! inbound announcement queue, fills large gaps through the chunk syncer,
//! reconnects and verifies short extensions, persists verified headers and
//! emits new-best-height events. Being the sole writer is what makes the
//! individual passes safe to run without chain-level locking.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::chain::{ChainVerifier, Header};
use crate::config::Config;
use crate::consensus::{ChainParams, DifficultyEngine};
use crate::error::{SyncError, SyncResult};
use crate::network::Peer;
use crate::storage::HeaderStore;
use crate::sync::{ChainReconnector, ChunkSyncer};
use crate::types::{HashedHeader, SpvEvent};

/// A tip announcement pushed in by a peer connection.
#[derive(Clone)]
pub struct HeaderAnnouncement {
    pub peer: Arc<dyn Peer>,
    pub header: HashedHeader,
}

pub struct SyncWorker {
    store: Arc<HeaderStore>,
    config: Config,
    chunk_syncer: ChunkSyncer,
    reconnector: ChainReconnector,
    verifier: ChainVerifier,
    announcements: mpsc::UnboundedReceiver<HeaderAnnouncement>,
    events: mpsc::UnboundedSender<SpvEvent>,
}

impl SyncWorker {
    /// Build a worker over an opened store. Returns the worker and the
    /// receiver on which [`SpvEvent`]s are delivered.
    pub fn new(
        store: Arc<HeaderStore>,
        params: ChainParams,
        config: Config,
        announcements: mpsc::UnboundedReceiver<HeaderAnnouncement>,
    ) -> (Self, mpsc::UnboundedReceiver<SpvEvent>) {
        let engine = DifficultyEngine::new(store.clone(), params);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let worker = Self {
            store: store.clone(),
            chunk_syncer: ChunkSyncer::new(store.clone(), engine.clone(), config.response_wait),
            reconnector: ChainReconnector::new(store, config.response_wait),
            verifier: ChainVerifier::new(engine),
            config,
            announcements,
            events: event_tx,
        };
        (worker, event_rx)
    }

    /// Run until `shutdown` is cancelled or the announcement channel
    /// closes. Cancellation is cooperative, observed once per iteration.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("sync worker starting, local tip {:?}", self.store.tip_height());

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("sync worker stopping");
                    return;
                }
                announcement = self.announcements.recv() => {
                    let Some(announcement) = announcement else {
                        tracing::info!("announcement channel closed, sync worker exiting");
                        return;
                    };
                    match self.process(announcement, &shutdown).await {
                        Ok(()) => {}
                        Err(SyncError::Stopped) => return,
                        Err(e) => tracing::error!("announcement processing failed: {}", e),
                    }
                }
            }
        }
    }

    /// Handle one `(peer, header)` announcement.
    ///
    /// All verification failures skip the announcement and keep the loop
    /// alive; nothing here is fatal to the worker. Only storage errors
    /// bubble up, and the caller just logs them.
    async fn process(
        &mut self,
        announcement: HeaderAnnouncement,
        shutdown: &CancellationToken,
    ) -> SyncResult<()> {
        let peer = announcement.peer;
        let announced = announcement.header;
        let height = announced.height;

        if self.local_height() >= height as i64 {
            tracing::trace!("ignoring stale announcement of height {} from {}", height, peer.id());
            return Ok(());
        }

        if height as i64 > self.local_height() + self.config.chunk_sync_gap as i64 {
            match self.chunk_syncer.sync(peer.as_ref(), height, shutdown).await {
                Ok(()) => {}
                Err(SyncError::Stopped) => return Err(SyncError::Stopped),
                Err(e) => {
                    tracing::warn!("chunk sync with {} failed: {}", peer.id(), e);
                    return Ok(());
                }
            }
        }

        if height as i64 > self.local_height() {
            let chain = match self.reconnector.reconnect(peer.as_ref(), announced, shutdown).await {
                Ok(chain) => chain,
                Err(SyncError::Stopped) => return Err(SyncError::Stopped),
                Err(SyncError::ForkDetected {
                    height,
                }) => {
                    tracing::warn!("fork at height {} announced by {}", height, peer.id());
                    let _ = self.events.send(SpvEvent::Reorg {
                        tip_height: self.store.tip_height(),
                    });
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("could not reconnect chain from {}: {}", peer.id(), e);
                    return Ok(());
                }
            };

            let ancestor = self.ancestor_of(chain.start_height())?;
            if let Err(e) = self.verifier.verify(&chain, ancestor.as_ref()) {
                // Policy hook: a surrounding peer manager may deprioritize
                // this peer on repeated failures.
                tracing::warn!("invalid chain from {}: {}", peer.id(), e);
                return Ok(());
            }

            for (h, header) in chain.iter() {
                self.store.write(header, h)?;
            }
            tracing::info!("chain extended to height {} via {}", height, peer.id());
        }

        let _ = self.events.send(SpvEvent::NewBestHeight {
            height,
            peer: peer.id(),
        });
        Ok(())
    }

    fn local_height(&self) -> i64 {
        self.store.tip_height().map_or(-1, |tip| tip as i64)
    }

    fn ancestor_of(&self, start_height: u32) -> SyncResult<Option<Header>> {
        if start_height == 0 {
            return Ok(None);
        }
        Ok(self.store.read(start_height - 1)?)
    }
}
