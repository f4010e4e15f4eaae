//! Backward chain reconnection.
//!
//! Starting from an announced tip, walk backward requesting missing
//! ancestors from the peer until the accumulated sequence connects to a
//! header already in the store. A stored predecessor that disagrees with
//! the candidate's linkage means the local chain and the peer's chain have
//! genuinely diverged: the store is rolled back to the last chunk boundary
//! and the walk reports a fork instead of a chain.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{NetworkError, SyncError, SyncResult};
use crate::network::{Peer, PeerRequest, PeerResponse};
use crate::storage::HeaderStore;
use crate::types::{HashedHeader, HeaderChain};

pub struct ChainReconnector {
    store: Arc<HeaderStore>,
    response_wait: Duration,
}

impl ChainReconnector {
    pub fn new(store: Arc<HeaderStore>, response_wait: Duration) -> Self {
        Self {
            store,
            response_wait,
        }
    }

    /// Assemble the contiguous candidate chain ending at `tip`.
    ///
    /// Terminates because every iteration without a local match requests a
    /// strictly lower height, bounded below by height 0.
    pub async fn reconnect(
        &self,
        peer: &dyn Peer,
        tip: HashedHeader,
        shutdown: &CancellationToken,
    ) -> SyncResult<HeaderChain> {
        let mut accumulated: VecDeque<HashedHeader> = VecDeque::new();
        accumulated.push_front(tip);
        let mut cursor = tip;

        loop {
            if shutdown.is_cancelled() {
                return Err(SyncError::Stopped);
            }

            let height = cursor.height;
            if height == 0 {
                // Walked all the way down; the verifier checks the genesis
                // linkage against the all-zero hash.
                break;
            }

            match self.store.read(height - 1)? {
                Some(stored) => {
                    if stored.block_hash() == cursor.header.prev_block_hash {
                        // Reconnected to the local chain.
                        break;
                    }
                    tracing::warn!(
                        "reorg: stored header {} disagrees with chain announced by {}",
                        height - 1,
                        peer.id()
                    );
                    let tip = self.store.rollback_to_last_chunk_boundary()?;
                    tracing::info!("rolled back to chunk boundary, tip now {:?}", tip);
                    return Err(SyncError::ForkDetected {
                        height: height - 1,
                    });
                }
                None => {
                    tracing::debug!("requesting header {} from {}", height - 1, peer.id());
                    let response = super::request(
                        peer,
                        PeerRequest::GetHeader {
                            height: height - 1,
                        },
                        self.response_wait,
                        shutdown,
                    )
                    .await?;
                    let header = match response {
                        PeerResponse::Header(Some(hashed)) => hashed.header,
                        PeerResponse::Header(None) => {
                            return Err(SyncError::HeaderUnavailable {
                                height: height - 1,
                            });
                        }
                        PeerResponse::Chunk(_) => {
                            return Err(NetworkError::UnexpectedResponse(peer.id()).into());
                        }
                    };
                    cursor = HashedHeader {
                        height: height - 1,
                        header,
                    };
                    accumulated.push_front(cursor);
                }
            }
        }

        let start_height = accumulated.front().map(|h| h.height).unwrap_or(0);
        Ok(HeaderChain::from_headers(
            start_height,
            accumulated.into_iter().map(|h| h.header).collect(),
        ))
    }
}
