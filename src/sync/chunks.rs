//! Bulk chunk synchronization.
//!
//! When the announced height is far ahead of the local tip, headers are
//! fetched in fixed-size chunks. Each chunk is decoded and verified as a
//! whole before any of it is persisted, so a failure partway through a
//! chunk never leaves invalid records on disk. A failed chunk steps the
//! index back by one and retries from the previous, presumably still valid
//! boundary; stepping below index zero fails the sync attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::chain::{BlockHash, Header, HEADER_SIZE};
use crate::consensus::DifficultyEngine;
use crate::error::{NetworkError, SyncError, SyncResult, ValidationError};
use crate::network::{Peer, PeerRequest, PeerResponse};
use crate::storage::HeaderStore;
use crate::types::HeaderChain;

pub struct ChunkSyncer {
    store: Arc<HeaderStore>,
    engine: DifficultyEngine,
    response_wait: Duration,
}

impl ChunkSyncer {
    pub fn new(store: Arc<HeaderStore>, engine: DifficultyEngine, response_wait: Duration) -> Self {
        Self {
            store,
            engine,
            response_wait,
        }
    }

    /// Fill the gap between the local tip and `announced_height` chunk by
    /// chunk, ascending.
    pub async fn sync(
        &self,
        peer: &dyn Peer,
        announced_height: u32,
        shutdown: &CancellationToken,
    ) -> SyncResult<()> {
        let chunk_size = self.engine.params().chunk_size;
        let next_height = self.store.tip_height().map_or(0, |tip| tip + 1);
        let min_index = next_height / chunk_size;
        let max_index = announced_height / chunk_size;

        let mut index = min_index as i64;
        while index <= max_index as i64 {
            if shutdown.is_cancelled() {
                return Err(SyncError::Stopped);
            }

            tracing::debug!("requesting chunk {} from {}", index, peer.id());
            let response = super::request(
                peer,
                PeerRequest::GetChunk {
                    index: index as u32,
                },
                self.response_wait,
                shutdown,
            )
            .await?;
            let PeerResponse::Chunk(raw) = response else {
                return Err(NetworkError::UnexpectedResponse(peer.id()).into());
            };

            match self.verify_chunk(index as u32, &raw) {
                Ok(()) => {
                    self.store.write_chunk(index as u32, &raw)?;
                    tracing::debug!("validated chunk {} ({} headers)", index, raw.len() / HEADER_SIZE);
                    index += 1;
                }
                Err(e) => {
                    tracing::warn!("chunk {} from {} failed verification: {}", index, peer.id(), e);
                    index -= 1;
                    if index < 0 {
                        return Err(SyncError::ChunkExhausted);
                    }
                }
            }
        }

        Ok(())
    }

    /// Decode and verify every record of a raw chunk, buffering the decoded
    /// headers so nothing is persisted unless the whole chunk passes.
    fn verify_chunk(&self, index: u32, raw: &[u8]) -> SyncResult<()> {
        if raw.is_empty() || raw.len() % HEADER_SIZE != 0 {
            return Err(ValidationError::MalformedHeader {
                actual: raw.len() % HEADER_SIZE,
            }
            .into());
        }

        let chunk_size = self.engine.params().chunk_size;
        let start_height = index * chunk_size;

        let mut prev_hash = if index == 0 {
            BlockHash::ZERO
        } else {
            self.store
                .read(start_height - 1)?
                .ok_or(ValidationError::MissingHeader {
                    height: start_height - 1,
                })?
                .block_hash()
        };

        let mut verified = HeaderChain::new(start_height);
        for (i, record) in raw.chunks(HEADER_SIZE).enumerate() {
            let height = start_height + i as u32;
            let header = Header::from_bytes(record)?;
            let (bits, target) = self.engine.get_target(height, Some(&verified))?;

            if header.prev_block_hash != prev_hash {
                return Err(ValidationError::LinkageMismatch {
                    height,
                }
                .into());
            }
            if header.bits != bits {
                return Err(ValidationError::BitsMismatch {
                    height,
                    expected: bits,
                    actual: header.bits,
                }
                .into());
            }
            let hash = header.block_hash();
            if hash.as_u256() >= target {
                return Err(ValidationError::ProofOfWorkInsufficient {
                    height,
                }
                .into());
            }

            prev_hash = hash;
            verified.push(header);
        }

        Ok(())
    }
}
