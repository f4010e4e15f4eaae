//! Shared helpers for integration tests: reduced consensus parameters, a
//! chain builder that mines real proof of work against them, and a scripted
//! in-process peer.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use maza_spv::consensus::compact;
use maza_spv::error::NetworkResult;
use maza_spv::{
    BlockHash, ChainParams, Config, DifficultyEngine, HashedHeader, Header, HeaderAnnouncement,
    HeaderStore, Peer, PeerId, PeerRequest, PeerResponse, SpvEvent, SyncWorker,
};

pub const BASE_TIME: u32 = 1_400_000_000;

/// Consensus parameters scaled down so tests mine blocks in a few hash
/// attempts and cross chunk boundaries quickly.
pub fn easy_params() -> ChainParams {
    ChainParams {
        genesis_bits: 0x1fffffff,
        start_bits: 0x1f7fffff,
        max_target: compact::bits_to_target(0x1fffffff),
        target_spacing: 120,
        target_timespan: 480,
        averaging_intervals: 5,
        max_adjust_up: 15,
        max_adjust_down: 20,
        dgw_activation_height: 1000,
        dgw_past_blocks: 6,
        chunk_size: 8,
    }
}

/// Increment the nonce until the header's hash meets `target`.
pub fn mine(mut header: Header, target: primitive_types::U256) -> Header {
    while header.block_hash().as_u256() >= target {
        header.nonce += 1;
    }
    header
}

/// A fully valid chain from genesis, mined against `params`.
pub struct TestChain {
    pub params: ChainParams,
    pub headers: Vec<Header>,
    _dir: tempfile::TempDir,
}

impl TestChain {
    pub fn generate(params: ChainParams, count: u32) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(
            HeaderStore::open(dir.path(), params.chunk_size, None).expect("builder store"),
        );
        let engine = DifficultyEngine::new(store.clone(), params);

        let mut headers = Vec::with_capacity(count as usize);
        let mut prev_hash = BlockHash::ZERO;
        for height in 0..count {
            let (bits, target) = engine.get_target(height, None).expect("target");
            let header = mine(
                Header {
                    version: 2,
                    prev_block_hash: prev_hash,
                    merkle_root: [height as u8; 32],
                    timestamp: BASE_TIME + height * params.target_spacing,
                    bits,
                    nonce: 0,
                },
                target,
            );
            store.write(&header, height).expect("builder write");
            prev_hash = header.block_hash();
            headers.push(header);
        }

        Self {
            params,
            headers,
            _dir: dir,
        }
    }

    pub fn hashed(&self, height: u32) -> HashedHeader {
        HashedHeader {
            height,
            header: self.headers[height as usize],
        }
    }

    /// Concatenated raw records for chunk `index`, clamped to the chain's
    /// length.
    pub fn chunk_bytes(&self, index: u32) -> Vec<u8> {
        let chunk_size = self.params.chunk_size as usize;
        let start = index as usize * chunk_size;
        let end = (start + chunk_size).min(self.headers.len());
        self.headers[start..end].iter().flat_map(|h| h.to_bytes()).collect()
    }
}

/// A scripted peer serving headers and chunks from a [`TestChain`].
pub struct MockPeer {
    id: PeerId,
    headers: Vec<Header>,
    chunk_size: u32,
    /// Chunk index -> number of remaining corrupt serves. `u32::MAX` means
    /// always corrupt.
    corrupt_chunks: Mutex<HashMap<u32, u32>>,
    /// Responses are sent this long after the request.
    response_delay: Option<Duration>,
    /// A silent peer never answers; the senders are parked here so the
    /// response channels stay open.
    silent: bool,
    parked: Mutex<Vec<oneshot::Sender<PeerResponse>>>,
    pub requests: Mutex<Vec<PeerRequest>>,
}

impl MockPeer {
    pub fn new(id: &str, chain: &TestChain) -> Self {
        Self {
            id: PeerId::new(id),
            headers: chain.headers.clone(),
            chunk_size: chain.params.chunk_size,
            corrupt_chunks: Mutex::new(HashMap::new()),
            response_delay: None,
            silent: false,
            parked: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request only after `delay` has elapsed.
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    /// Never answer, but keep every response channel open.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Serve chunk `index` corrupted for the next `times` requests.
    pub fn corrupt_chunk(self, index: u32, times: u32) -> Self {
        self.corrupt_chunks.lock().unwrap().insert(index, times);
        self
    }

    /// Serve every chunk corrupted, forever.
    pub fn corrupt_all_chunks(self) -> Self {
        let indices: Vec<u32> =
            (0..=(self.headers.len() as u32 / self.chunk_size)).collect();
        {
            let mut corrupt = self.corrupt_chunks.lock().unwrap();
            for index in indices {
                corrupt.insert(index, u32::MAX);
            }
        }
        self
    }

    pub fn request_log(&self) -> Vec<PeerRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn chunk_response(&self, index: u32) -> Vec<u8> {
        let start = (index * self.chunk_size) as usize;
        let end = (start + self.chunk_size as usize).min(self.headers.len());
        let mut raw: Vec<u8> = if start >= end {
            Vec::new()
        } else {
            self.headers[start..end].iter().flat_map(|h| h.to_bytes()).collect()
        };

        let mut corrupt = self.corrupt_chunks.lock().unwrap();
        if let Some(remaining) = corrupt.get_mut(&index) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                // Zero the bits field of every record so verification
                // fails deterministically.
                for record in raw.chunks_mut(80) {
                    record[72..76].fill(0);
                }
            }
        }
        raw
    }
}

#[async_trait]
impl Peer for MockPeer {
    fn id(&self) -> PeerId {
        self.id.clone()
    }

    async fn send_request(
        &self,
        request: PeerRequest,
    ) -> NetworkResult<oneshot::Receiver<PeerResponse>> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = oneshot::channel();
        if self.silent {
            self.parked.lock().unwrap().push(tx);
            return Ok(rx);
        }
        let response = match request {
            PeerRequest::GetHeader {
                height,
            } => PeerResponse::Header(self.headers.get(height as usize).map(|header| {
                HashedHeader {
                    height,
                    header: *header,
                }
            })),
            PeerRequest::GetChunk {
                index,
            } => PeerResponse::Chunk(self.chunk_response(index)),
        };
        match self.response_delay {
            Some(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(response);
                });
            }
            None => {
                let _ = tx.send(response);
            }
        }
        Ok(rx)
    }
}

/// A running sync worker over a fresh store.
pub struct TestHarness {
    pub store: Arc<HeaderStore>,
    pub announcements: mpsc::UnboundedSender<HeaderAnnouncement>,
    pub events: mpsc::UnboundedReceiver<SpvEvent>,
    pub shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestHarness {
    pub fn spawn(params: ChainParams, data_dir: &Path) -> Self {
        let config = Config::new(data_dir)
            .with_chunk_sync_gap(10)
            .with_response_wait(Duration::from_millis(100));
        let store = Arc::new(
            HeaderStore::open(&config.data_dir, params.chunk_size, None).expect("store"),
        );
        let (announcement_tx, announcement_rx) = mpsc::unbounded_channel();
        let (worker, events) = SyncWorker::new(store.clone(), params, config, announcement_rx);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));
        Self {
            store,
            announcements: announcement_tx,
            events,
            shutdown,
            handle,
        }
    }

    pub fn announce(&self, peer: &Arc<MockPeer>, header: HashedHeader) {
        self.announcements
            .send(HeaderAnnouncement {
                peer: peer.clone() as Arc<dyn Peer>,
                header,
            })
            .expect("worker alive");
    }

    /// Wait for the next event, failing the test after five seconds.
    pub async fn next_event(&mut self) -> SpvEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel open")
    }

    /// Assert that no event arrives within a short window.
    pub async fn expect_no_event(&mut self) {
        let outcome =
            tokio::time::timeout(Duration::from_millis(300), self.events.recv()).await;
        assert!(outcome.is_err(), "unexpected event: {:?}", outcome);
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.handle.await;
    }
}
