//! Peer interface boundary.
//!
//! The transport itself lives outside this crate; the sync worker only
//! needs a way to submit a request to a peer and a channel on which the
//! matching response will eventually arrive. Responses are correlated per
//! request with a dedicated oneshot channel, so multiple in-flight
//! backward-walk requests never block each other.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::NetworkResult;
use crate::types::HashedHeader;

/// Opaque peer identity, used for logging and event attribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        PeerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        PeerId(id.to_owned())
    }
}

/// A request the sync worker can submit to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRequest {
    /// A single header with its height attached.
    GetHeader { height: u32 },
    /// A chunk of up to `chunk_size` concatenated 80-byte records starting
    /// at `index * chunk_size`.
    GetChunk { index: u32 },
}

/// A peer's answer to a [`PeerRequest`].
#[derive(Debug, Clone)]
pub enum PeerResponse {
    /// `None` when the peer has no header at the requested height.
    Header(Option<HashedHeader>),
    /// Raw concatenated header records.
    Chunk(Vec<u8>),
}

/// A remote peer able to serve headers and chunks.
///
/// Implemented by the surrounding network layer; this crate only consumes
/// it. The returned receiver resolves when the peer answers; the worker
/// waits on it with a bounded, retried timeout.
#[async_trait]
pub trait Peer: Send + Sync {
    fn id(&self) -> PeerId;

    async fn send_request(
        &self,
        request: PeerRequest,
    ) -> NetworkResult<oneshot::Receiver<PeerResponse>>;
}
