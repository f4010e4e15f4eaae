//! Error types for the Mazacoin SPV header engine.

use std::io;
use thiserror::Error;

use crate::network::PeerId;

/// Main error type for the SPV header engine.
#[derive(Debug, Error)]
pub enum SpvError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Header and chain validation errors.
///
/// Each consensus rule that a header can break has its own variant so that
/// a rejected batch can be attributed to the exact rule and height that
/// failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A wire record was not exactly 80 bytes.
    #[error("malformed header record: expected 80 bytes, got {actual}")]
    MalformedHeader { actual: usize },

    /// A header's prev_block_hash does not match the hash of its predecessor.
    #[error("header at height {height} does not link to its predecessor")]
    LinkageMismatch { height: u32 },

    /// A header's compact bits disagree with the retarget calculation.
    #[error("bits mismatch at height {height}: expected {expected:#010x}, got {actual:#010x}")]
    BitsMismatch { height: u32, expected: u32, actual: u32 },

    /// A header's hash is not below its required target.
    #[error("insufficient proof of work at height {height}")]
    ProofOfWorkInsufficient { height: u32 },

    /// An ancestor needed by the difficulty calculation was not available
    /// from the store or the candidate chain.
    #[error("missing header at height {height}")]
    MissingHeader { height: u32 },

    #[error("storage error during validation: {0}")]
    Storage(#[from] StorageError),
}

/// Header store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Raw chunk data whose length is not a multiple of the record size.
    #[error("misaligned chunk data: {len} bytes is not a multiple of 80")]
    MisalignedChunk { len: usize },
}

// StorageError carries io::Error, which is not PartialEq; validation tests
// compare variants with matches! where a storage cause is possible.
impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::MisalignedChunk { len: a }, Self::MisalignedChunk { len: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for StorageError {}

/// Peer interface errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The peer dropped the response channel without answering.
    #[error("peer {0} closed the response channel")]
    ResponseChannelClosed(PeerId),

    /// The peer answered with a response of the wrong kind.
    #[error("unexpected response from peer {0}")]
    UnexpectedResponse(PeerId),

    #[error("request to peer failed: {0}")]
    RequestFailed(String),
}

/// Synchronization errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("network failure: {0}")]
    Network(#[from] NetworkError),

    /// The local chain and the peer's chain disagree about an already
    /// stored header. The store has been rolled back to the last chunk
    /// boundary by the time this is returned.
    #[error("fork detected at height {height}")]
    ForkDetected { height: u32 },

    /// Chunk retries walked below index zero; this sync attempt failed.
    #[error("chunk sync exhausted retries")]
    ChunkExhausted,

    /// The peer reported that it has no header at the requested height.
    #[error("peer has no header at height {height}")]
    HeaderUnavailable { height: u32 },

    /// Shutdown was requested while a sync operation was in progress.
    #[error("sync stopped")]
    Stopped,
}

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("subscriber initialization failed: {0}")]
    SubscriberInit(String),
}

/// Result alias using [`SpvError`].
pub type Result<T> = std::result::Result<T, SpvError>;

/// Result alias for validation operations.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result alias for network operations.
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

/// Result alias for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
