//! Block header wire format and hashing.
//!
//! A header is a fixed 80-byte record: version, previous block hash, merkle
//! root, timestamp, compact difficulty bits and nonce. Integers are encoded
//! little-endian; the two 32-byte hashes are byte-reversed on the wire
//! relative to their display (big-endian hex) order.

use std::fmt;

use primitive_types::U256;
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Size of a serialized header record in bytes.
pub const HEADER_SIZE: usize = 80;

/// A block hash in display order (big-endian hex).
///
/// Interpreted as a big integer, this is also the value compared against the
/// proof-of-work target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// The all-zero hash, used as the previous hash of the genesis header.
    pub const ZERO: BlockHash = BlockHash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        BlockHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The hash interpreted as the proof-of-work comparison value.
    pub fn as_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub prev_block_hash: BlockHash,
    pub merkle_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl Header {
    /// Serialize to the 80-byte wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..36].copy_from_slice(&reverse32(self.prev_block_hash.0));
        buf[36..68].copy_from_slice(&reverse32(self.merkle_root));
        buf[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[72..76].copy_from_slice(&self.bits.to_le_bytes());
        buf[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// Deserialize from an 80-byte wire record.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ValidationError> {
        if data.len() != HEADER_SIZE {
            return Err(ValidationError::MalformedHeader { actual: data.len() });
        }
        let mut prev = [0u8; 32];
        prev.copy_from_slice(&data[4..36]);
        let mut merkle = [0u8; 32];
        merkle.copy_from_slice(&data[36..68]);
        Ok(Header {
            version: le_u32(&data[0..4]),
            prev_block_hash: BlockHash(reverse32(prev)),
            merkle_root: reverse32(merkle),
            timestamp: le_u32(&data[68..72]),
            bits: le_u32(&data[72..76]),
            nonce: le_u32(&data[76..80]),
        })
    }

    /// The header's identity: double SHA-256 over the wire form, presented
    /// in display order.
    pub fn block_hash(&self) -> BlockHash {
        let first = Sha256::digest(self.to_bytes());
        let second = Sha256::digest(first);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&second);
        BlockHash(reverse32(bytes))
    }
}

fn reverse32(mut bytes: [u8; 32]) -> [u8; 32] {
    bytes.reverse();
    bytes
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
