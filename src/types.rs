//! Common type definitions for the SPV header engine.

use crate::chain::Header;
use crate::network::PeerId;

/// A header together with its out-of-band height.
///
/// The wire form of a header does not carry a height; peers attach one when
/// announcing a tip or answering a `get_header` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedHeader {
    pub height: u32,
    pub header: Header,
}

/// A transient, contiguous candidate chain under verification.
///
/// Headers are ordered by height starting at `start_height`. The chain is
/// owned by the verification pass that builds it and is either persisted as
/// a whole or dropped; it also serves as the difficulty engine's fallback
/// source for heights that are not yet in the store.
#[derive(Debug, Clone, Default)]
pub struct HeaderChain {
    start_height: u32,
    headers: Vec<Header>,
}

impl HeaderChain {
    pub fn new(start_height: u32) -> Self {
        Self {
            start_height,
            headers: Vec::new(),
        }
    }

    pub fn from_headers(start_height: u32, headers: Vec<Header>) -> Self {
        Self {
            start_height,
            headers,
        }
    }

    pub fn start_height(&self) -> u32 {
        self.start_height
    }

    /// Height of the last header, if any.
    pub fn tip_height(&self) -> Option<u32> {
        if self.headers.is_empty() {
            None
        } else {
            Some(self.start_height + self.headers.len() as u32 - 1)
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Append the next header in height order.
    pub fn push(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Look up a header by absolute height.
    pub fn header_at(&self, height: u32) -> Option<&Header> {
        if height < self.start_height {
            return None;
        }
        self.headers.get((height - self.start_height) as usize)
    }

    /// Iterate `(height, header)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Header)> {
        let start = self.start_height;
        self.headers.iter().enumerate().map(move |(i, h)| (start + i as u32, h))
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }
}

/// Events emitted by the sync worker for the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpvEvent {
    /// The local chain was extended to a new best height after a
    /// successfully verified announcement from `peer`.
    NewBestHeight { height: u32, peer: PeerId },
    /// A reorg was detected and the store was rolled back to the last chunk
    /// boundary. `tip_height` is the tip after truncation.
    Reorg { tip_height: Option<u32> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BlockHash;

    fn dummy_header(nonce: u32) -> Header {
        Header {
            version: 2,
            prev_block_hash: BlockHash::ZERO,
            merkle_root: [0; 32],
            timestamp: 0,
            bits: 0x1e0ffff0,
            nonce,
        }
    }

    #[test]
    fn header_chain_lookup() {
        let mut chain = HeaderChain::new(100);
        assert!(chain.is_empty());
        assert_eq!(chain.tip_height(), None);

        for nonce in 0..5 {
            chain.push(dummy_header(nonce));
        }

        assert_eq!(chain.len(), 5);
        assert_eq!(chain.tip_height(), Some(104));
        assert_eq!(chain.header_at(100).unwrap().nonce, 0);
        assert_eq!(chain.header_at(104).unwrap().nonce, 4);
        assert!(chain.header_at(99).is_none());
        assert!(chain.header_at(105).is_none());

        let heights: Vec<u32> = chain.iter().map(|(h, _)| h).collect();
        assert_eq!(heights, vec![100, 101, 102, 103, 104]);
    }
}
