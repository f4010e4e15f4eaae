//! Header wire format, hashing and candidate chain verification.

mod header;
mod verify;

pub use header::{BlockHash, Header, HEADER_SIZE};
pub use verify::ChainVerifier;
