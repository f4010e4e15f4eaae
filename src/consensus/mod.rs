//! Consensus rules: compact difficulty encoding, network parameters and the
//! two retarget algorithms.

pub mod compact;
mod difficulty;
mod params;

pub use difficulty::DifficultyEngine;
pub use params::ChainParams;
