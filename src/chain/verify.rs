//! Candidate chain verification.

use crate::chain::{BlockHash, Header};
use crate::consensus::DifficultyEngine;
use crate::error::{ValidationError, ValidationResult};
use crate::types::HeaderChain;

/// Validates an ordered candidate chain against linkage, difficulty and
/// proof-of-work rules.
#[derive(Clone)]
pub struct ChainVerifier {
    engine: DifficultyEngine,
}

impl ChainVerifier {
    pub fn new(engine: DifficultyEngine) -> Self {
        Self {
            engine,
        }
    }

    /// Verify every header of `chain` in order.
    ///
    /// `ancestor` is the stored predecessor of the chain's first header;
    /// `None` is only valid for a chain starting at height 0, whose first
    /// header must link to the all-zero hash. Any failure rejects the whole
    /// batch: callers must not persist any header from a chain that fails
    /// partway.
    pub fn verify(&self, chain: &HeaderChain, ancestor: Option<&Header>) -> ValidationResult<()> {
        let mut prev_hash = match ancestor {
            Some(header) => header.block_hash(),
            None if chain.start_height() == 0 => BlockHash::ZERO,
            None => {
                return Err(ValidationError::MissingHeader {
                    height: chain.start_height().saturating_sub(1),
                })
            }
        };

        for (height, header) in chain.iter() {
            let (bits, target) = self.engine.get_target(height, Some(chain))?;

            if header.prev_block_hash != prev_hash {
                return Err(ValidationError::LinkageMismatch {
                    height,
                });
            }
            if header.bits != bits {
                return Err(ValidationError::BitsMismatch {
                    height,
                    expected: bits,
                    actual: header.bits,
                });
            }
            let hash = header.block_hash();
            if hash.as_u256() >= target {
                return Err(ValidationError::ProofOfWorkInsufficient {
                    height,
                });
            }

            prev_hash = hash;
        }

        tracing::trace!(
            "verified candidate chain of {} headers ending at {:?}",
            chain.len(),
            chain.tip_height(),
        );
        Ok(())
    }
}
