//! Difficulty retargeting.
//!
//! Two algorithms, selected purely by height: below the DGW activation
//! height, a windowed averaging retarget that only adjusts every interval;
//! at and above it, a DGW3-style dampened moving average over a fixed
//! look-back window.

use std::sync::Arc;

use primitive_types::U256;

use crate::chain::Header;
use crate::consensus::{compact, ChainParams};
use crate::error::{ValidationError, ValidationResult};
use crate::storage::HeaderStore;
use crate::types::HeaderChain;

/// Computes the expected compact bits and full target for any height.
///
/// Reads ancestors from the header store first and falls back to an
/// optional in-memory candidate chain for heights that are not yet
/// persisted.
#[derive(Clone)]
pub struct DifficultyEngine {
    store: Arc<HeaderStore>,
    params: ChainParams,
}

impl DifficultyEngine {
    pub fn new(store: Arc<HeaderStore>, params: ChainParams) -> Self {
        Self {
            store,
            params,
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Expected `(bits, target)` for a header at `height`.
    pub fn get_target(
        &self,
        height: u32,
        chain: Option<&HeaderChain>,
    ) -> ValidationResult<(u32, U256)> {
        if height >= self.params.dgw_activation_height {
            self.target_dgw3(height, chain)
        } else {
            self.target_v1(height, chain)
        }
    }

    /// Windowed averaging retarget (heights below DGW activation).
    fn target_v1(
        &self,
        height: u32,
        chain: Option<&HeaderChain>,
    ) -> ValidationResult<(u32, U256)> {
        let p = &self.params;

        if height == 0 {
            return Ok((p.genesis_bits, compact::bits_to_target(p.genesis_bits)));
        }
        if height < p.averaging_window() {
            return Ok((p.start_bits, compact::bits_to_target(p.start_bits)));
        }

        // Difficulty only changes on interval boundaries; other heights
        // inherit the last boundary's result. Walked down iteratively to
        // stay bounded at any height. The boundary never drops below the
        // averaging window because the window is a whole number of
        // intervals.
        let mut boundary = height;
        while boundary % p.retarget_interval() != 0 {
            boundary -= 1;
        }

        let last = self.expect_header(boundary - 1, chain)?;
        let first = self.expect_header(boundary - p.averaging_window(), chain)?;

        let actual = (last.timestamp as i64 - first.timestamp as i64)
            .clamp(p.min_actual_timespan() as i64, p.max_actual_timespan() as i64);

        let new_target = compact::retarget(
            compact::bits_to_target(last.bits),
            actual as u64,
            p.averaging_timespan() as u64,
            p.max_target,
        );
        Ok((compact::target_to_bits(new_target), new_target))
    }

    /// DGW3 dampened moving-average retarget (heights at or above
    /// activation).
    fn target_dgw3(
        &self,
        height: u32,
        chain: Option<&HeaderChain>,
    ) -> ValidationResult<(u32, U256)> {
        let p = &self.params;

        let last = self.header_at(height - 1, chain)?;
        let Some(last) = last else {
            return Ok((p.genesis_bits, p.max_target));
        };
        if height - 1 < p.dgw_past_blocks {
            return Ok((p.genesis_bits, p.max_target));
        }

        let mut reading = last;
        let mut average = U256::zero();
        let mut actual_timespan: i64 = 0;
        let mut last_block_time: i64 = 0;

        for count in 1..=p.dgw_past_blocks {
            // Running average of per-block targets, weighted as in the
            // original: ((avg * n) + next) / (n + 1).
            let target = compact::bits_to_target(reading.bits);
            if count == 1 {
                average = target;
            } else {
                average = (average * U256::from(count) + target) / U256::from(count + 1);
            }

            if last_block_time > 0 {
                actual_timespan += last_block_time - reading.timestamp as i64;
            }
            last_block_time = reading.timestamp as i64;

            if count < p.dgw_past_blocks {
                reading = self.expect_header(height - 1 - count, chain)?;
            }
        }

        let target_timespan = (p.dgw_past_blocks * p.target_spacing) as i64;
        let actual = actual_timespan.clamp(target_timespan / 3, target_timespan * 3);

        let new_target = compact::retarget(
            average,
            actual as u64,
            target_timespan as u64,
            p.max_target,
        );
        Ok((compact::target_to_bits(new_target), new_target))
    }

    /// Stored header at `height`, or the candidate chain's if not persisted.
    fn header_at(
        &self,
        height: u32,
        chain: Option<&HeaderChain>,
    ) -> ValidationResult<Option<Header>> {
        if let Some(header) = self.store.read(height)? {
            return Ok(Some(header));
        }
        Ok(chain.and_then(|c| c.header_at(height)).copied())
    }

    fn expect_header(
        &self,
        height: u32,
        chain: Option<&HeaderChain>,
    ) -> ValidationResult<Header> {
        self.header_at(height, chain)?.ok_or(ValidationError::MissingHeader {
            height,
        })
    }
}
