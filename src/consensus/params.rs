//! Network consensus parameters.

use primitive_types::U256;

use super::compact;

/// Difficulty and chunk parameters for one network.
///
/// Heights below `dgw_activation_height` retarget with the windowed
/// averaging algorithm; heights at or above it use the DGW3 moving-average
/// algorithm.
#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    /// Compact bits of the genesis header (height 0).
    pub genesis_bits: u32,
    /// Compact bits used before one full averaging window exists.
    pub start_bits: u32,
    /// Ceiling for any retargeted difficulty (the easiest allowed target).
    pub max_target: U256,
    /// Intended seconds between blocks.
    pub target_spacing: u32,
    /// Seconds per retarget interval.
    pub target_timespan: u32,
    /// Averaging window length in retarget intervals.
    pub averaging_intervals: u32,
    /// Maximum difficulty increase per window, percent.
    pub max_adjust_up: u32,
    /// Maximum difficulty decrease per window, percent.
    pub max_adjust_down: u32,
    /// First height governed by the DGW3 retarget.
    pub dgw_activation_height: u32,
    /// DGW3 look-back window in blocks.
    pub dgw_past_blocks: u32,
    /// Number of headers in a bulk sync chunk.
    pub chunk_size: u32,
}

impl ChainParams {
    /// Mazacoin mainnet parameters.
    pub fn mazacoin() -> Self {
        Self {
            genesis_bits: 0x1e0ffff0,
            start_bits: 0x1d03ffff,
            max_target: compact::bits_to_target(0x1e0ffff0),
            target_spacing: 120,
            target_timespan: 480,
            averaging_intervals: 20,
            max_adjust_up: 15,
            max_adjust_down: 20,
            dgw_activation_height: 100_000,
            dgw_past_blocks: 24,
            chunk_size: 2016,
        }
    }

    /// Blocks per retarget interval.
    pub fn retarget_interval(&self) -> u32 {
        self.target_timespan / self.target_spacing
    }

    /// Averaging window length in blocks.
    pub fn averaging_window(&self) -> u32 {
        self.retarget_interval() * self.averaging_intervals
    }

    /// Intended seconds across one averaging window.
    pub fn averaging_timespan(&self) -> u32 {
        self.averaging_window() * self.target_spacing
    }

    /// Lower clamp for the measured window timespan.
    pub fn min_actual_timespan(&self) -> u32 {
        self.averaging_timespan() * (100 - self.max_adjust_up) / 100
    }

    /// Upper clamp for the measured window timespan.
    pub fn max_actual_timespan(&self) -> u32 {
        self.averaging_timespan() * (100 + self.max_adjust_down) / 100
    }
}
