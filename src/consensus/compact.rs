//! Compact-bits target encoding.
//!
//! A compact value packs a 256-bit target into `exponent (1 byte) |
//! mantissa (3 bytes)`, where `target = mantissa * 256^(exponent - 3)`. The
//! encoding is lossy for arbitrary targets but stable for targets the
//! retarget algorithms themselves produce.

use primitive_types::{U256, U512};

/// Expand a compact value into the full 256-bit target.
///
/// A mantissa below 0x8000 is shifted up one byte without adjusting the
/// exponent, mirroring the historic client's normalization.
pub fn bits_to_target(bits: u32) -> U256 {
    let exponent = bits >> 24;
    let mut mantissa = U256::from(bits & 0x00ff_ffff);
    if mantissa < U256::from(0x8000u32) {
        mantissa <<= 8;
    }
    if exponent >= 3 {
        mantissa << (8 * (exponent - 3) as usize)
    } else {
        mantissa >> (8 * (3 - exponent) as usize)
    }
}

/// Derive the compact encoding of a target.
///
/// The top byte of the target is ignored (all real targets are below
/// 2^248); the mantissa is renormalized down when its high bit is set so
/// the encoding never reads as negative.
pub fn target_to_bits(target: U256) -> u32 {
    let mut be = [0u8; 32];
    target.to_big_endian(&mut be);

    let mut exponent: u32 = 31;
    let mut pos = 1usize;
    while pos < 31 && be[pos] == 0 {
        pos += 1;
        exponent -= 1;
    }

    let take = (32 - pos).min(3);
    let mut mantissa: u32 = 0;
    for &byte in &be[pos..pos + take] {
        mantissa = (mantissa << 8) | byte as u32;
    }

    if mantissa >= 0x0080_0000 {
        mantissa >>= 8;
        exponent += 1;
    }

    (exponent << 24) | mantissa
}

/// `last * actual / timespan`, computed in 512 bits and capped at `max`.
pub(crate) fn retarget(last: U256, actual: u64, timespan: u64, max: U256) -> U256 {
    let wide = last.full_mul(U256::from(actual));
    let quotient = wide / U512::from(timespan);
    if quotient >= U512::from(max) {
        max
    } else {
        U256::try_from(quotient).unwrap_or(max)
    }
}
