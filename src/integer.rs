//! Minimal two's-complement integers.
//!
//! A signed integer is written big-endian in the fewest bytes that still sign-extend back to the
//! same value, optionally padded to a caller-chosen minimum width. Integer arrays use the padding
//! to give every element the width of the widest one.

use crate::error::{DecodeError, DecodeResult};

/// Widest possible encoding of an `i64`.
pub const MAX_INT_WIDTH: usize = 8;

/// Append the minimal encoding of `value` to `buf`, using at least `min_len` bytes, and return the
/// number of bytes written.
///
/// `min_len` is clamped to `1..=8`.
pub fn encode_minimal(value: i64, min_len: usize, buf: &mut Vec<u8>) -> usize {
    let min_len = min_len.clamp(1, MAX_INT_WIDTH);
    let mut enc = [0u8; MAX_INT_WIDTH];
    let mut len = 0;
    let mut remain = value;
    while len < MAX_INT_WIDTH {
        enc[len] = remain as u8;
        len += 1;
        remain >>= 8;
        let high_bit = enc[len - 1] & 0x80 != 0;
        let sign_extends = (remain == 0 && !high_bit) || (remain == -1 && high_bit);
        if len >= min_len && sign_extends {
            break;
        }
    }
    enc[..len].reverse();
    buf.extend_from_slice(&enc[..len]);
    len
}

/// Length of the minimal encoding of `value`, with no padding.
pub fn minimal_len(value: i64) -> usize {
    let redundant = if value < 0 {
        value.leading_ones()
    } else {
        value.leading_zeros()
    };
    // One sign bit has to survive.
    let bits = 64 - redundant as usize + 1;
    ((bits + 7) / 8).clamp(1, MAX_INT_WIDTH)
}

/// Parse a big-endian two's-complement integer of 1 to 8 bytes.
pub fn decode_minimal(bytes: &[u8]) -> DecodeResult<i64> {
    let (&first, rest) = bytes
        .split_first()
        .ok_or(DecodeError::InvalidIntegerWidth(0))?;
    if bytes.len() > MAX_INT_WIDTH {
        return Err(DecodeError::InvalidIntegerWidth(bytes.len()));
    }
    let mut v = first as i8 as i64;
    for &b in rest {
        v = (v << 8) | b as i64;
    }
    Ok(v)
}
