use std::convert::TryFrom;

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::MAX_VARINT;

/// A variable-length unsigned integer of up to 42 bits, stored in its encoded form.
///
/// The run of high set bits in the lead byte gives the total length, and whatever bits remain in
/// the lead byte are the most significant bits of the value. Every continuation byte carries 6
/// bits. Continuation bytes have no marker bits, so decoding must start on a lead byte.
///
/// ```text
/// 0xxxxxxx                          7 bits
/// 110xxxxx + 1 continuation        11 bits
/// 1110xxxx + 2 continuations       16 bits
/// 11110xxx + 3 continuations       21 bits
/// 111110xx + 4 continuations       26 bits
/// 1111110x + 5 continuations       31 bits
/// 11111110 + 6 continuations       36 bits
/// 11111111 + 7 continuations       42 bits
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarInt {
    n: [u8; 8],
}

impl VarInt {
    /// Encode a value, failing if it needs more than 42 bits.
    pub fn new(i: u64) -> EncodeResult<VarInt> {
        let len = encoded_len(i)?;
        let mut n = [0u8; 8];
        if len == 1 {
            n[0] = i as u8;
            return Ok(VarInt { n });
        }
        let cont = len - 1;
        for (idx, byte) in n[1..len].iter_mut().enumerate() {
            let shift = 6 * (cont - 1 - idx);
            *byte = ((i >> shift) & 0x3F) as u8;
        }
        n[0] = lead_marker(len) | ((i >> (6 * cont)) as u8 & lead_mask(len));
        Ok(VarInt { n })
    }

    /// Total number of encoded bytes, lead byte included.
    pub fn len(&self) -> usize {
        // The lead byte was built by `new` or checked by `read`, so this can't fail.
        len_from_lead(self.n[0]).unwrap_or(1)
    }

    pub fn to_u64(self) -> u64 {
        let len = self.len();
        if len == 1 {
            return (self.n[0] & 0x7F) as u64;
        }
        let mut v = (self.n[0] & lead_mask(len)) as u64;
        for byte in &self.n[1..len] {
            v = (v << 6) | (byte & 0x3F) as u64;
        }
        v
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.n[..self.len()]
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }

    /// Read a VarInt from the front of `buf`, advancing it past the encoded bytes.
    pub fn read(buf: &mut &[u8]) -> DecodeResult<VarInt> {
        let (&lead, rest) = buf.split_first().ok_or(DecodeError::TruncatedBuffer {
            step: "decode VarInt lead byte",
            actual: 0,
            expected: 1,
        })?;
        let len = len_from_lead(lead).ok_or(DecodeError::InvalidLeadByte(lead))?;
        let cont = len - 1;
        if rest.len() < cont {
            return Err(DecodeError::TruncatedBuffer {
                step: "decode VarInt continuation bytes",
                actual: rest.len(),
                expected: cont,
            });
        }
        let mut n = [0u8; 8];
        n[0] = lead;
        n[1..len].copy_from_slice(&rest[..cont]);
        *buf = &rest[cont..];
        Ok(VarInt { n })
    }
}

impl TryFrom<u64> for VarInt {
    type Error = EncodeError;
    fn try_from(v: u64) -> EncodeResult<Self> {
        VarInt::new(v)
    }
}

impl TryFrom<i64> for VarInt {
    type Error = EncodeError;
    fn try_from(v: i64) -> EncodeResult<Self> {
        if v < 0 {
            return Err(EncodeError::NegativeId(v));
        }
        VarInt::new(v as u64)
    }
}

impl From<u8> for VarInt {
    fn from(n: u8) -> Self {
        let mut buf = [0u8; 8];
        if n < 0x80 {
            buf[0] = n;
        } else {
            buf[0] = 0xC0 | (n >> 6);
            buf[1] = n & 0x3F;
        }
        VarInt { n: buf }
    }
}

/// Number of bytes needed to encode `i`.
pub fn encoded_len(i: u64) -> EncodeResult<usize> {
    Ok(match i {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        0x400_0000..=0x7FFF_FFFF => 6,
        0x8000_0000..=0xF_FFFF_FFFF => 7,
        _ if i <= MAX_VARINT => 8,
        _ => return Err(EncodeError::ValueTooLarge(i)),
    })
}

/// Append the encoding of `i` to `buf`, returning the number of bytes written.
pub fn encode_varint(i: u64, buf: &mut Vec<u8>) -> EncodeResult<usize> {
    let v = VarInt::new(i)?;
    v.write(buf);
    Ok(v.len())
}

/// Decode a VarInt from `buf` starting at `*pos`, advancing `*pos` past it.
pub fn decode_varint(buf: &[u8], pos: &mut usize) -> DecodeResult<u64> {
    let mut data = buf.get(*pos..).unwrap_or(&[]);
    let v = VarInt::read(&mut data)?;
    *pos += v.len();
    Ok(v.to_u64())
}

fn len_from_lead(lead: u8) -> Option<usize> {
    match lead.leading_ones() {
        0 => Some(1),
        1 => None,
        n => Some(n as usize),
    }
}

// High-bit run for a multi-byte encoding of `len` bytes: 110..., 1110..., up to 0xFF.
fn lead_marker(len: usize) -> u8 {
    !0xFFu8.checked_shr(len as u32).unwrap_or(0)
}

// Value bits left in the lead byte after the marker and its terminating zero.
fn lead_mask(len: usize) -> u8 {
    0xFFu8.checked_shr(len as u32 + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn roundtrip(i: u64) -> usize {
        let mut buf = Vec::new();
        let len = encode_varint(i, &mut buf).unwrap();
        assert_eq!(len, buf.len());
        let mut pos = 0;
        let o = decode_varint(&buf, &mut pos).unwrap();
        assert_eq!(i, o, "VarInt should match");
        assert_eq!(pos, len);
        len
    }

    #[test]
    fn boundaries() {
        let cases: &[(u64, usize)] = &[
            (0, 1),
            (0x7F, 1),
            (0x80, 2),
            (0x7FF, 2),
            (0x800, 3),
            (0xFFFF, 3),
            (0x1_0000, 4),
            (0x1F_FFFF, 4),
            (0x20_0000, 5),
            (0x3FF_FFFF, 5),
            (0x400_0000, 6),
            (0x7FFF_FFFF, 6),
            (0x8000_0000, 7),
            (0xF_FFFF_FFFF, 7),
            (0x10_0000_0000, 8),
            (MAX_VARINT, 8),
        ];
        for &(i, len) in cases {
            assert_eq!(roundtrip(i), len, "Wrong length for 0x{:x}", i);
            assert_eq!(encoded_len(i).unwrap(), len);
        }
    }

    #[test]
    fn powers_of_two() {
        for s in 0..42 {
            roundtrip(1u64 << s);
            roundtrip((1u64 << s) - 1);
        }
    }

    #[test]
    fn random() {
        let mut rng = thread_rng();
        for _ in 0..10_000 {
            roundtrip(rng.gen_range(0..=MAX_VARINT));
        }
    }

    #[test]
    fn wire_bytes() {
        let cases: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (0x7F, vec![0x7F]),
            (0x80, vec![0xC2, 0x00]),
            (0xFFF, vec![0xE0, 0x3F, 0x3F]),
            (0x7FFF_FFFF, vec![0xFD, 0x3F, 0x3F, 0x3F, 0x3F, 0x3F]),
            (0x8000_0000, vec![0xFE, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]),
            (MAX_VARINT, vec![0xFF, 0x3F, 0x3F, 0x3F, 0x3F, 0x3F, 0x3F, 0x3F]),
        ];
        for (i, expected) in cases {
            let mut buf = Vec::new();
            encode_varint(i, &mut buf).unwrap();
            assert_eq!(buf, expected, "Encoding of 0x{:x}", i);
        }
    }

    #[test]
    fn too_large() {
        assert_eq!(
            VarInt::new(MAX_VARINT + 1),
            Err(EncodeError::ValueTooLarge(MAX_VARINT + 1))
        );
        assert!(VarInt::new(u64::MAX).is_err());
    }

    #[test]
    fn negative() {
        assert_eq!(VarInt::try_from(-1i64), Err(EncodeError::NegativeId(-1)));
        assert_eq!(VarInt::try_from(5i64).unwrap().to_u64(), 5);
    }

    #[test]
    fn from_u8() {
        for i in 0..=255u8 {
            assert_eq!(VarInt::from(i), VarInt::new(i as u64).unwrap());
        }
    }

    #[test]
    fn invalid_lead() {
        for lead in 0x80..=0xBFu8 {
            let data = [lead, 0, 0];
            let mut slice = &data[..];
            assert_eq!(VarInt::read(&mut slice), Err(DecodeError::InvalidLeadByte(lead)));
        }
    }

    #[test]
    fn not_enough_bytes() {
        let mut buf = Vec::new();
        encode_varint(MAX_VARINT, &mut buf).unwrap();
        for cut in 0..buf.len() {
            let mut pos = 0;
            let result = decode_varint(&buf[..cut], &mut pos);
            assert!(
                matches!(result, Err(DecodeError::TruncatedBuffer { .. })),
                "Truncating to {} bytes should fail",
                cut
            );
            assert_eq!(pos, 0);
        }
    }

    #[test]
    fn non_minimal_accepted() {
        // 5 encoded in two bytes
        let data = [0xC0, 0x05];
        let mut pos = 0;
        assert_eq!(decode_varint(&data, &mut pos).unwrap(), 5);
        assert_eq!(pos, 2);
    }
}
