//! Unsigned variable-length integers, as used for multicodec identifiers.
//!
//! Values are written as little-endian groups of 7 bits, with the most
//! significant bit of every byte except the last set to signal continuation.

use crate::error::{tracerr, Error};

/// Bitmask for the 7 least significant bits.
const LSB_7: u8 = 0x7f;
/// Bitmask for the continuation bit.
const MSB: u8 = 0x80;
/// A `u64` needs at most 10 groups of 7 bits.
const MAX_LEN: usize = 10;

/// Encode `value` as a varint.
#[must_use]
pub fn encode(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEN);
    let mut rest = value;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let group = (rest as u8) & LSB_7;
        rest >>= 7;
        if rest == 0 {
            out.push(group);
            return out;
        }
        out.push(group | MSB);
    }
}

/// Decode a varint from the start of `bytes`, returning the value and the
/// number of bytes consumed.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if `bytes` ends before a terminating byte
/// or the encoded value does not fit into a `u64`.
pub fn decode(bytes: &[u8]) -> crate::Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, byte) in bytes.iter().enumerate() {
        if i >= MAX_LEN {
            break;
        }
        let group = u64::from(byte & LSB_7);
        let shift = 7 * i as u32;
        if i == MAX_LEN - 1 && group > 1 {
            tracerr!(Error::MalformedInput, "varint overflows u64");
        }
        value |= group << shift;

        if byte & MSB == 0 {
            return Ok((value, i + 1));
        }
    }

    if bytes.len() >= MAX_LEN {
        tracerr!(Error::MalformedInput, "varint overflows u64");
    }
    tracerr!(Error::MalformedInput, "varint ended before a terminating byte")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        // https://github.com/multiformats/unsigned-varint
        let cases: [(u64, &[u8]); 11] = [
            (0x00, &[0x00]),
            (0x01, &[0x01]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0x81, &[0x81, 0x01]),
            (0xff, &[0xff, 0x01]),
            (0x012c, &[0xac, 0x02]),
            (0xed, &[0xed, 0x01]),   // ed25519-pub
            (0xec, &[0xec, 0x01]),   // x25519-pub
            (0x1200, &[0x80, 0x24]), // p256-pub
            (0xe7, &[0xe7, 0x01]),   // secp256k1-pub
        ];

        for (value, bytes) in cases {
            assert_eq!(encode(value), bytes);
            assert_eq!(decode(bytes).expect("should decode"), (value, bytes.len()));
        }
    }

    #[test]
    fn trailing_bytes() {
        let (value, read) = decode(&[0xed, 0x01, 0x3b, 0x6a]).expect("should decode");
        assert_eq!(value, 0xed);
        assert_eq!(read, 2);
    }

    // The multicodec table fits in two varint bytes.
    #[test]
    fn multicodec_range() {
        for code in 0..=0x3fff_u64 {
            let bytes = encode(code);
            assert_eq!(bytes.len(), if code < 0x80 { 1 } else { 2 });
            assert_eq!(decode(&bytes).expect("should decode"), (code, bytes.len()));
        }
    }

    #[test]
    fn round_trip_extremes() {
        for value in [0, 1 << 7, 1 << 14, 1 << 35, u64::MAX >> 1, u64::MAX] {
            let bytes = encode(value);
            assert_eq!(decode(&bytes).expect("should decode"), (value, bytes.len()));
        }
    }

    #[test]
    fn missing_terminator() {
        let err = decode(&[0x80]).expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));

        let err = decode(&[]).expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn overflow() {
        let err = decode(&[0xff; 11]).expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));

        let mut too_big = vec![0xff; 9];
        too_big.push(0x02);
        let err = decode(&too_big).expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
