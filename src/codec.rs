//! # Binary Codec
//!
//! Self-describing encoding primitives used by `did:key`: unsigned varints
//! carrying multicodec identifiers, and multibase strings carrying a
//! single-character base prefix.

pub mod varint;

pub use multibase::Base;

use crate::error::{tracerr, Error};

/// Multibase-encode `bytes` using `base`, prefixing the base-indicator
/// character.
#[must_use]
pub fn multibase_encode(base: Base, bytes: impl AsRef<[u8]>) -> String {
    multibase::encode(base, bytes)
}

/// Strip and validate the multibase prefix of `input`, returning the base
/// used and the decoded bytes.
///
/// # Errors
///
/// Returns [`Error::UnsupportedBase`] when the prefix character is not a known
/// base and [`Error::MalformedInput`] when the remainder is not valid for the
/// indicated base.
pub fn multibase_decode(input: &str) -> crate::Result<(Base, Vec<u8>)> {
    match multibase::decode(input) {
        Ok(decoded) => Ok(decoded),
        Err(multibase::Error::UnknownBase(code)) => {
            tracerr!(Error::UnsupportedBase, "unknown multibase prefix '{code}'")
        }
        Err(e) => tracerr!(Error::MalformedInput, "invalid multibase string: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58btc() {
        let bytes = [0xed, 0x01, 0x3b, 0x6a, 0x27, 0xbc];
        let encoded = multibase_encode(Base::Base58Btc, bytes);
        assert!(encoded.starts_with('z'));

        let (base, decoded) = multibase_decode(&encoded).expect("should decode");
        assert_eq!(base, Base::Base58Btc);
        assert_eq!(decoded, bytes);
    }

    // Every public key length up to an uncompressed P-256 point, with and
    // without leading zero bytes, which base58 encodes as '1's.
    #[test]
    fn base58btc_any_length() {
        for len in 0..=65_u8 {
            let key: Vec<u8> = (0..len).map(|i| i.wrapping_mul(37).wrapping_add(len)).collect();
            for zeros in [0, 1, 3] {
                let mut bytes = vec![0_u8; zeros];
                bytes.extend_from_slice(&key);

                let encoded = multibase_encode(Base::Base58Btc, &bytes);
                let decoded = multibase_decode(&encoded).expect("should decode");
                assert_eq!(decoded, (Base::Base58Btc, bytes), "{encoded}");
            }
        }
    }

    #[test]
    fn empty() {
        assert_eq!(multibase_encode(Base::Base58Btc, b""), "z");
        assert_eq!(multibase_decode("z").expect("should decode"), (Base::Base58Btc, vec![]));
    }

    #[test]
    fn unknown_prefix() {
        let err = multibase_decode("?abc").expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedBase(_)));
    }

    #[test]
    fn bad_alphabet() {
        // '0' is not in the base58btc alphabet
        let err = multibase_decode("z0OIl").expect_err("should fail");
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
