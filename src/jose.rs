//! # JOSE
//!
//! The subset of JSON Object Signing and Encryption used by this crate:
//! public JWKs with RFC 7638 thumbprints, and compact JWS tokens.

mod jwk;
mod jws;

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use self::jwk::PublicKeyJwk;
pub use self::jws::{Jws, JwsHeader};
use crate::error::{tracerr, Error};

/// Elliptic curves supported for signing keys.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Curve {
    /// Edwards curve used by `EdDSA`.
    Ed25519,

    /// Koblitz curve used by `ES256K`.
    #[serde(rename = "secp256k1")]
    Secp256k1,
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

impl FromStr for Curve {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "Ed25519" => Ok(Self::Ed25519),
            "secp256k1" => Ok(Self::Secp256k1),
            _ => tracerr!(Error::UnsupportedCurve, "{s} curve not supported"),
        }
    }
}

/// JWS signing algorithms.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Edwards-curve signatures over Ed25519.
    #[default]
    EdDSA,

    /// ECDSA over secp256k1 with SHA-256.
    ES256K,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdDSA => write!(f, "EdDSA"),
            Self::ES256K => write!(f, "ES256K"),
        }
    }
}

/// JWK key type.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Octet key pair (Edwards curves).
    #[serde(rename = "OKP")]
    Okp,

    /// Elliptic curve (Weierstrass curves).
    #[serde(rename = "EC")]
    Ec,
}

impl Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Okp => write!(f, "OKP"),
            Self::Ec => write!(f, "EC"),
        }
    }
}
