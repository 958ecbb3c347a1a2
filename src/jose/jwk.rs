//! Public JSON Web Keys.

use std::collections::BTreeMap;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Curve, KeyType};
use crate::error::{tracerr, Error};

/// Public key in JWK format. Private parameters are never carried.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve.
    pub crv: Curve,

    /// X coordinate (or the whole public key for OKP keys).
    pub x: String,

    /// Y coordinate. EC keys only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl PublicKeyJwk {
    /// RFC 7638 thumbprint: base64url SHA-256 of the key's required members,
    /// serialized in lexicographic order without whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if an EC key is missing its `y` coordinate.
    pub fn thumbprint(&self) -> crate::Result<String> {
        let crv = self.crv.to_string();
        let kty = self.kty.to_string();

        let mut members = BTreeMap::from([("crv", crv.as_str()), ("kty", kty.as_str())]);
        members.insert("x", &self.x);
        if self.kty == KeyType::Ec {
            let Some(y) = &self.y else {
                tracerr!(Error::InvalidPublicKey, "EC key is missing the y coordinate");
            };
            members.insert("y", y);
        }

        let canonical = serde_json::to_vec(&members)?;
        Ok(Base64UrlUnpadded::encode_string(&Sha256::digest(canonical)))
    }

    /// Decode a base64url coordinate.
    pub(crate) fn decode_coord(coord: &str) -> crate::Result<Vec<u8>> {
        match Base64UrlUnpadded::decode_vec(coord) {
            Ok(bytes) => Ok(bytes),
            Err(e) => tracerr!(Error::InvalidPublicKey, "invalid coordinate encoding: {e}"),
        }
    }
}
