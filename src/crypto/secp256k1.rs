use base64ct::{Base64UrlUnpadded, Encoding};
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use super::KeyGenerator;
use crate::error::{tracerr, Error};
use crate::jose::{Algorithm, Curve, KeyType, PublicKeyJwk};

/// Multicodec `secp256k1-pub`.
const SECP256K1_PUB: u64 = 0xe7;

/// SEC1 tag for an uncompressed point.
const UNCOMPRESSED: u8 = 0x04;

/// secp256k1 keys signing with `ES256K`. Public keys are 33-byte compressed
/// SEC1 points; signatures are 64-byte `r || s`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1;

impl Secp256k1 {
    fn signing_key(secret: &[u8]) -> crate::Result<SigningKey> {
        match SigningKey::from_slice(secret) {
            Ok(key) => Ok(key),
            Err(e) => tracerr!(Error::InvalidArgument, "invalid secp256k1 secret key: {e}"),
        }
    }

    fn verifying_key(sec1: &[u8]) -> crate::Result<VerifyingKey> {
        match VerifyingKey::from_sec1_bytes(sec1) {
            Ok(key) => Ok(key),
            Err(e) => tracerr!(Error::InvalidPublicKey, "invalid secp256k1 public key: {e}"),
        }
    }

    fn jwk(key: &VerifyingKey) -> crate::Result<PublicKeyJwk> {
        let point = key.to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            tracerr!(Error::InvalidPublicKey, "secp256k1 public key is the identity point");
        };
        Ok(PublicKeyJwk {
            kty: KeyType::Ec,
            crv: Curve::Secp256k1,
            x: Base64UrlUnpadded::encode_string(x),
            y: Some(Base64UrlUnpadded::encode_string(y)),
        })
    }

    fn from_jwk(jwk: &PublicKeyJwk) -> crate::Result<VerifyingKey> {
        if jwk.kty != KeyType::Ec || jwk.crv != Curve::Secp256k1 {
            tracerr!(Error::InvalidPublicKey, "expected an EC secp256k1 key");
        }
        let Some(y) = &jwk.y else {
            tracerr!(Error::InvalidPublicKey, "missing y coordinate");
        };
        let x = PublicKeyJwk::decode_coord(&jwk.x)?;
        let y = PublicKeyJwk::decode_coord(y)?;
        if x.len() != 32 || y.len() != 32 {
            tracerr!(Error::InvalidPublicKey, "coordinates must be 32 bytes");
        }

        let mut sec1 = Vec::with_capacity(65);
        sec1.push(UNCOMPRESSED);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);
        Self::verifying_key(&sec1)
    }
}

impl KeyGenerator for Secp256k1 {
    fn curve(&self) -> Curve {
        Curve::Secp256k1
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::ES256K
    }

    fn multicodec(&self) -> u64 {
        SECP256K1_PUB
    }

    fn generate(&self) -> Vec<u8> {
        SigningKey::random(&mut OsRng).to_bytes().to_vec()
    }

    fn public_key(&self, secret: &[u8]) -> crate::Result<PublicKeyJwk> {
        Self::jwk(Self::signing_key(secret)?.verifying_key())
    }

    fn public_key_to_bytes(&self, jwk: &PublicKeyJwk) -> crate::Result<Vec<u8>> {
        let key = Self::from_jwk(jwk)?;
        Ok(key.to_encoded_point(true).as_bytes().to_vec())
    }

    fn bytes_to_public_key(&self, bytes: &[u8]) -> crate::Result<PublicKeyJwk> {
        if bytes.len() != 33 {
            tracerr!(
                Error::InvalidPublicKey,
                "secp256k1 public key must be 33 bytes, got {}",
                bytes.len()
            );
        }
        Self::jwk(&Self::verifying_key(bytes)?)
    }

    fn sign(&self, secret: &[u8], payload: &[u8]) -> crate::Result<Vec<u8>> {
        let signature: Signature = Self::signing_key(secret)?.sign(payload);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, jwk: &PublicKeyJwk, payload: &[u8], signature: &[u8]) -> crate::Result<()> {
        let key = Self::from_jwk(jwk)?;

        let Ok(signature) = Signature::from_slice(signature) else {
            tracerr!(Error::Signature, "Signature verification failed: malformed ES256K signature");
        };
        if let Err(e) = key.verify(payload, &signature) {
            tracerr!(Error::Signature, "Signature verification failed: {e}");
        }
        Ok(())
    }
}
