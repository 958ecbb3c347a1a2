use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use super::KeyGenerator;
use crate::error::{tracerr, Error};
use crate::jose::{Algorithm, Curve, KeyType, PublicKeyJwk};

/// Multicodec `ed25519-pub`.
const ED25519_PUB: u64 = 0xed;

/// Ed25519 keys signing with `EdDSA`. Public keys are the raw 32 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519;

impl Ed25519 {
    fn signing_key(secret: &[u8]) -> crate::Result<SigningKey> {
        let Ok(bytes) = <[u8; 32]>::try_from(secret) else {
            tracerr!(Error::InvalidArgument, "Ed25519 secret key must be 32 bytes");
        };
        Ok(SigningKey::from_bytes(&bytes))
    }

    fn verifying_key(bytes: &[u8]) -> crate::Result<VerifyingKey> {
        let Ok(bytes) = <[u8; 32]>::try_from(bytes) else {
            tracerr!(
                Error::InvalidPublicKey,
                "Ed25519 public key must be 32 bytes, got {}",
                bytes.len()
            );
        };
        match VerifyingKey::from_bytes(&bytes) {
            Ok(key) => Ok(key),
            Err(e) => tracerr!(Error::InvalidPublicKey, "invalid Ed25519 public key: {e}"),
        }
    }

    fn jwk(key: &VerifyingKey) -> PublicKeyJwk {
        PublicKeyJwk {
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: Base64UrlUnpadded::encode_string(key.as_bytes()),
            y: None,
        }
    }
}

impl KeyGenerator for Ed25519 {
    fn curve(&self) -> Curve {
        Curve::Ed25519
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDSA
    }

    fn multicodec(&self) -> u64 {
        ED25519_PUB
    }

    fn generate(&self) -> Vec<u8> {
        SigningKey::generate(&mut OsRng).to_bytes().to_vec()
    }

    fn public_key(&self, secret: &[u8]) -> crate::Result<PublicKeyJwk> {
        Ok(Self::jwk(&Self::signing_key(secret)?.verifying_key()))
    }

    fn public_key_to_bytes(&self, jwk: &PublicKeyJwk) -> crate::Result<Vec<u8>> {
        if jwk.kty != KeyType::Okp || jwk.crv != Curve::Ed25519 {
            tracerr!(Error::InvalidPublicKey, "expected an OKP Ed25519 key");
        }
        let x = PublicKeyJwk::decode_coord(&jwk.x)?;
        Ok(Self::verifying_key(&x)?.to_bytes().to_vec())
    }

    fn bytes_to_public_key(&self, bytes: &[u8]) -> crate::Result<PublicKeyJwk> {
        Ok(Self::jwk(&Self::verifying_key(bytes)?))
    }

    fn sign(&self, secret: &[u8], payload: &[u8]) -> crate::Result<Vec<u8>> {
        let signature: Signature = Self::signing_key(secret)?.sign(payload);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, jwk: &PublicKeyJwk, payload: &[u8], signature: &[u8]) -> crate::Result<()> {
        let bytes = self.public_key_to_bytes(jwk)?;
        let key = Self::verifying_key(&bytes)?;

        let Ok(signature) = Signature::from_slice(signature) else {
            tracerr!(
                Error::Signature,
                "Signature verification failed: malformed Ed25519 signature"
            );
        };
        if let Err(e) = key.verify(payload, &signature) {
            tracerr!(Error::Signature, "Signature verification failed: {e}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_HEX: [u8; 32] = [
        0x3b, 0x6a, 0x27, 0xbc, 0xce, 0xb6, 0xa4, 0x2d, 0x62, 0xa3, 0xa8, 0xd0, 0x2a, 0x6f, 0x0d,
        0x73, 0x65, 0x32, 0x15, 0x77, 0x1d, 0xe2, 0x43, 0xa6, 0x3a, 0xc0, 0x48, 0xa1, 0x8b, 0x59,
        0xda, 0x29,
    ];

    #[test]
    fn known_key() {
        let jwk = Ed25519.bytes_to_public_key(&PUBLIC_HEX).expect("valid key");
        assert_eq!(jwk.x, "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik");
        assert_eq!(Ed25519.public_key_to_bytes(&jwk).expect("should encode"), PUBLIC_HEX);
    }

    #[test]
    fn wrong_length() {
        let err = Ed25519.bytes_to_public_key(&PUBLIC_HEX[..31]).expect_err("should fail");
        assert!(matches!(err, Error::InvalidPublicKey(_)));
    }
}
