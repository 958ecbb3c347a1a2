//! # Crypto Registry
//!
//! A static, read-only table of the curves this crate can create, resolve,
//! sign and verify with. Each entry knows its multicodec identifier, how to
//! convert public keys between JWK and the fixed-length byte form embedded in
//! `did:key` identifiers, and which JWS algorithm it implies.

mod ed25519;
mod secp256k1;

pub use self::ed25519::Ed25519;
pub use self::secp256k1::Secp256k1;
use crate::codec::{self, varint, Base};
use crate::error::{tracerr, Error};
use crate::jose::{Algorithm, Curve, PublicKeyJwk};

/// Key generation, encoding, signing and verification for a single curve.
pub trait KeyGenerator: Send + Sync {
    /// The curve this generator handles.
    fn curve(&self) -> Curve;

    /// The JWS algorithm implied by the curve.
    fn algorithm(&self) -> Algorithm;

    /// Multicodec identifier of the curve's public key encoding.
    fn multicodec(&self) -> u64;

    /// Generate new secret key bytes.
    fn generate(&self) -> Vec<u8>;

    /// Derive the public key for `secret`.
    ///
    /// # Errors
    ///
    /// Returns an error if `secret` is not a valid secret key for the curve.
    fn public_key(&self, secret: &[u8]) -> crate::Result<PublicKeyJwk>;

    /// Encode a public key as the curve's fixed-length byte form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK is not a valid key on this curve.
    fn public_key_to_bytes(&self, jwk: &PublicKeyJwk) -> crate::Result<Vec<u8>>;

    /// Decode the curve's fixed-length byte form into a JWK.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid encoded public key.
    fn bytes_to_public_key(&self, bytes: &[u8]) -> crate::Result<PublicKeyJwk>;

    /// Sign `payload` with `secret`.
    ///
    /// # Errors
    ///
    /// Returns an error if `secret` is not a valid secret key for the curve.
    fn sign(&self, secret: &[u8], payload: &[u8]) -> crate::Result<Vec<u8>>;

    /// Verify `signature` over `payload` with the public key `jwk`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signature`] when the signature does not match.
    fn verify(&self, jwk: &PublicKeyJwk, payload: &[u8], signature: &[u8]) -> crate::Result<()>;
}

static REGISTRY: [&dyn KeyGenerator; 2] = [&Ed25519, &Secp256k1];

/// Look up the generator for `curve`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCurve`] if the curve is not registered.
pub fn key_generator(curve: Curve) -> crate::Result<&'static dyn KeyGenerator> {
    match REGISTRY.iter().find(|g| g.curve() == curve) {
        Some(generator) => Ok(*generator),
        None => tracerr!(Error::UnsupportedCurve, "{curve} curve not supported"),
    }
}

/// Look up the generator for a multicodec identifier. Used when resolving
/// `did:key` identifiers.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCurve`] if no registered curve uses `codec`.
pub fn key_generator_for_codec(codec: u64) -> crate::Result<&'static dyn KeyGenerator> {
    match REGISTRY.iter().find(|g| g.multicodec() == codec) {
        Some(generator) => Ok(*generator),
        None => tracerr!(Error::UnsupportedCurve, "no curve registered for multicodec {codec:#x}"),
    }
}

/// Determine the curve to use for `alg`. When `curve` is given it must be the
/// curve the algorithm signs with.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCurve`] when `curve` contradicts `alg` or no
/// registered curve implements `alg`.
pub fn resolve_curve(alg: Algorithm, curve: Option<Curve>) -> crate::Result<Curve> {
    let found = REGISTRY
        .iter()
        .find(|g| g.algorithm() == alg && curve.map_or(true, |c| c == g.curve()));
    match (found, curve) {
        (Some(generator), _) => Ok(generator.curve()),
        (None, Some(curve)) => {
            tracerr!(Error::UnsupportedCurve, "{curve} curve not supported for {alg}")
        }
        (None, None) => tracerr!(Error::UnsupportedCurve, "no curve registered for {alg}"),
    }
}

/// Encode a public key as a multikey: the varint multicodec identifier of its
/// curve followed by the key bytes, multibase (base58btc) encoded.
///
/// # Errors
///
/// Returns an error if the key is not a valid key on a registered curve.
pub fn encode_multikey(jwk: &PublicKeyJwk) -> crate::Result<String> {
    let generator = key_generator(jwk.crv)?;
    let mut bytes = varint::encode(generator.multicodec());
    bytes.extend(generator.public_key_to_bytes(jwk)?);
    Ok(codec::multibase_encode(Base::Base58Btc, bytes))
}

/// Decode a multikey string into a JWK.
///
/// # Errors
///
/// Returns [`Error::UnsupportedBase`] for a base other than base58btc,
/// [`Error::MalformedInput`] for a truncated multicodec prefix,
/// [`Error::UnsupportedCurve`] for an unregistered multicodec, or
/// [`Error::InvalidPublicKey`] for invalid key bytes.
pub fn decode_multikey(multikey: &str) -> crate::Result<PublicKeyJwk> {
    let (base, bytes) = codec::multibase_decode(multikey)?;
    if base != Base::Base58Btc {
        tracerr!(Error::UnsupportedBase, "expected base58btc, got {base:?}");
    }
    let (code, read) = varint::decode(&bytes)?;
    key_generator_for_codec(code)?.bytes_to_public_key(&bytes[read..])
}

/// Verify `signature` over `payload` with `jwk`, dispatching on the key's
/// curve.
///
/// # Errors
///
/// Returns [`Error::Signature`] on mismatch, or an error if the curve is not
/// registered.
pub fn verify(jwk: &PublicKeyJwk, payload: &[u8], signature: &[u8]) -> crate::Result<()> {
    key_generator(jwk.crv)?.verify(jwk, payload, signature)
}
