//! # Key Management
//!
//! The [`KeyManager`] capability abstracts over private-key storage and
//! signing. Private key material never leaves a key manager through this
//! interface; callers hold only a [`KeyAlias`].
//!
//! Two variants are provided: [`InMemoryKeyManager`] keeps keys in process
//! memory, and [`RemoteKeyManager`] delegates to a key management service over
//! HTTP.

mod config;
mod memory;
mod remote;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub use self::config::KmsConfig;
pub use self::memory::InMemoryKeyManager;
pub use self::remote::RemoteKeyManager;
use crate::jose::{Algorithm, Curve, PublicKeyJwk};

/// Opaque handle to private key material held by a [`KeyManager`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct KeyAlias(String);

impl KeyAlias {
    /// Wrap an alias issued by a key manager.
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// The alias as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for KeyAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Private-key storage and signing.
///
/// Implementations must be safe to share between threads. Generation is only
/// complete once an alias is returned; a failed call leaves no key behind that
/// the caller could address.
pub trait KeyManager: Send + Sync {
    /// Generate a new private key for `alg`. When `curve` is omitted it is
    /// derived from the algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedCurve`] when `curve` contradicts
    /// `alg`, or a key-manager specific failure.
    fn generate_private_key(&self, alg: Algorithm, curve: Option<Curve>) -> crate::Result<KeyAlias>;

    /// Get the public key for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyNotFound`] for an unknown alias.
    fn get_public_key(&self, alias: &KeyAlias) -> crate::Result<PublicKeyJwk>;

    /// Sign `payload` with the key for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyNotFound`] for an unknown alias.
    fn sign(&self, alias: &KeyAlias, payload: &[u8]) -> crate::Result<Vec<u8>>;

    /// The alias under which the private key for `public_key` is stored. The
    /// default is the key's RFC 7638 thumbprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the thumbprint cannot be computed.
    fn get_deterministic_alias(&self, public_key: &PublicKeyJwk) -> crate::Result<KeyAlias> {
        Ok(KeyAlias(public_key.thumbprint()?))
    }
}
