use std::sync::Arc;

use dashmap::DashMap;

use super::{KeyAlias, KeyManager};
use crate::crypto;
use crate::error::{tracerr, Error};
use crate::jose::{Algorithm, Curve, PublicKeyJwk};

/// A stored key. Immutable once inserted.
#[derive(Debug)]
struct KeyPair {
    curve: Curve,
    secret: Vec<u8>,
    public: PublicKeyJwk,
}

/// Key manager holding private keys in process memory.
///
/// Keys are stored under their JWK thumbprint in a sharded concurrent map, so
/// concurrent reads of distinct aliases do not contend. Cloning shares the
/// underlying store.
#[derive(Clone, Debug, Default)]
pub struct InMemoryKeyManager {
    keys: Arc<DashMap<KeyAlias, Arc<KeyPair>>>,
}

impl InMemoryKeyManager {
    /// Create an empty key manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Import existing secret key bytes for `curve`, returning the alias the
    /// key is stored under.
    ///
    /// # Errors
    ///
    /// Returns an error if `secret` is not a valid key for the curve.
    pub fn import_private_key(&self, curve: Curve, secret: &[u8]) -> crate::Result<KeyAlias> {
        let public = crypto::key_generator(curve)?.public_key(secret)?;
        let alias = self.get_deterministic_alias(&public)?;

        let pair = KeyPair {
            curve,
            secret: secret.to_vec(),
            public,
        };
        self.keys.insert(alias.clone(), Arc::new(pair));
        tracing::debug!(%alias, %curve, "imported private key");
        Ok(alias)
    }

    /// Export the secret key bytes stored under `alias`, with their curve.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] for an unknown alias.
    pub fn export_private_key(&self, alias: &KeyAlias) -> crate::Result<(Curve, Vec<u8>)> {
        let pair = self.key_pair(alias)?;
        Ok((pair.curve, pair.secret.clone()))
    }

    /// Number of keys held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    // Clone the `Arc` out so the shard lock is released before any crypto runs.
    fn key_pair(&self, alias: &KeyAlias) -> crate::Result<Arc<KeyPair>> {
        match self.keys.get(alias) {
            Some(entry) => Ok(Arc::clone(entry.value())),
            None => tracerr!(Error::KeyNotFound, "no key for alias {alias}"),
        }
    }
}

impl KeyManager for InMemoryKeyManager {
    fn generate_private_key(
        &self, alg: Algorithm, curve: Option<Curve>,
    ) -> crate::Result<KeyAlias> {
        let curve = crypto::resolve_curve(alg, curve)?;
        let secret = crypto::key_generator(curve)?.generate();
        self.import_private_key(curve, &secret)
    }

    fn get_public_key(&self, alias: &KeyAlias) -> crate::Result<PublicKeyJwk> {
        Ok(self.key_pair(alias)?.public.clone())
    }

    fn sign(&self, alias: &KeyAlias, payload: &[u8]) -> crate::Result<Vec<u8>> {
        let pair = self.key_pair(alias)?;
        crypto::key_generator(pair.curve)?.sign(&pair.secret, payload)
    }
}
