//! # DID Key
//!
//! The `did:key` method is a DID method for static cryptographic keys. At its
//! core, it is based on expanding a cryptographic public key into a DID
//! Document.
//!
//! The method-specific identifier is the public key itself: the varint
//! multicodec identifier of the key's curve followed by the key bytes,
//! multibase (base58btc) encoded.
//!
//! Resolution is a pure computation. The resulting document holds a single
//! `JsonWebKey2020` verification method, referenced from the
//! `authentication`, `assertionMethod`, `capabilityInvocation` and
//! `capabilityDelegation` relationships.
//!
//! See:
//!
//! - <https://w3c-ccg.github.io/did-method-key>

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    Did, DidMethod, DidResolutionResult, DidResolver, DidUri, Document, KeyFormat,
    VerificationMethod, CONTEXT,
};
use crate::core::Kind;
use crate::crypto;
use crate::error::{tracerr, Error};
use crate::jose::{Algorithm, Curve};
use crate::kms::{KeyAlias, KeyManager};

const METHOD: &str = "key";

/// Options for creating a `did:key` DID.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDidKeyOptions {
    /// Signing algorithm for the generated key.
    pub algorithm: Algorithm,

    /// Curve for the generated key.
    pub curve: Curve,
}

impl Default for CreateDidKeyOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::EdDSA,
            curve: Curve::Ed25519,
        }
    }
}

/// Bookkeeping returned when a `did:key` DID is created.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDidKeyMetadata {
    /// Alias of the key generated in the key manager.
    pub key_alias: KeyAlias,
}

/// The `did:key` method. Stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct DidKeyMethod;

impl DidResolver for DidKeyMethod {
    fn method(&self) -> &str {
        METHOD
    }

    fn resolve(&self, did_uri: &str) -> crate::Result<DidResolutionResult> {
        let uri = match DidUri::parse(did_uri) {
            Ok(uri) => uri,
            Err(e) => tracerr!(Error::InvalidDid, "{}", e.message()),
        };
        if uri.method != METHOD {
            tracerr!(Error::InvalidDid, "expected did:key");
        }

        let public_key_jwk = match crypto::decode_multikey(&uri.id) {
            Ok(jwk) => jwk,
            Err(e) => tracerr!(Error::InvalidDid, "{}: {}", uri.id, e.message()),
        };

        let did = uri.did();
        let vm_id = format!("{did}#{}", uri.id);
        let verification_method = VerificationMethod {
            id: vm_id.clone(),
            controller: did.clone(),
            key: KeyFormat::JsonWebKey2020 { public_key_jwk },
        };
        let relationship = || Some(vec![Kind::String(vm_id.clone())]);

        let document = Document {
            context: CONTEXT.iter().map(|ctx| Kind::String((*ctx).to_string())).collect(),
            id: did,
            verification_method: Some(vec![verification_method]),
            authentication: relationship(),
            assertion_method: relationship(),
            capability_invocation: relationship(),
            capability_delegation: relationship(),
            ..Document::default()
        };
        tracing::debug!("resolved {did_uri}");

        Ok(DidResolutionResult::new(document))
    }
}

impl DidMethod for DidKeyMethod {
    type CreateOptions = CreateDidKeyOptions;
    type CreatedMetadata = CreatedDidKeyMetadata;

    fn create(
        &self, key_manager: Arc<dyn KeyManager>, options: Option<CreateDidKeyOptions>,
    ) -> crate::Result<(Did, CreatedDidKeyMetadata)> {
        let opts = options.unwrap_or_default();

        // check before generating so an unusable curve leaves no key behind
        if crypto::resolve_curve(opts.algorithm, Some(opts.curve)).is_err() {
            tracerr!(Error::UnsupportedOperation, "{} curve not supported", opts.curve);
        }

        let key_alias = key_manager.generate_private_key(opts.algorithm, Some(opts.curve))?;
        let public_key = key_manager.get_public_key(&key_alias)?;
        let did = format!("did:key:{}", crypto::encode_multikey(&public_key)?);
        tracing::debug!(%key_alias, "created {did}");

        Ok((Did::new(did, key_manager, Arc::new(Self)), CreatedDidKeyMetadata { key_alias }))
    }
}
