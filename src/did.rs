//! # Decentralized Identifiers
//!
//! DID parsing, DID Documents, and the DID method plugin surface.
//!
//! A DID method implements [`DidResolver`] (turn a DID into a DID Document)
//! and, where it can mint identifiers, [`DidMethod`] (create a DID bound to a
//! [`KeyManager`]). Resolvers are looked up by method name through a
//! [`DidResolvers`] table.
//!
//! `did:key` is provided by [`DidKeyMethod`].

mod document;
mod key;
mod resolution;
mod uri;

use std::fmt::{self, Debug};
use std::sync::Arc;

pub use self::document::{Document, KeyFormat, VerificationMethod, CONTEXT};
pub use self::key::{CreateDidKeyOptions, CreatedDidKeyMetadata, DidKeyMethod};
pub use self::resolution::{
    DidResolutionResult, DidResolvers, DocumentMetadata, ResolutionMetadata, RESOLUTION_CONTEXT,
};
pub use self::uri::DidUri;
use crate::kms::KeyManager;

/// Resolves DIDs of a single method into DID Documents.
///
/// Resolution may be a pure computation (`did:key`) or block on I/O
/// (ledger-anchored methods); the contract is the same.
pub trait DidResolver: Send + Sync {
    /// The method name, e.g. `key` for `did:key`.
    fn method(&self) -> &str;

    /// Resolve `did_uri` into its DID Document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDid`] when the DID does not belong to
    /// this method or cannot be decoded.
    fn resolve(&self, did_uri: &str) -> crate::Result<DidResolutionResult>;
}

/// A DID method able to create new DIDs.
pub trait DidMethod: DidResolver {
    /// Method-specific creation options.
    type CreateOptions: Default;

    /// Method-specific bookkeeping returned to the caller on creation.
    type CreatedMetadata;

    /// Create a new DID whose keys are held by `key_manager`. Method defaults
    /// are used when `options` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedOperation`] when the options cannot be
    /// satisfied, or any error raised by the key manager.
    fn create(
        &self, key_manager: Arc<dyn KeyManager>, options: Option<Self::CreateOptions>,
    ) -> crate::Result<(Did, Self::CreatedMetadata)>;
}

/// A DID bound to the key manager holding its private keys and the resolver
/// for its method.
#[derive(Clone)]
pub struct Did {
    uri: String,
    key_manager: Arc<dyn KeyManager>,
    resolver: Arc<dyn DidResolver>,
}

impl Did {
    /// Bind an existing DID to its key manager and resolver.
    pub fn new(
        uri: impl Into<String>, key_manager: Arc<dyn KeyManager>, resolver: Arc<dyn DidResolver>,
    ) -> Self {
        Self {
            uri: uri.into(),
            key_manager,
            resolver,
        }
    }

    /// The DID string.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The key manager holding this DID's private keys.
    #[must_use]
    pub fn key_manager(&self) -> &dyn KeyManager {
        self.key_manager.as_ref()
    }

    /// Resolve this DID with its method's resolver.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the resolver.
    pub fn resolve(&self) -> crate::Result<DidResolutionResult> {
        self.resolver.resolve(&self.uri)
    }
}

impl Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Did")
            .field("uri", &self.uri)
            .field("method", &self.resolver.method())
            .finish_non_exhaustive()
    }
}
