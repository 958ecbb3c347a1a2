use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DidKeyMethod, DidResolver, DidUri, Document, VerificationMethod};
use crate::error::{tracerr, Error};

/// JSON-LD context of a DID resolution result.
pub const RESOLUTION_CONTEXT: &str = "https://w3id.org/did-resolution/v1";

/// The output of resolving a DID.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionResult {
    /// The resolution context.
    #[serde(rename = "@context")]
    pub context: String,

    /// The resolved DID Document.
    pub did_document: Document,

    /// Metadata about the resolution process.
    #[serde(default)]
    pub did_resolution_metadata: ResolutionMetadata,

    /// Metadata about the DID Document.
    #[serde(default)]
    pub did_document_metadata: DocumentMetadata,
}

impl DidResolutionResult {
    /// Wrap a resolved document with the default context and metadata.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            context: RESOLUTION_CONTEXT.to_string(),
            did_document: document,
            did_resolution_metadata: ResolutionMetadata::default(),
            did_document_metadata: DocumentMetadata::default(),
        }
    }

    /// The verification methods of the `assertionMethod` relationship,
    /// dereferenced. Empty when the document has no such relationship.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if a reference does not resolve.
    pub fn assertion_method_verification_methods(&self) -> crate::Result<Vec<VerificationMethod>> {
        self.did_document.assertion_methods()
    }
}

/// DID resolution metadata.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    /// Media type of the returned document.
    pub content_type: String,
}

impl Default for ResolutionMetadata {
    fn default() -> Self {
        Self {
            content_type: "application/did+ld+json".to_string(),
        }
    }
}

/// DID Document metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// When the DID was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// When the document was last updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Whether the DID has been deactivated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
}

/// Lookup table of DID resolvers keyed by method name.
///
/// The default table resolves `did:key` only. The table is immutable once
/// built and cheap to clone.
#[derive(Clone)]
pub struct DidResolvers {
    resolvers: HashMap<String, Arc<dyn DidResolver>>,
}

impl Default for DidResolvers {
    fn default() -> Self {
        Self::empty().with(DidKeyMethod)
    }
}

impl DidResolvers {
    /// A table with no resolvers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Add (or replace) the resolver for `resolver.method()`.
    #[must_use]
    pub fn with(mut self, resolver: impl DidResolver + 'static) -> Self {
        self.resolvers.insert(resolver.method().to_string(), Arc::new(resolver));
        self
    }

    /// The resolver registered for `method`, if any.
    #[must_use]
    pub fn get(&self, method: &str) -> Option<Arc<dyn DidResolver>> {
        self.resolvers.get(method).cloned()
    }

    /// Resolve `did_uri` with the resolver registered for its method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if `did_uri` is not a DID, or
    /// [`Error::UnsupportedOperation`] if no resolver is registered for its
    /// method.
    pub fn resolve(&self, did_uri: &str) -> crate::Result<DidResolutionResult> {
        let uri = match DidUri::parse(did_uri) {
            Ok(uri) => uri,
            Err(e) => tracerr!(Error::InvalidDid, "{}", e.message()),
        };
        let Some(resolver) = self.resolvers.get(&uri.method) else {
            tracerr!(Error::UnsupportedOperation, "resolving did:{} is not supported", uri.method);
        };
        tracing::debug!(method = %uri.method, "resolving {did_uri}");
        resolver.resolve(did_uri)
    }
}

impl Debug for DidResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.resolvers.keys().collect();
        methods.sort();
        f.debug_struct("DidResolvers").field("methods", &methods).finish()
    }
}
