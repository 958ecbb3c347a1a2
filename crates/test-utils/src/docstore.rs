use std::sync::Arc;

use credibil_identity::core::Kind;
use credibil_identity::did::{
    Did, DidMethod, DidResolutionResult, DidResolver, DidUri, Document, KeyFormat,
    VerificationMethod, CONTEXT,
};
use credibil_identity::jose::Algorithm;
use credibil_identity::kms::{KeyAlias, KeyManager};
use credibil_identity::{Error, Result};
use dashmap::DashMap;

const METHOD: &str = "example";

/// A `did:example` method whose documents live in memory, standing in for
/// registry-backed DID methods. Documents can be edited after creation.
///
/// Clones share the same store.
#[derive(Clone, Debug, Default)]
pub struct DocStore {
    docs: Arc<DashMap<String, Document>>,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a document under its `id`.
    pub fn put(&self, document: Document) {
        self.docs.insert(document.id.clone(), document);
    }

    /// The document stored for `did`.
    #[must_use]
    pub fn get(&self, did: &str) -> Option<Document> {
        self.docs.get(did).map(|doc| doc.value().clone())
    }

    /// Remove the `assertionMethod` relationship from the document for `did`.
    pub fn remove_assertion_method(&self, did: &str) {
        if let Some(mut doc) = self.docs.get_mut(did) {
            doc.assertion_method = None;
        }
    }
}

impl DidResolver for DocStore {
    fn method(&self) -> &str {
        METHOD
    }

    fn resolve(&self, did_uri: &str) -> Result<DidResolutionResult> {
        let uri = DidUri::parse(did_uri).map_err(|e| Error::InvalidDid(e.message()))?;
        if uri.method != METHOD {
            return Err(Error::InvalidDid("expected did:example".into()));
        }
        let Some(document) = self.get(&uri.did()) else {
            return Err(Error::InvalidDid(format!("{did_uri} not found")));
        };
        Ok(DidResolutionResult::new(document))
    }
}

impl DidMethod for DocStore {
    type CreateOptions = Algorithm;
    type CreatedMetadata = KeyAlias;

    /// Generate a key and store a document listing it, by relative
    /// reference, as the only assertion method.
    fn create(
        &self, key_manager: Arc<dyn KeyManager>, options: Option<Algorithm>,
    ) -> Result<(Did, KeyAlias)> {
        let alias = key_manager.generate_private_key(options.unwrap_or_default(), None)?;
        let public_key_jwk = key_manager.get_public_key(&alias)?;

        let did = format!("did:{METHOD}:{alias}");
        let document = Document {
            context: CONTEXT.iter().map(|ctx| Kind::String((*ctx).to_string())).collect(),
            id: did.clone(),
            verification_method: Some(vec![VerificationMethod {
                id: format!("{did}#key-0"),
                controller: did.clone(),
                key: KeyFormat::JsonWebKey2020 { public_key_jwk },
            }]),
            assertion_method: Some(vec![Kind::String("#key-0".into())]),
            ..Document::default()
        };
        self.put(document);

        Ok((Did::new(did, key_manager, Arc::new(self.clone())), alias))
    }
}
