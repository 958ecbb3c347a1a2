//! # DID Document
//!
//! A DID Document is a JSON-LD document that contains information related to a
//! DID.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Kind;
use crate::crypto;
use crate::error::{tracerr, Error};
use crate::jose::PublicKeyJwk;

/// Contexts added to documents built by this crate.
pub const CONTEXT: [&str; 2] =
    ["https://www.w3.org/ns/did/v1", "https://w3id.org/security/suites/jws-2020/v1"];

/// DID Document
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The context of the DID document.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// The DID for a particular DID subject.
    pub id: String,

    /// Other identifiers for the subject of the DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_known_as: Option<Vec<String>>,

    /// DIDs authorized to make changes to the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<Vec<String>>,

    /// If set, MUST be a set of verification methods for the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,

    /// How the DID subject is expected to be authenticated.
    ///
    /// <https://www.w3.org/TR/did-core/#authentication>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<Kind<VerificationMethod>>>,

    /// How the DID subject is expected to express claims, such as for the
    /// purposes of issuing a Verifiable Credential.
    ///
    /// <https://www.w3.org/TR/did-core/#assertion>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<Kind<VerificationMethod>>>,

    /// <https://www.w3.org/TR/did-core/#key-agreement>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<Kind<VerificationMethod>>>,

    /// <https://www.w3.org/TR/did-core/#capability-invocation>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<Kind<VerificationMethod>>>,

    /// <https://www.w3.org/TR/did-core/#capability-delegation>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<Kind<VerificationMethod>>>,
}

impl Document {
    /// Retrieve a verification method by its ID. Relative (`#fragment`) IDs
    /// are resolved against the document ID.
    #[must_use]
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let absolute = self.absolute_id(id);
        self.verification_method
            .as_ref()?
            .iter()
            .find(|vm| self.absolute_id(&vm.id) == absolute)
    }

    /// Dereference every entry of the `assertionMethod` relationship.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if a reference does not resolve to a
    /// verification method in the document.
    pub fn assertion_methods(&self) -> crate::Result<Vec<VerificationMethod>> {
        self.dereference(self.assertion_method.as_deref())
    }

    /// Dereference every entry of the `authentication` relationship.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if a reference does not resolve to a
    /// verification method in the document.
    pub fn authentication_methods(&self) -> crate::Result<Vec<VerificationMethod>> {
        self.dereference(self.authentication.as_deref())
    }

    fn dereference(
        &self, relationship: Option<&[Kind<VerificationMethod>]>,
    ) -> crate::Result<Vec<VerificationMethod>> {
        let mut methods = vec![];
        for entry in relationship.unwrap_or_default() {
            match entry {
                Kind::Object(vm) => methods.push(vm.clone()),
                Kind::String(id) => {
                    let Some(vm) = self.verification_method(id) else {
                        tracerr!(
                            Error::InvalidDid,
                            "{id} does not dereference to a verification method in {}",
                            self.id
                        );
                    };
                    methods.push(vm.clone());
                }
            }
        }
        Ok(methods)
    }

    /// Make a verification method ID absolute by resolving a `#fragment`
    /// against the document ID.
    pub(crate) fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') { format!("{}{id}", self.id) } else { id.to_string() }
    }
}

/// A public key (or other verification material) that can be used with
/// respect to a verification relationship.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// A DID URL that identifies the verification method.
    pub id: String,

    /// The DID of the controller of the verification method.
    pub controller: String,

    /// The type and format of the public key material.
    #[serde(flatten)]
    pub key: KeyFormat,
}

impl VerificationMethod {
    /// Infer the DID from the key ID.
    #[must_use]
    pub fn did(&self) -> String {
        self.id.split('#').next().unwrap_or_default().to_string()
    }

    /// The public key as a JWK.
    ///
    /// # Errors
    ///
    /// Returns an error if multibase key material cannot be decoded.
    pub fn public_key_jwk(&self) -> crate::Result<PublicKeyJwk> {
        match &self.key {
            KeyFormat::JsonWebKey2020 { public_key_jwk } => Ok(public_key_jwk.clone()),
            KeyFormat::Multikey { public_key_multibase } => {
                crypto::decode_multikey(public_key_multibase)
            }
        }
    }
}

/// Public key material, tagged by verification method type.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all_fields = "camelCase")]
#[serde(tag = "type")]
pub enum KeyFormat {
    /// The key is encoded as a JWK.
    #[serde(alias = "JsonWebKey")]
    JsonWebKey2020 {
        /// The public key encoded as a JWK.
        public_key_jwk: PublicKeyJwk,
    },

    /// The key is a multicodec-prefixed, multibase-encoded string.
    Multikey {
        /// The public key encoded as a Multibase.
        public_key_multibase: String,
    },
}

impl Default for KeyFormat {
    fn default() -> Self {
        Self::Multikey {
            public_key_multibase: String::new(),
        }
    }
}

impl From<PublicKeyJwk> for KeyFormat {
    fn from(jwk: PublicKeyJwk) -> Self {
        Self::JsonWebKey2020 { public_key_jwk: jwk }
    }
}
