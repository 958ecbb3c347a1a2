//! # Verifiable Credentials
//!
//! Issue and verify JWT-encoded W3C Verifiable Credentials.
//!
//! The signing key is never supplied directly. [`VerifiableCredential::sign`]
//! resolves the issuer's DID and signs with the first verification method in
//! its `assertionMethod` relationship. [`VerifiableCredential::verify`]
//! resolves the issuer again and only accepts a signature from a key that the
//! issuer's DID Document authorizes for assertions.

mod model;

use std::fmt::{self, Display};

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub use self::model::{CredentialSubject, JwtClaims, VcDataModel, VC_CONTEXT, VC_TYPE};
use crate::crypto;
use crate::did::{Did, DidResolvers};
use crate::error::{tracerr, Error};
use crate::jose::{Jws, JwsHeader};

/// Reported when no verification method in the issuer's `assertionMethod`
/// relationship matches the signing key.
pub const ASSERTION_KID_MISMATCH: &str = "Expected kid in JWS header to dereference a DID Document Verification Method with an Assertion verification relationship";

const VERIFICATION_FAILED: &str = "Signature verification failed";

/// An unsigned Verifiable Credential. Immutable once created.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// The credential type, e.g. `StreetCred`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Issuer DID.
    pub issuer: String,

    /// Subject identifier.
    pub subject: String,

    /// The full data model.
    pub vc_data_model: VcDataModel,
}

impl VerifiableCredential {
    /// Create a credential of `type_` about `subject`, issued by `issuer`.
    /// `data` becomes the subject's claims.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `data` does not serialize to a
    /// JSON object.
    pub fn create<T: Serialize + ?Sized>(
        type_: &str, issuer: &str, subject: &str, data: &T,
    ) -> crate::Result<Self> {
        let Ok(Value::Object(mut claims)) = serde_json::to_value(data) else {
            tracerr!(Error::InvalidArgument, "expected data to be parseable into a JSON object");
        };
        claims.remove("id");

        let vc_data_model = VcDataModel {
            context: vec![VC_CONTEXT.to_string()],
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            type_: vec![VC_TYPE.to_string(), type_.to_string()],
            issuer: issuer.to_string(),
            issuance_date: Utc::now().trunc_subsecs(0),
            expiration_date: None,
            credential_subject: CredentialSubject {
                id: subject.to_string(),
                claims,
            },
        };

        Ok(Self {
            type_: type_.to_string(),
            issuer: issuer.to_string(),
            subject: subject.to_string(),
            vc_data_model,
        })
    }

    /// A copy of this credential that expires at `expiration_date`.
    #[must_use]
    pub fn with_expiration_date(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.vc_data_model.expiration_date = Some(expiration_date.trunc_subsecs(0));
        self
    }

    /// Sign the credential as a compact JWT using the issuer's first
    /// `assertionMethod` key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signature`] when the issuer's DID Document has no
    /// assertion method, or any error raised resolving the DID or signing.
    pub fn sign(&self, issuer: &Did) -> crate::Result<String> {
        let resolved = issuer.resolve()?;
        let methods = resolved.assertion_method_verification_methods()?;
        let Some(vm) = methods.first() else {
            tracerr!(Error::Signature, "{ASSERTION_KID_MISMATCH}");
        };

        let public_key = vm.public_key_jwk()?;
        let alg = crypto::key_generator(public_key.crv)?.algorithm();
        let key_manager = issuer.key_manager();
        let alias = key_manager.get_deterministic_alias(&public_key)?;

        let kid = resolved.did_document.absolute_id(&vm.id);
        tracing::debug!(%kid, %alg, "signing {} credential", self.type_);

        let header = JwsHeader {
            alg: alg.to_string(),
            typ: Some("JWT".to_string()),
            kid: Some(kid),
        };
        let claims = JwtClaims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            iat: Utc::now().timestamp(),
            vc: self.vc_data_model.clone(),
        };

        Jws::encode(&header, &claims, |input| key_manager.sign(&alias, input))
    }

    /// Verify a JWT-encoded credential, resolving its issuer with the default
    /// resolvers (`did:key`).
    ///
    /// # Errors
    ///
    /// See [`VerifiableCredential::verify_with`].
    pub fn verify(token: &str) -> crate::Result<()> {
        Self::verify_with(token, &DidResolvers::default())
    }

    /// Verify a JWT-encoded credential, resolving its issuer with
    /// `resolvers`.
    ///
    /// The header `kid` must name a verification method in the issuer's
    /// `assertionMethod` relationship, the header `alg` must match that key's
    /// curve, and the signature must verify with it.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`VerifiableCredential::parse_jwt`],
    /// [`Error::InvalidArgument`] when the `iss` or `sub` claims disagree with
    /// the credential, any resolution error, or [`Error::Signature`] when the
    /// trust check or the signature fails.
    pub fn verify_with(token: &str, resolvers: &DidResolvers) -> crate::Result<()> {
        let (jws, credential) = Self::decode(token)?;
        let header = jws.header();

        let Some(iss) = jws.claims().get("iss").and_then(Value::as_str) else {
            tracerr!(Error::InvalidArgument, "jwt payload missing iss claim");
        };
        if iss != credential.issuer {
            tracerr!(Error::InvalidArgument, "iss claim {iss} does not match credential issuer");
        }
        if jws.claims().get("sub").and_then(Value::as_str) != Some(credential.subject.as_str()) {
            tracerr!(Error::InvalidArgument, "sub claim does not match credential subject");
        }

        let resolved = resolvers.resolve(iss)?;
        let document = &resolved.did_document;
        let Some(kid) = header.kid.as_deref().map(|kid| document.absolute_id(kid)) else {
            tracing::warn!("token from {iss} has no kid");
            tracerr!(Error::Signature, "{VERIFICATION_FAILED}: {ASSERTION_KID_MISMATCH}");
        };
        let methods = resolved.assertion_method_verification_methods()?;

        let Some(vm) = methods.iter().find(|vm| document.absolute_id(&vm.id) == kid) else {
            tracing::warn!(%kid, "kid is not an assertion method of {iss}");
            tracerr!(Error::Signature, "{VERIFICATION_FAILED}: {ASSERTION_KID_MISMATCH}");
        };

        let public_key = vm.public_key_jwk()?;
        let generator = crypto::key_generator(public_key.crv)?;
        if header.alg != generator.algorithm().to_string() {
            tracing::warn!(%kid, alg = %header.alg, "alg does not match the assertion key");
            tracerr!(
                Error::Signature,
                "{VERIFICATION_FAILED}: alg {} does not match {} key {kid}",
                header.alg,
                public_key.crv
            );
        }

        generator.verify(&public_key, jws.signing_input(), jws.signature())?;
        tracing::debug!(%kid, "verified {} credential from {iss}", credential.type_);
        Ok(())
    }

    /// Parse a JWT-encoded credential without verifying its signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] ("not a valid JWT") for a malformed token, or
    /// [`Error::InvalidArgument`] when the `vc` claim is missing, not an
    /// object, or not a credential.
    pub fn parse_jwt(token: &str) -> crate::Result<Self> {
        Ok(Self::decode(token)?.1)
    }

    fn decode(token: &str) -> crate::Result<(Jws, Self)> {
        let jws = Jws::decode(token)?;

        let Some(vc) = jws.claims().get("vc") else {
            tracerr!(Error::InvalidArgument, "jwt payload missing vc property");
        };
        if !vc.is_object() {
            tracerr!(Error::InvalidArgument, "expected vc property in JWT payload to be an object");
        }
        let vc_data_model: VcDataModel = match serde_json::from_value(vc.clone()) {
            Ok(vc) => vc,
            Err(e) => tracerr!(Error::InvalidArgument, "invalid vc property: {e}"),
        };

        let credential = Self {
            type_: vc_data_model.credential_type().to_string(),
            issuer: vc_data_model.issuer.clone(),
            subject: vc_data_model.credential_subject.id.clone(),
            vc_data_model,
        };
        Ok((jws, credential))
    }
}

impl Display for VerifiableCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.vc_data_model).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_credential() {
        let vc = VerifiableCredential::create(
            "StreetCred",
            "did:example:issuer",
            "did:example:alice",
            &json!({"id": "ignored", "localRespect": "high"}),
        )
        .expect("should create");

        let model = &vc.vc_data_model;
        assert_eq!(model.type_, ["VerifiableCredential", "StreetCred"]);
        assert_eq!(model.context, [VC_CONTEXT]);
        assert!(model.id.starts_with("urn:uuid:"));
        assert_eq!(model.credential_subject.id, "did:example:alice");
        let claims = json!({"localRespect": "high"});
        assert_eq!(&model.credential_subject.claims, claims.as_object().expect("object"));
    }

    #[test]
    fn scalar_data() {
        let err = VerifiableCredential::create(
            "StreetCred",
            "did:example:i",
            "did:example:s",
            "trials & tribulations",
        )
        .expect_err("should fail");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(err.to_string(), "expected data to be parseable into a JSON object");
    }

    #[test]
    fn expiration_date() {
        let expires = Utc::now() + chrono::Duration::days(30);
        let vc =
            VerifiableCredential::create("StreetCred", "did:example:i", "did:example:s", &json!({}))
                .expect("should create")
                .with_expiration_date(expires);

        assert_eq!(vc.vc_data_model.expiration_date, Some(expires.trunc_subsecs(0)));
        let parsed: Value = serde_json::from_str(&vc.to_string()).expect("valid json");
        assert!(parsed["expirationDate"].is_string());
    }

    #[test]
    fn display_is_json() {
        let vc =
            VerifiableCredential::create("StreetCred", "did:example:i", "did:example:s", &json!({}))
                .expect("should create");
        let parsed: Value = serde_json::from_str(&vc.to_string()).expect("valid json");
        assert_eq!(parsed["issuer"], "did:example:i");
        assert_eq!(parsed["credentialSubject"]["id"], "did:example:s");
    }
}
