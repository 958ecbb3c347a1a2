use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base context of every credential.
pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// The first entry of every credential's `type`.
pub const VC_TYPE: &str = "VerifiableCredential";

/// W3C Verifiable Credentials data model (v1.1).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VcDataModel {
    /// JSON-LD contexts. The first is always [`VC_CONTEXT`].
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential identifier, a `urn:uuid` for credentials created here.
    pub id: String,

    /// Credential types, [`VC_TYPE`] first.
    #[serde(rename = "type")]
    pub type_: Vec<String>,

    /// DID of the issuer.
    pub issuer: String,

    /// When the credential was issued.
    pub issuance_date: DateTime<Utc>,

    /// When the credential stops being valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Claims about the subject.
    pub credential_subject: CredentialSubject,
}

impl VcDataModel {
    /// The credential type: the first entry of `type` other than
    /// [`VC_TYPE`], or [`VC_TYPE`] itself when there is none.
    #[must_use]
    pub fn credential_type(&self) -> &str {
        self.type_.iter().map(String::as_str).find(|t| *t != VC_TYPE).unwrap_or(VC_TYPE)
    }
}

/// The subject of a credential and the claims made about it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialSubject {
    /// Identifier of the subject, usually a DID.
    pub id: String,

    /// Claims about the subject.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Claims of a JWT-encoded credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct JwtClaims {
    /// Issuer DID.
    pub iss: String,

    /// Subject identifier.
    pub sub: String,

    /// Issued at, seconds since the epoch.
    pub iat: i64,

    /// The credential.
    pub vc: VcDataModel,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn subject_claims_flatten() {
        let vc: VcDataModel = serde_json::from_value(json!({
            "@context": [VC_CONTEXT],
            "id": "urn:uuid:5f3b1b4e-7a2d-4c52-8f38-2a6c1c2f0e11",
            "type": ["VerifiableCredential", "StreetCred"],
            "issuer": "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp",
            "issuanceDate": "2023-10-17T09:00:00Z",
            "credentialSubject": {
                "id": "did:example:alice",
                "localRespect": "high",
                "legit": true
            }
        }))
        .expect("should deserialize");

        assert_eq!(vc.credential_type(), "StreetCred");
        assert_eq!(vc.credential_subject.id, "did:example:alice");
        assert_eq!(vc.credential_subject.claims["legit"], true);
        assert!(!vc.credential_subject.claims.contains_key("id"));
        assert!(vc.expiration_date.is_none());
    }

    #[test]
    fn only_base_type() {
        let vc = VcDataModel {
            context: vec![VC_CONTEXT.into()],
            id: "urn:uuid:1".into(),
            type_: vec![VC_TYPE.into()],
            issuer: "did:example:issuer".into(),
            issuance_date: Utc::now(),
            expiration_date: None,
            credential_subject: CredentialSubject::default(),
        };
        assert_eq!(vc.credential_type(), VC_TYPE);
    }
}
