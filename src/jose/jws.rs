//! Compact JWS serialization: `base64url(header).base64url(payload).base64url(signature)`.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{tracerr, Error};

/// Protected header of a compact JWS.
///
/// `alg` is kept as received: an algorithm this crate cannot verify is a
/// verification failure, not a parse failure.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct JwsHeader {
    /// Signing algorithm, e.g. `EdDSA`.
    pub alg: String,

    /// Media type of the complete token, `JWT` for credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Verification method id of the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// A parsed, not yet verified, compact JWS.
#[derive(Clone, Debug)]
pub struct Jws {
    header: JwsHeader,
    claims: Map<String, Value>,
    signing_input: String,
    signature: Vec<u8>,
}

impl Jws {
    /// Serialize `header` and `claims`, sign the resulting signing input with
    /// `sign`, and return the compact token.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or `sign` fails.
    pub fn encode<T, F>(header: &JwsHeader, claims: &T, sign: F) -> crate::Result<String>
    where
        T: Serialize,
        F: FnOnce(&[u8]) -> crate::Result<Vec<u8>>,
    {
        let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(header)?);
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
        let signing_input = format!("{header}.{payload}");

        let signature = sign(signing_input.as_bytes())?;
        Ok(format!("{signing_input}.{}", Base64UrlUnpadded::encode_string(&signature)))
    }

    /// Parse a compact token without checking its signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] ("not a valid JWT") when the token does not
    /// have exactly three segments, a segment is not base64url, the header is
    /// not a JWS header, or the payload is not a JSON object. A detached
    /// payload (`header..signature`) is rejected.
    pub fn decode(token: &str) -> crate::Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            tracing::debug!("token has {} segments", parts.len());
            tracerr!(Error::Parse, "not a valid JWT");
        };

        let Some(decoded) = Self::decode_segments(header, payload, signature) else {
            tracerr!(Error::Parse, "not a valid JWT");
        };
        let (header_json, claims, signature) = decoded;

        Ok(Self {
            header: header_json,
            claims,
            signing_input: format!("{header}.{payload}"),
            signature,
        })
    }

    fn decode_segments(
        header: &str, payload: &str, signature: &str,
    ) -> Option<(JwsHeader, Map<String, Value>, Vec<u8>)> {
        let header = Base64UrlUnpadded::decode_vec(header).ok()?;
        let header = serde_json::from_slice(&header)
            .map_err(|e| tracing::debug!("invalid JWS header: {e}"))
            .ok()?;

        let payload = Base64UrlUnpadded::decode_vec(payload).ok()?;
        let claims = serde_json::from_slice(&payload)
            .map_err(|e| tracing::debug!("invalid JWS payload: {e}"))
            .ok()?;

        let signature = Base64UrlUnpadded::decode_vec(signature).ok()?;
        Some((header, claims, signature))
    }

    /// The protected header.
    #[must_use]
    pub const fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// The payload claims.
    #[must_use]
    pub const fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Deserialize the payload claims into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims do not fit `T`.
    pub fn claims_as<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.claims.clone()))?)
    }

    /// The bytes the signature was computed over.
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }

    /// The raw signature.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn header() -> JwsHeader {
        JwsHeader {
            alg: "EdDSA".into(),
            typ: Some("JWT".into()),
            kid: Some("did:key:z6Mk#z6Mk".into()),
        }
    }

    #[test]
    fn encode_decode() {
        let claims = json!({"iss": "did:key:z6Mk", "sub": "did:example:1"});
        let token = Jws::encode(&header(), &claims, |input| Ok(input[..4].to_vec()))
            .expect("should encode");

        let jws = Jws::decode(&token).expect("should decode");
        assert_eq!(jws.header(), &header());
        assert_eq!(jws.claims()["sub"], "did:example:1");
        assert_eq!(jws.signature(), &jws.signing_input()[..4]);
    }

    #[test]
    fn not_a_jwt() {
        for token in ["hi", "a.b", "a.b.c.d", "!!.e30.AA", ""] {
            let err = Jws::decode(token).expect_err("should fail");
            assert_eq!(err.to_string(), "not a valid JWT");
        }
    }

    #[test]
    fn detached_payload() {
        let token =
            Jws::encode(&header(), &json!({}), |_| Ok(vec![1, 2, 3])).expect("should encode");
        let parts: Vec<&str> = token.split('.').collect();
        let detached = format!("{}..{}", parts[0], parts[2]);

        let err = Jws::decode(&detached).expect_err("should fail");
        assert!(matches!(err, Error::Parse(_)));
    }

    // `typ` and `kid` are optional, and `alg` is not checked until
    // verification.
    #[test]
    fn minimal_header() {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"ES512"}"#);
        let payload = Base64UrlUnpadded::encode_string(br#"{"sub":"alice"}"#);
        let token = format!("{header}.{payload}.AQID");

        let jws = Jws::decode(&token).expect("should decode");
        assert_eq!(jws.header().alg, "ES512");
        assert_eq!(jws.header().typ, None);
        assert_eq!(jws.header().kid, None);
        assert_eq!(jws.signature(), [1, 2, 3]);

        let minimal = JwsHeader {
            alg: "EdDSA".into(),
            ..JwsHeader::default()
        };
        let serialized = serde_json::to_value(&minimal).expect("should serialize");
        assert_eq!(serialized, json!({"alg": "EdDSA"}));
    }

    #[test]
    fn payload_not_object() {
        let token = Jws::encode(&header(), &json!("hi"), |_| Ok(vec![1])).expect("should encode");
        assert!(Jws::decode(&token).is_err());
    }
}
