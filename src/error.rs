//! # Errors
//!
//! Typed failures surfaced by DID creation and resolution, key management, and
//! the Verifiable Credential protocol. Nothing in this crate retries or
//! swallows an error; every variant reaches the caller.

use serde_json::{json, Value};
use thiserror::Error;

/// Log an error at `error` level and return it from the current function.
///
/// ```ignore
/// tracerr!(Error::InvalidDid, "expected did:key, got {method}");
/// ```
macro_rules! tracerr {
    ($variant:path, $($msg:tt)*) => {{
        let msg = format!($($msg)*);
        tracing::error!("{msg}");
        return Err($variant(msg));
    }};
}
pub(crate) use tracerr;

/// Errors returned by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input, such as non-object credential data or a
    /// missing or mistyped `vc` claim.
    #[error("{0}")]
    InvalidArgument(String),

    /// A structurally invalid token or string.
    #[error("{0}")]
    Parse(String),

    /// Binary input ended before a terminating byte, or overflowed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The multibase prefix is not one this crate understands.
    #[error("unsupported base: {0}")]
    UnsupportedBase(String),

    /// The curve or multicodec is not present in the crypto registry.
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    /// The requested operation cannot be performed with the given options.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// DID method mismatch or undecodable method-specific identifier.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// Public key material could not be interpreted.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// No usable assertion key, or a cryptographic mismatch.
    #[error("{0}")]
    Signature(String),

    /// The key manager holds no key for the alias.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The key management service could not be reached.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The key management service did not answer before the deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The key management service rejected the request.
    #[error("key manager error: {0}")]
    KeyManager(String),

    /// Configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable, machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Parse(_) => "parse_error",
            Self::MalformedInput(_) => "malformed_input",
            Self::UnsupportedBase(_) => "unsupported_base",
            Self::UnsupportedCurve(_) => "unsupported_curve",
            Self::UnsupportedOperation(_) => "unsupported_operation",
            Self::InvalidDid(_) => "invalid_did",
            Self::InvalidPublicKey(_) => "invalid_public_key",
            Self::Signature(_) => "signature_error",
            Self::KeyNotFound(_) => "key_not_found",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Timeout(_) => "timeout",
            Self::KeyManager(_) => "key_manager_error",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Other(_) => "unknown",
        }
    }

    /// Human-readable message, without the code prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidArgument(msg)
            | Self::Parse(msg)
            | Self::MalformedInput(msg)
            | Self::UnsupportedBase(msg)
            | Self::UnsupportedCurve(msg)
            | Self::UnsupportedOperation(msg)
            | Self::InvalidDid(msg)
            | Self::InvalidPublicKey(msg)
            | Self::Signature(msg)
            | Self::KeyNotFound(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Timeout(msg)
            | Self::KeyManager(msg)
            | Self::InvalidConfig(msg) => msg.clone(),
            Self::Other(err) => err.to_string(),
        }
    }

    /// Transfer the error to an OAuth2-compatible JSON body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.code(),
            "error_description": self.to_string(),
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code() {
        let err = Error::InvalidDid("expected did:key".into());
        assert_eq!(err.code(), "invalid_did");
        assert_eq!(err.message(), "expected did:key");
        assert_eq!(err.to_string(), "invalid DID: expected did:key");
    }

    #[test]
    fn json_body() {
        let err = Error::InvalidArgument("jwt payload missing vc property".into());
        assert_eq!(
            err.to_json(),
            json!({
                "error": "invalid_argument",
                "error_description": "jwt payload missing vc property"
            })
        );
    }

    #[test]
    fn traced_error() {
        fn fails() -> crate::Result<()> {
            tracerr!(Error::KeyNotFound, "no key for alias {}", "abc");
        }
        let err = fails().expect_err("should fail");
        assert!(matches!(err, Error::KeyNotFound(_)));
        assert_eq!(err.to_string(), "key not found: no key for alias abc");
    }
}
