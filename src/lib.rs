//! # Credibil Identity
//!
//! Self-certifying `did:key` identifiers and JWT-encoded Verifiable
//! Credentials.
//!
//! A `did:key` DID is derived from a public key alone: no ledger or network is
//! involved in creating or resolving it. Credentials are signed with a key the
//! issuer's DID Document authorizes for assertions, and verified by resolving
//! the issuer again and checking that authorization before the signature.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use credibil_identity::credential::VerifiableCredential;
//! use credibil_identity::did::{DidKeyMethod, DidMethod};
//! use credibil_identity::kms::InMemoryKeyManager;
//!
//! let (issuer, _) = DidKeyMethod.create(Arc::new(InMemoryKeyManager::new()), None)?;
//! let vc =
//!     VerifiableCredential::create("StreetCred", issuer.uri(), "did:example:alice", &claims)?;
//! let token = vc.sign(&issuer)?;
//! VerifiableCredential::verify(&token)?;
//! ```

pub mod codec;
pub mod core;
pub mod credential;
pub mod crypto;
pub mod did;
mod error;
pub mod jose;
pub mod kms;

pub use self::error::Error;

/// Result type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
