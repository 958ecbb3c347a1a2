//! Destructure DID URIs into their components.
//!
//! A DID URL is of the form
//!
//! `did:<method>:<method-specific-id>[/<path>][?<query>][#<fragment>]`.

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{tracerr, Error};

static DID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // method names are lowercase alphanumerics; the method-specific id allows
    // percent-encoding and ':' separated segments but no empty trailing segment
    Regex::new(concat!(
        r"^did:(?<method>[a-z0-9]+)",
        r":(?<id>(?:[A-Za-z0-9._\-]|%[0-9A-Fa-f]{2})*(?::(?:[A-Za-z0-9._\-]|%[0-9A-Fa-f]{2})*)*(?:[A-Za-z0-9._\-]|%[0-9A-Fa-f]{2}))",
        r"(?<path>/[^?#]*)?",
        r"(?<query>\?[^#]*)?",
        r"(?:#(?<fragment>.*))?$",
    ))
    .expect("DID pattern should compile")
});

/// A parsed DID or DID URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DidUri {
    /// The DID method name, e.g. `key`.
    pub method: String,

    /// Method-specific identifier.
    pub id: String,

    /// Path, including the leading `/`.
    pub path: Option<String>,

    /// Query, without the leading `?`.
    pub query: Option<String>,

    /// Fragment, without the leading `#`.
    pub fragment: Option<String>,
}

impl DidUri {
    /// Parse a DID or DID URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when `uri` does not follow
    /// `did:<method>:<method-specific-id>`, including when the method or the
    /// identifier is empty.
    pub fn parse(uri: &str) -> crate::Result<Self> {
        let Some(caps) = DID_REGEX.captures(uri) else {
            tracerr!(Error::Parse, "invalid DID URI: {uri}");
        };

        let part = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
        Ok(Self {
            method: part("method").unwrap_or_default(),
            id: part("id").unwrap_or_default(),
            path: part("path"),
            query: part("query").map(|q| q.trim_start_matches('?').to_string()),
            fragment: part("fragment"),
        })
    }

    /// The DID without path, query or fragment: `did:<method>:<id>`.
    #[must_use]
    pub fn did(&self) -> String {
        format!("did:{}:{}", self.method, self.id)
    }
}

impl FromStr for DidUri {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl Display for DidUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.id)?;
        if let Some(path) = &self.path {
            write!(f, "{path}")?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_key() {
        let uri = DidUri::parse("did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp")
            .expect("should parse");
        assert_eq!(uri.method, "key");
        assert_eq!(uri.id, "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");
        assert_eq!(uri.fragment, None);
    }

    #[test]
    fn did_url() {
        let s = "did:ion:EiA:abc/path?versionId=1#key-1";
        let uri: DidUri = s.parse().expect("should parse");
        assert_eq!(uri.method, "ion");
        assert_eq!(uri.id, "EiA:abc");
        assert_eq!(uri.path.as_deref(), Some("/path"));
        assert_eq!(uri.query.as_deref(), Some("versionId=1"));
        assert_eq!(uri.fragment.as_deref(), Some("key-1"));
        assert_eq!(uri.did(), "did:ion:EiA:abc");
        assert_eq!(uri.to_string(), s);
    }

    #[test]
    fn rejects() {
        let invalid =
            ["did:key:", "did::z6Mk", "did:key", "key:z6Mk", "did:KEY:z6Mk", "did:web:a:", ""];
        for s in invalid {
            let err = DidUri::parse(s).expect_err(s);
            assert!(matches!(err, Error::Parse(_)), "{s}");
        }
    }
}
