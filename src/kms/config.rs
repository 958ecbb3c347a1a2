use std::env;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{tracerr, Error};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for a remote key management service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KmsConfig {
    /// Base URL of the key service.
    pub url: String,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request deadline, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl KmsConfig {
    /// Configuration for the service at `url`, with no token and the default
    /// deadline.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read configuration from `KMS_URL`, `KMS_TOKEN` and `KMS_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `KMS_URL` is missing or either
    /// `KMS_URL` or `KMS_TIMEOUT_SECS` is invalid.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let Some(url) = lookup("KMS_URL") else {
            tracerr!(Error::InvalidConfig, "KMS_URL is not set");
        };

        let timeout_secs = match lookup("KMS_TIMEOUT_SECS") {
            Some(secs) => match secs.parse() {
                Ok(secs) => secs,
                Err(e) => tracerr!(Error::InvalidConfig, "KMS_TIMEOUT_SECS '{secs}': {e}"),
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            url,
            token: lookup("KMS_TOKEN"),
            timeout_secs,
        };
        config.base_url()?;
        Ok(config)
    }

    /// The validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `url` is not an absolute URL.
    pub fn base_url(&self) -> crate::Result<Url> {
        match Url::parse(&self.url) {
            Ok(url) if !url.cannot_be_a_base() => Ok(url),
            Ok(_) => tracerr!(Error::InvalidConfig, "'{}' cannot be a base URL", self.url),
            Err(e) => tracerr!(Error::InvalidConfig, "invalid KMS url '{}': {e}", self.url),
        }
    }

    /// The per-request deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
