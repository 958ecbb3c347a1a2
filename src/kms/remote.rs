use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use dashmap::DashMap;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{KeyAlias, KeyManager, KmsConfig};
use crate::crypto;
use crate::error::{tracerr, Error};
use crate::jose::{Algorithm, Curve, PublicKeyJwk};

/// Key manager backed by a remote key management service.
///
/// Calls block the current thread until the service answers or the deadline
/// passes. Nothing is retried.
#[derive(Clone, Debug)]
pub struct RemoteKeyManager {
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
    http_client: Client,
    public_keys: DashMap<KeyAlias, PublicKeyJwk>,
}

/// Key creation request body.
#[derive(Serialize)]
struct CreateKeyRequest {
    alg: Algorithm,
    crv: Curve,
}

/// Key returned by create and get requests.
#[derive(Deserialize)]
struct KeyResponse {
    kid: String,
    key: PublicKeyJwk,
}

/// Sign request body.
#[derive(Serialize)]
struct SigningRequest<'a> {
    alg: Algorithm,
    value: &'a str,
}

/// Signature response.
#[derive(Deserialize)]
struct SignatureResponse {
    kid: String,
    value: String,
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

impl RemoteKeyManager {
    /// Create a client for the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &KmsConfig) -> crate::Result<Self> {
        let base_url = config.base_url()?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http_client = match Client::builder().default_headers(headers).build() {
            Ok(client) => client,
            Err(e) => tracerr!(Error::InvalidConfig, "failed to create HTTP client: {e}"),
        };

        Ok(Self {
            base_url,
            token: config.token.clone(),
            timeout: config.timeout(),
            http_client,
            public_keys: DashMap::new(),
        })
    }

    /// Replace the per-request deadline for subsequent calls.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // Each segment is percent-encoded, so an alias can never change the path.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> crate::Result<T> {
        let mut request = request.timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send() {
            Ok(res) => res,
            Err(e) => return Err(request_error(&e)),
        };
        tracing::debug!(status = %response.status(), url = %response.url(), "key service response");
        unpack_response(response)
    }

    fn alias_for(&self, key: &PublicKeyJwk, kid: &str) -> crate::Result<KeyAlias> {
        let alias = self.get_deterministic_alias(key)?;
        if alias.as_str() != kid {
            tracerr!(
                Error::KeyManager,
                "service returned kid {kid} for key with thumbprint {alias}"
            );
        }
        Ok(alias)
    }
}

impl KeyManager for RemoteKeyManager {
    fn generate_private_key(
        &self, alg: Algorithm, curve: Option<Curve>,
    ) -> crate::Result<KeyAlias> {
        let crv = crypto::resolve_curve(alg, curve)?;
        let url = self.endpoint(&["keys"]);
        tracing::debug!(%url, %alg, %crv, "generating remote key");

        let request = self.http_client.post(url).json(&CreateKeyRequest { alg, crv });
        let created: KeyResponse = self.send(request)?;

        // only a well-formed key on the requested curve counts as created
        if created.key.crv != crv {
            tracerr!(
                Error::KeyManager,
                "service created a {} key, expected {crv}",
                created.key.crv
            );
        }
        crypto::key_generator(crv)?.public_key_to_bytes(&created.key)?;

        let alias = self.alias_for(&created.key, &created.kid)?;
        self.public_keys.insert(alias.clone(), created.key);
        Ok(alias)
    }

    fn get_public_key(&self, alias: &KeyAlias) -> crate::Result<PublicKeyJwk> {
        if let Some(key) = self.public_keys.get(alias) {
            return Ok(key.value().clone());
        }

        let url = self.endpoint(&["keys", alias.as_str()]);
        tracing::debug!(%url, "fetching remote public key");
        let fetched: KeyResponse = self.send(self.http_client.get(url))?;

        let found = self.alias_for(&fetched.key, &fetched.kid)?;
        if &found != alias {
            tracerr!(Error::KeyManager, "service returned key {found} for alias {alias}");
        }
        self.public_keys.insert(found, fetched.key.clone());
        Ok(fetched.key)
    }

    fn sign(&self, alias: &KeyAlias, payload: &[u8]) -> crate::Result<Vec<u8>> {
        let key = self.get_public_key(alias)?;
        let alg = crypto::key_generator(key.crv)?.algorithm();

        let url = self.endpoint(&["keys", alias.as_str(), "sign"]);
        tracing::debug!(%url, %alg, "signing with remote key");
        let value = Base64UrlUnpadded::encode_string(payload);
        let request = self.http_client.post(url).json(&SigningRequest { alg, value: &value });
        let signed: SignatureResponse = self.send(request)?;

        if signed.kid != alias.as_str() {
            tracerr!(Error::KeyManager, "service signed with {} instead of {alias}", signed.kid);
        }
        match Base64UrlUnpadded::decode_vec(&signed.value) {
            Ok(signature) => Ok(signature),
            Err(e) => tracerr!(Error::KeyManager, "invalid signature encoding: {e}"),
        }
    }
}

fn request_error(err: &reqwest::Error) -> Error {
    let error = if err.is_timeout() {
        Error::Timeout(format!("key service did not respond in time: {err}"))
    } else if err.is_connect() || err.is_request() {
        Error::ServiceUnavailable(format!("unable to reach key service: {err}"))
    } else {
        Error::KeyManager(format!("unable to make request: {err}"))
    };
    tracing::error!("{error}");
    error
}

fn unpack_response<T: DeserializeOwned>(res: Response) -> crate::Result<T> {
    let status = res.status();
    if status.is_success() {
        return match res.json::<T>() {
            Ok(obj) => Ok(obj),
            Err(e) if e.is_timeout() => Err(request_error(&e)),
            Err(e) => tracerr!(Error::KeyManager, "unable to deserialize response: {e}"),
        };
    }

    let detail = match res.text() {
        Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(ApiErrorResponse { error, message: Some(message) }) => format!("{error}: {message}"),
            Ok(ApiErrorResponse { error, message: None }) => error,
            Err(_) => body,
        },
        Err(e) => e.to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => tracerr!(Error::KeyNotFound, "{detail}"),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            tracerr!(Error::ServiceUnavailable, "{status}: {detail}")
        }
        _ => tracerr!(Error::KeyManager, "{status}: {detail}"),
    }
}
