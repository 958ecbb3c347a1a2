//! Tests for the remote key manager against a mock key service.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use credibil_identity::credential::VerifiableCredential;
use credibil_identity::crypto;
use credibil_identity::did::{CreateDidKeyOptions, DidKeyMethod, DidMethod};
use credibil_identity::jose::{Algorithm, Curve};
use credibil_identity::kms::{InMemoryKeyManager, KeyAlias, KeyManager, KmsConfig, RemoteKeyManager};
use credibil_identity::Error;
use mockito::{Matcher, Server};
use serde_json::{json, Value};

const TOKEN: &str = "s3cret";

fn remote(url: &str) -> RemoteKeyManager {
    let config = KmsConfig {
        url: url.to_string(),
        token: Some(TOKEN.to_string()),
        timeout_secs: 5,
    };
    RemoteKeyManager::new(&config).expect("should create client")
}

// Stand in for the service's key store.
fn service_key(alg: Algorithm) -> (InMemoryKeyManager, KeyAlias) {
    let backing = InMemoryKeyManager::new();
    let alias = backing.generate_private_key(alg, None).expect("should generate");
    (backing, alias)
}

#[test]
fn generate_key() {
    test_utils::init_tracing();

    let (backing, alias) = service_key(Algorithm::EdDSA);
    let jwk = backing.get_public_key(&alias).expect("key exists");

    let mut server = Server::new();
    let create = server
        .mock("POST", "/keys")
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .match_body(Matcher::Json(json!({"alg": "EdDSA", "crv": "Ed25519"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"kid": alias, "key": jwk}).to_string())
        .create();

    let km = remote(&server.url());
    let created = km.generate_private_key(Algorithm::EdDSA, None).expect("should generate");
    assert_eq!(created, alias);

    // cached after creation: no further request
    assert_eq!(km.get_public_key(&created).expect("key exists"), jwk);
    create.assert();
}

#[test]
fn sign_fetches_public_key() {
    let (backing, alias) = service_key(Algorithm::ES256K);
    let jwk = backing.get_public_key(&alias).expect("key exists");
    let signature = backing.sign(&alias, b"hello").expect("should sign");

    let mut server = Server::new();
    let get = server
        .mock("GET", format!("/keys/{alias}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"kid": alias, "key": jwk}).to_string())
        .create();
    let sign = server
        .mock("POST", format!("/keys/{alias}/sign").as_str())
        .match_body(Matcher::Json(json!({
            "alg": "ES256K",
            "value": Base64UrlUnpadded::encode_string(b"hello"),
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"kid": alias, "value": Base64UrlUnpadded::encode_string(&signature)})
                .to_string(),
        )
        .create();

    let km = remote(&server.url());
    let signed = km.sign(&alias, b"hello").expect("should sign");
    crypto::verify(&jwk, b"hello", &signed).expect("should verify");

    get.assert();
    sign.assert();
}

// Issue and verify a credential whose did:key lives in the remote service.
#[test]
fn issue_with_remote_key() {
    let (backing, alias) = service_key(Algorithm::ES256K);
    let jwk = backing.get_public_key(&alias).expect("key exists");

    let mut server = Server::new();
    let _create = server
        .mock("POST", "/keys")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"kid": alias, "key": jwk}).to_string())
        .create();

    let signer = backing.clone();
    let signing_alias = alias.clone();
    let _sign = server
        .mock("POST", format!("/keys/{alias}/sign").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(move |request| {
            let body: Value =
                serde_json::from_slice(request.body().expect("has body")).expect("json");
            let value = body["value"].as_str().expect("value");
            let payload = Base64UrlUnpadded::decode_vec(value).expect("base64url");
            let signature = signer.sign(&signing_alias, &payload).expect("should sign");
            json!({"kid": signing_alias, "value": Base64UrlUnpadded::encode_string(&signature)})
                .to_string()
                .into()
        })
        .create();

    let options = CreateDidKeyOptions {
        algorithm: Algorithm::ES256K,
        curve: Curve::Secp256k1,
    };
    let (issuer, metadata) =
        DidKeyMethod.create(Arc::new(remote(&server.url())), Some(options)).expect("should create");
    assert_eq!(metadata.key_alias, alias);

    let data = json!({"legit": true});
    let vc = VerifiableCredential::create("StreetCred", issuer.uri(), "did:example:alice", &data)
        .expect("should create");
    let token = vc.sign(&issuer).expect("should sign");
    VerifiableCredential::verify(&token).expect("should verify");
}

#[test]
fn key_not_found() {
    let mut server = Server::new();
    let _get = server
        .mock("GET", "/keys/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "KeyNotFound", "message": "no key named missing"}"#)
        .create();

    let err = remote(&server.url())
        .get_public_key(&KeyAlias::new("missing"))
        .expect_err("should fail");
    assert!(matches!(err, Error::KeyNotFound(_)));
    assert_eq!(err.message(), "KeyNotFound: no key named missing");
}

// Aliases are path segments: separators and query characters are escaped.
#[test]
fn alias_is_escaped() {
    let mut server = Server::new();
    let get = server
        .mock("GET", "/keys/a%2F..%2Fb%3Fc")
        .with_status(404)
        .with_body(r#"{"error": "KeyNotFound"}"#)
        .create();

    let err = remote(&server.url())
        .get_public_key(&KeyAlias::new("a/../b?c"))
        .expect_err("should fail");
    assert!(matches!(err, Error::KeyNotFound(_)));
    get.assert();
}

// Requests are made relative to the configured base path.
#[test]
fn base_path() {
    let (backing, alias) = service_key(Algorithm::EdDSA);
    let jwk = backing.get_public_key(&alias).expect("key exists");

    let mut server = Server::new();
    let create = server
        .mock("POST", "/v1/keys")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"kid": alias, "key": jwk}).to_string())
        .create();

    let km = remote(&format!("{}/v1/", server.url()));
    let created = km.generate_private_key(Algorithm::EdDSA, None).expect("should generate");
    assert_eq!(created, alias);
    create.assert();
}

#[test]
fn service_unavailable() {
    let mut server = Server::new();
    let _create =
        server.mock("POST", "/keys").with_status(503).with_body("down for maintenance").create();

    let km = remote(&server.url());
    let err = km.generate_private_key(Algorithm::EdDSA, None).expect_err("should fail");
    assert!(matches!(err, Error::ServiceUnavailable(_)));
}

#[test]
fn service_error() {
    let mut server = Server::new();
    let _create = server
        .mock("POST", "/keys")
        .with_status(400)
        .with_body(r#"{"error": "BadParameter"}"#)
        .create();

    let err = remote(&server.url())
        .generate_private_key(Algorithm::EdDSA, None)
        .expect_err("should fail");
    assert!(matches!(err, Error::KeyManager(_)));
}

// The service answered, but not with a key on the requested curve: no alias
// is handed out.
#[test]
fn wrong_curve_not_created() {
    let (backing, alias) = service_key(Algorithm::ES256K);
    let jwk = backing.get_public_key(&alias).expect("key exists");

    let mut server = Server::new();
    let _create = server
        .mock("POST", "/keys")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"kid": alias, "key": jwk}).to_string())
        .create();

    let err = remote(&server.url())
        .generate_private_key(Algorithm::EdDSA, None)
        .expect_err("should fail");
    assert!(matches!(err, Error::KeyManager(_)));
}

#[test]
fn connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("should bind");
        listener.local_addr().expect("has address").port()
    };

    let err = remote(&format!("http://127.0.0.1:{port}"))
        .generate_private_key(Algorithm::EdDSA, None)
        .expect_err("should fail");
    assert!(matches!(err, Error::ServiceUnavailable(_)));
}

// A service that accepts the connection but never answers.
#[test]
fn deadline_exceeded() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("should bind");
    let url = format!("http://{}", listener.local_addr().expect("has address"));

    let km = remote(&url).with_timeout(Duration::from_millis(250));
    let err = km.generate_private_key(Algorithm::EdDSA, None).expect_err("should fail");
    assert!(matches!(err, Error::Timeout(_)));
    drop(listener);
}
