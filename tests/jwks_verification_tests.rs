mod support;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use plinto::auth::{AuthError, JwksVerifier};
use plinto::error::PlintoError;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{SIGNING_KEY_E, SIGNING_KEY_N, SIGNING_KEY_PEM};

const ISSUER: &str = "https://auth.example.com";

fn sign(kid: &str, claims: Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM.as_bytes()).expect("test key");
    encode(&header, &claims, &key).expect("sign")
}

fn claims(exp_offset_secs: i64) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": "usr_1",
        "email": "a@b.com",
        "iss": ISSUER,
        "iat": now,
        "exp": now + exp_offset_secs,
        "org_id": "org_1"
    })
}

async fn mount_jwks(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "public, max-age=300")
                .set_body_json(json!({
                    "keys": [
                        { "kty": "EC", "kid": "ignored", "crv": "P-256" },
                        {
                            "kty": "RSA",
                            "kid": "key-1",
                            "use": "sig",
                            "alg": "RS256",
                            "n": SIGNING_KEY_N,
                            "e": SIGNING_KEY_E
                        }
                    ]
                })),
        )
        .expect(expected)
        .mount(server)
        .await;
}

fn verifier(server: &MockServer) -> JwksVerifier {
    JwksVerifier::new(format!("{}/.well-known/jwks.json", server.uri())).with_issuer(ISSUER)
}

#[tokio::test]
async fn valid_token_verifies_and_keys_are_cached() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;
    let verifier = verifier(&server);
    let token = sign("key-1", claims(600));

    let first = verifier.verify_token(&token).await.expect("verify");
    let second = verifier.verify_token(&token).await.expect("verify from cache");

    assert_eq!(first.sub.as_deref(), Some("usr_1"));
    assert_eq!(first.email.as_deref(), Some("a@b.com"));
    assert_eq!(first.extra.get("org_id"), Some(&json!("org_1")));
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_kid_refetches_once_then_fails() {
    let server = MockServer::start().await;
    mount_jwks(&server, 2).await;
    let verifier = verifier(&server);

    let err = verifier
        .verify_token(&sign("rotated-key", claims(600)))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::KeyNotFound(kid) if kid == "rotated-key"));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let err = verifier(&server)
        .verify_token(&sign("key-1", claims(-3600)))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Verification(_)), "{err:?}");
}

#[tokio::test]
async fn wrong_issuer_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;
    let mut foreign = claims(600);
    foreign["iss"] = json!("https://evil.example.com");

    let err = verifier(&server)
        .verify_token(&sign("key-1", foreign))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Verification(_)), "{err:?}");
}

#[tokio::test]
async fn tampered_payload_fails_signature_check() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;
    let token = sign("key-1", claims(600));
    let forged = sign("key-1", {
        let mut c = claims(600);
        c["sub"] = json!("usr_admin");
        c
    });
    // Header and signature from one token, payload from another.
    let parts: Vec<&str> = token.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

    let err = verifier(&server).verify_token(&spliced).await.unwrap_err();

    assert!(matches!(err, AuthError::Verification(_)), "{err:?}");
}

#[tokio::test]
async fn client_verifies_against_its_own_jwks_endpoint() {
    let server = MockServer::start().await;
    mount_jwks(&server, 2).await;
    let (client, _store) = support::client_for(&server);

    let verified = client
        .verify_token(&sign("key-1", claims(600)))
        .await
        .expect("verify");
    assert_eq!(verified.sub.as_deref(), Some("usr_1"));

    let err = client
        .verify_token(&sign("other", claims(600)))
        .await
        .unwrap_err();
    assert!(matches!(err, PlintoError::Authentication(_)), "{err:?}");
}
