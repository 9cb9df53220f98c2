#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use plinto::auth::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use plinto::auth::{MemoryTokenStore, TokenStore};
use plinto::client::AuthEvent;
use plinto::config::ClientConfig;
use plinto::PlintoClient;
use serde_json::{json, Value};
use wiremock::MockServer;

/// RSA key used to sign tokens served by the mock JWKS endpoint.
pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/jwks_signing_key.pem");
/// Public modulus of [`SIGNING_KEY_PEM`], base64url.
pub const SIGNING_KEY_N: &str = "m9OKINbT9FK7Ji5GEMitZITEvYSgw5TUykFZE2s-kym_kF1rNou0-ttoLS7PvXj3jVo8XhPx65RSswsIoMb_4AXtUYrTRuIb9g0I5nnVg6e6UNteylZMgU_HKyfVGR0VGa7HbSIQ-US949LjP0kPKr1ZHMGXaIEjIa96zFcGnuWW-N-7PA0BLKBBMxpezLuyygJbO3ZL2d31zI1bWm7Y2A9vSWkYZcynlvmz6_QsgApWNxJ-3VGzitbC1t6zrSTzQMclvSjDV5EHBs8Kn8ZO2Di3-DPF83-uUuOcKB_PQD7ez1b0eJff8b7yWO-tgTdM9sF6YfzMtfrjGVpGDxbn0w";
pub const SIGNING_KEY_E: &str = "AQAB";

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .build()
}

/// Client backed by a memory store the test can inspect.
pub fn client_for(server: &MockServer) -> (PlintoClient, Arc<MemoryTokenStore>) {
    client_with(config_for(server))
}

pub fn client_with(config: ClientConfig) -> (PlintoClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let client = PlintoClient::with_store(config, store.clone()).expect("client");
    (client, store)
}

/// Client whose store already holds a session.
pub fn signed_in_client(
    server: &MockServer,
    access: &str,
    refresh: Option<&str>,
) -> (PlintoClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    seed(store.as_ref(), access, refresh);
    let client = PlintoClient::with_store(config_for(server), store.clone()).expect("client");
    (client, store)
}

pub fn seed(store: &dyn TokenStore, access: &str, refresh: Option<&str>) {
    store.set(ACCESS_TOKEN_KEY, access).expect("seed access");
    if let Some(refresh) = refresh {
        store.set(REFRESH_TOKEN_KEY, refresh).expect("seed refresh");
    }
}

pub fn stored(store: &dyn TokenStore) -> (Option<String>, Option<String>) {
    (
        store.get(ACCESS_TOKEN_KEY).expect("read access"),
        store.get(REFRESH_TOKEN_KEY).expect("read refresh"),
    )
}

/// Unsigned JWT carrying `claims`; enough for local expiry checks.
pub fn unsigned_jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Unsigned JWT whose `exp` is `secs` from now (negative for the past).
pub fn jwt_expiring_in(secs: i64) -> String {
    unsigned_jwt(json!({
        "sub": "usr_1",
        "exp": Utc::now().timestamp() + secs,
    }))
}

pub fn user_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "email_verified": true,
        "name": "Ada Lovelace",
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-02T00:00:00Z"
    })
}

pub fn token_json(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 3600,
        "token_type": "bearer"
    })
}

/// Collects event names delivered to an `on_auth_change` listener.
pub fn record_events(client: &PlintoClient) -> Arc<Mutex<Vec<&'static str>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_auth_change(move |event: &AuthEvent| {
        sink.lock().expect("events lock poisoned").push(event.name());
    });
    seen
}

pub fn events(seen: &Arc<Mutex<Vec<&'static str>>>) -> Vec<&'static str> {
    seen.lock().expect("events lock poisoned").clone()
}
