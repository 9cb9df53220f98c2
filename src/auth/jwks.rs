//! Signature verification against the API's published JWKS.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;
use super::jwt::JwtClaims;

/// Path of the key set relative to the API base URL.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
const SUPPORTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifies access tokens with RSA keys fetched from a JWKS endpoint.
///
/// Keys are cached by `kid`. An unknown `kid` forces one refetch, so key
/// rotation on the server is picked up without waiting for the TTL.
///
/// # Example
/// ```no_run
/// use plinto::auth::JwksVerifier;
///
/// # async fn example(token: &str) -> Result<(), plinto::auth::AuthError> {
/// let verifier = JwksVerifier::new("https://auth.example.com/.well-known/jwks.json")
///     .with_issuer("https://auth.example.com");
/// let claims = verifier.verify_token(token).await?;
/// println!("subject: {:?}", claims.sub);
/// # Ok(())
/// # }
/// ```
pub struct JwksVerifier {
    http_client: reqwest::Client,
    jwks_url: String,
    issuer: Option<String>,
    audience: Option<String>,
    cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl JwksVerifier {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), jwks_url)
    }

    pub fn with_client(http_client: reqwest::Client, jwks_url: impl Into<String>) -> Self {
        Self {
            http_client,
            jwks_url: jwks_url.into(),
            issuer: None,
            audience: None,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Verify signature, expiry and the configured issuer/audience.
    pub async fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::MalformedToken(format!("invalid JWT header: {e}")))?;

        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::Verification(format!(
                "unsupported JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::Verification("missing JWT kid".to_string()))?;
        let key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = CLOCK_SKEW_SECS;
        validation.validate_nbf = true;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        let data = decode::<JwtClaims>(token, key.as_ref(), &validation)
            .map_err(|e| AuthError::Verification(e.to_string()))?;
        tracing::debug!(kid = %kid, subject = ?data.claims.sub, "Token signature verified");
        Ok(data.claims)
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        for force_refresh in [false, true] {
            self.refresh_keys(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(AuthError::KeyNotFound(kid.to_string()))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_keys(&self, force_refresh: bool) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited on the lock.
        if !force_refresh
            && self
                .cache
                .read()
                .await
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
        {
            return Ok(());
        }

        tracing::debug!(jwks_url = %self.jwks_url, "Refreshing JWKS cache");

        let response = self.http_client.get(&self.jwks_url).send().await?;
        if !response.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);
        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("invalid JWKS JSON: {e}")))?;

        let mut keys_by_kid = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
                continue;
            }
            if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
                continue;
            }
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(err) => {
                    tracing::warn!(error = %err, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                }
            }
        }

        if keys_by_kid.is_empty() {
            return Err(AuthError::InvalidResponse(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });
        tracing::debug!(ttl_secs = ttl.as_secs(), "JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
    #[serde(rename = "use")]
    use_: Option<String>,
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value.split(',').find_map(|directive| {
                directive
                    .trim()
                    .strip_prefix("max-age=")
                    .and_then(|secs| secs.trim().parse::<u64>().ok())
            })
        })
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}
