//! Token-aware HTTP client.
//!
//! [`PlintoClient`] owns the session: it injects the bearer token, refreshes
//! it when the API answers 401 (or when the token's `exp` has passed), and
//! retries the original request once. Concurrent callers that hit a 401 at
//! the same time share a single refresh request.

pub mod events;
pub mod http;
pub mod refresh;
mod tokens;

pub use events::{AuthEvent, AuthListener, AuthState, ListenerId};
pub use refresh::AutoRefreshHandle;

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::api::{Admin, Auth, Mfa, Organizations, Sessions, Users};
use crate::auth::jwks::JWKS_PATH;
use crate::auth::{jwt, JwksVerifier, JwtClaims, TokenResponse, TokenStore};
use crate::config::ClientConfig;
use crate::error::{PlintoError, Result};
use crate::types::User;

use self::events::EventRegistry;
use self::http::REFRESH_PATH;
use self::tokens::TokenManager;

/// Tokens this close to `exp` are refreshed before the request is sent.
const PREFLIGHT_BUFFER: Duration = Duration::from_secs(10);

/// A request against the Plinto API, relative to the configured base URL.
///
/// # Example
/// ```
/// use plinto::client::ApiRequest;
///
/// let request = ApiRequest::get("/api/v1/admin/users").with_query("page", "2");
/// assert_eq!(request.path(), "/api/v1/admin/users");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Client for the Plinto authentication API.
///
/// Cloning is cheap; clones share tokens, listeners and the refresh guard.
///
/// # Example
/// ```no_run
/// use plinto::prelude::*;
///
/// # async fn example() -> plinto::error::Result<()> {
/// let client = PlintoClient::new(ClientConfig::from_env()?)?;
/// client
///     .auth()
///     .sign_in(SignInRequest::new("ada@example.com", "Aa1!aaaa"))
///     .await?;
/// let me = client.users().me().await?;
/// println!("signed in as {}", me.email);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PlintoClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    config: ClientConfig,
    base_url: String,
    http: reqwest::Client,
    tokens: TokenManager,
    user: RwLock<Option<User>>,
    events: EventRegistry,
    state: watch::Sender<AuthState>,
    refresh_lock: Mutex<()>,
    verifier: JwksVerifier,
}

impl std::fmt::Debug for PlintoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlintoClient")
            .field("base_url", &self.inner.base_url)
            .field("storage", &self.inner.config.storage)
            .field("state", &self.auth_state())
            .finish()
    }
}

impl PlintoClient {
    /// Build a client with the storage backend named in `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = config.storage.open(config.storage_dir.clone());
        Self::with_store(config, store)
    }

    /// Build a client from `PLINTO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Build a client persisting tokens to a caller-provided store.
    pub fn with_store(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        config.api_url()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("plinto-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlintoError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let tokens = TokenManager::load(store);
        let initial = if tokens.access_token().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        let (state, _) = watch::channel(initial);
        let verifier = JwksVerifier::with_client(http.clone(), format!("{base_url}{JWKS_PATH}"));

        tracing::debug!(base_url = %base_url, storage = %config.storage, state = %initial, "Plinto client created");

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                base_url,
                http,
                tokens,
                user: RwLock::new(None),
                events: EventRegistry::default(),
                state,
                refresh_lock: Mutex::new(()),
                verifier,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Absolute URL of an API path.
    pub fn endpoint_url(&self, path: &str) -> Result<reqwest::Url> {
        let raw = format!("{}{}", self.inner.base_url, path);
        reqwest::Url::parse(&raw)
            .map_err(|e| PlintoError::Configuration(format!("invalid endpoint URL '{raw}': {e}")))
    }

    // ------------------------------------------------------------------
    // Endpoint groups
    // ------------------------------------------------------------------

    pub fn auth(&self) -> Auth<'_> {
        Auth::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn sessions(&self) -> Sessions<'_> {
        Sessions::new(self)
    }

    pub fn organizations(&self) -> Organizations<'_> {
        Organizations::new(self)
    }

    pub fn mfa(&self) -> Mfa<'_> {
        Mfa::new(self)
    }

    pub fn admin(&self) -> Admin<'_> {
        Admin::new(self)
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    pub fn access_token(&self) -> Option<String> {
        self.inner.tokens.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.tokens.refresh_token()
    }

    /// An access token is held and its `exp` (if readable) has not passed.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .tokens
            .access_token()
            .is_some_and(|token| !token_expiring(&token, Duration::ZERO))
    }

    /// Adopt credentials obtained elsewhere (e.g. a server-side sign-in).
    pub fn set_tokens(&self, tokens: &TokenResponse) {
        self.inner.tokens.save(tokens);
        self.set_state(AuthState::Authenticated);
    }

    /// Drop tokens from memory and storage. Calling it again is a no-op.
    pub fn clear_tokens(&self) {
        self.inner.tokens.clear();
        self.set_cached_user(None);
        self.set_state(AuthState::Unauthenticated);
    }

    /// Last user profile returned by the API, if any.
    pub fn current_user(&self) -> Option<User> {
        self.inner
            .user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn auth_state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    /// Receiver that observes every [`AuthState`] transition.
    pub fn watch_state(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Register an observer for [`AuthEvent`]s on this client.
    pub fn on_auth_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(Arc::new(listener))
    }

    /// Returns `false` if the listener was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Verify a token's signature against the API's JWKS.
    ///
    /// Unlike [`crate::auth::decode_jwt`], the result can be trusted.
    pub async fn verify_token(&self, token: &str) -> Result<JwtClaims> {
        Ok(self.inner.verifier.verify_token(token).await?)
    }

    /// Exchange the refresh token for a new access token now.
    pub async fn refresh_session(&self) -> Result<TokenResponse> {
        let _guard = self.inner.refresh_lock.lock().await;
        self.perform_refresh().await
    }

    /// Spawn the background task that refreshes tokens nearing expiry.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_auto_refresh(&self) -> AutoRefreshHandle {
        refresh::spawn(self)
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::patch(path).with_json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Send a request and decode its JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(&request).await?;
        http::parse_response(response).await
    }

    /// Send with the current access token as-is: no pre-flight refresh and
    /// no retry after a 401.
    pub(crate) async fn send_once<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let token = self.inner.tokens.access_token();
        let response = self.dispatch(&request, token.as_deref()).await?;
        http::parse_response(response).await
    }

    async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        if !http::requires_auth(&request.path) {
            return self.dispatch(request, None).await;
        }

        self.refresh_if_expiring(PREFLIGHT_BUFFER).await?;

        let token = self.inner.tokens.access_token();
        let response = self.dispatch(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED
            || self.inner.tokens.refresh_token().is_none()
        {
            return Ok(response);
        }

        tracing::debug!(path = %request.path, "Access token rejected, refreshing");
        self.refresh_stale(token.as_deref()).await?;

        let token = self.inner.tokens.access_token();
        let retried = self.dispatch(request, token.as_deref()).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %request.path, "Request rejected after refresh, ending session");
            self.end_session(AuthEvent::SessionExpired);
        }
        Ok(retried)
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(api_key) = &self.inner.config.api_key {
            builder = builder.header("X-API-Key", api_key);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|err| {
            tracing::debug!(method = %request.method, path = %request.path, error = %err, "Plinto request failed");
            PlintoError::Network(err)
        })?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Plinto request"
        );
        Ok(response)
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// Refresh if the access token's `exp` falls within `buffer`.
    ///
    /// Returns whether a refresh happened. Opaque tokens and tokens without
    /// `exp` are left for the server to judge.
    pub(crate) async fn refresh_if_expiring(&self, buffer: Duration) -> Result<bool> {
        let pair = self.inner.tokens.snapshot();
        let (Some(access), Some(_)) = (pair.access_token, pair.refresh_token) else {
            return Ok(false);
        };
        if !token_expiring(&access, buffer) {
            return Ok(false);
        }
        self.refresh_stale(Some(&access)).await
    }

    /// Refresh on behalf of a caller holding `stale`. If another caller
    /// already replaced that token while we waited for the guard, reuse its
    /// result instead of issuing a second refresh.
    async fn refresh_stale(&self, stale: Option<&str>) -> Result<bool> {
        let _guard = self.inner.refresh_lock.lock().await;
        let current = self.inner.tokens.access_token();
        if current.is_some() && current.as_deref() != stale {
            return Ok(false);
        }
        self.perform_refresh().await.map(|_| true)
    }

    /// Caller must hold `refresh_lock`.
    async fn perform_refresh(&self) -> Result<TokenResponse> {
        let Some(refresh_token) = self.inner.tokens.refresh_token() else {
            return Err(PlintoError::NotAuthenticated);
        };

        self.set_state(AuthState::Refreshing);
        let request = ApiRequest::post(REFRESH_PATH)
            .with_json(&serde_json::json!({ "refresh_token": refresh_token }))?;
        let result = match self.dispatch(&request, None).await {
            Ok(response) => http::parse_response::<TokenResponse>(response).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(tokens) => {
                self.inner.tokens.save(&tokens);
                self.set_state(AuthState::Authenticated);
                tracing::info!(expires_in = tokens.expires_in, "Access token refreshed");
                self.inner.events.emit(&AuthEvent::TokenRefreshed);
                Ok(tokens)
            }
            Err(err) if rejects_refresh_token(&err) => {
                tracing::warn!(error = %err, "Refresh token rejected, ending session");
                self.end_session(AuthEvent::SessionExpired);
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, keeping session");
                self.set_state(AuthState::Authenticated);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Hooks for endpoint groups
    // ------------------------------------------------------------------

    /// Adopt the credentials and user from a sign-in/sign-up response.
    pub(crate) fn begin_session(&self, tokens: Option<&TokenResponse>, user: Option<&User>) {
        if let Some(tokens) = tokens {
            self.inner.tokens.save(tokens);
            self.set_state(AuthState::Authenticated);
        }
        if let Some(user) = user {
            self.set_cached_user(Some(user.clone()));
        }
    }

    pub(crate) fn end_session(&self, event: AuthEvent) {
        self.clear_tokens();
        self.inner.events.emit(&event);
    }

    pub(crate) fn set_cached_user(&self, user: Option<User>) {
        *self
            .inner
            .user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        self.inner.events.emit(&event);
    }

    fn set_state(&self, next: AuthState) {
        let changed = self.inner.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            tracing::debug!(state = %next, "Auth state changed");
        }
    }
}

/// Only an explicit rejection invalidates the refresh token. Outages,
/// throttling and undecodable bodies leave it usable for a later attempt.
fn rejects_refresh_token(err: &PlintoError) -> bool {
    matches!(err, PlintoError::Api { status: 400 | 401 | 403, .. })
}

fn token_expiring(token: &str, buffer: Duration) -> bool {
    jwt::decode_jwt(token).is_ok_and(|claims| jwt::is_expired_at(&claims, buffer, Utc::now()))
}
