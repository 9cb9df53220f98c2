//! `/api/v1/auth/*`: sign-in, sign-up, password flows and OAuth.

use serde::de::IgnoredAny;
use serde_json::json;

use crate::api::{acknowledge, segment};
use crate::auth::pkce::{generate_state, PkceChallenge, CHALLENGE_METHOD};
use crate::auth::validation::{require_password, validate_email, validate_password};
use crate::auth::{AuthResponse, TokenResponse};
use crate::client::{ApiRequest, AuthEvent, PlintoClient};
use crate::error::{PlintoError, Result};
use crate::types::{MessageResponse, SignInRequest, SignUpRequest};

/// Authentication endpoints. Obtained from [`PlintoClient::auth`].
#[derive(Debug, Clone, Copy)]
pub struct Auth<'a> {
    client: &'a PlintoClient,
}

/// An OAuth authorization in progress.
///
/// Keep it until the provider redirects back, then hand it to
/// [`Auth::exchange_oauth_code`] together with the returned `code` and
/// `state`.
#[derive(Debug, Clone)]
pub struct OAuthSession {
    pub provider: String,
    pub redirect_uri: String,
    pub state: String,
    pub pkce: PkceChallenge,
    /// Where to send the user's browser.
    pub authorization_url: reqwest::Url,
}

impl<'a> Auth<'a> {
    pub(crate) fn new(client: &'a PlintoClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password and adopt the returned session.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<AuthResponse> {
        validate_email(&request.email)?;
        require_password(&request.password)?;

        let response: AuthResponse = self.client.post("/api/v1/auth/signin", &request).await?;
        let Some(tokens) = response.tokens.as_ref() else {
            return Err(PlintoError::Authentication(
                "sign-in response did not include an access token".to_string(),
            ));
        };
        self.client.begin_session(Some(tokens), response.user.as_ref());
        tracing::info!(
            user_id = response.user.as_ref().map(|u| u.id.as_str()),
            "Signed in"
        );
        self.client.emit(AuthEvent::SignedIn {
            user: response.user.clone(),
        });
        Ok(response)
    }

    /// Register a new account.
    ///
    /// Servers that require email verification answer without tokens; the
    /// client then stays unauthenticated.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse> {
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let response: AuthResponse = self.client.post("/api/v1/auth/signup", &request).await?;
        self.client
            .begin_session(response.tokens.as_ref(), response.user.as_ref());
        tracing::info!(
            user_id = response.user.as_ref().map(|u| u.id.as_str()),
            signed_in = response.tokens.is_some(),
            "Signed up"
        );
        self.client.emit(AuthEvent::SignedUp {
            user: response.user.clone(),
        });
        Ok(response)
    }

    /// Tell the server (best-effort) and drop the local session. The server
    /// call never refreshes, so listeners only see `SignedOut`.
    pub async fn sign_out(&self) -> Result<()> {
        if self.client.access_token().is_some() {
            let request = ApiRequest::post("/api/v1/auth/signout").with_json(&json!({}))?;
            if let Err(err) = self.client.send_once::<IgnoredAny>(request).await {
                tracing::warn!(error = %err, "Server sign-out failed, clearing local session anyway");
            }
        }
        self.client.end_session(AuthEvent::SignedOut);
        tracing::info!("Signed out");
        Ok(())
    }

    /// Exchange the refresh token now. See [`PlintoClient::refresh_session`].
    pub async fn refresh(&self) -> Result<TokenResponse> {
        self.client.refresh_session().await
    }

    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse> {
        if token.is_empty() {
            return Err(PlintoError::validation("token", "verification token is required"));
        }
        let request =
            ApiRequest::post("/api/v1/auth/verify-email").with_json(&json!({ "token": token }))?;
        acknowledge(self.client, request).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        validate_email(email)?;
        let request = ApiRequest::post("/api/v1/auth/forgot-password")
            .with_json(&json!({ "email": email }))?;
        acknowledge(self.client, request).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse> {
        if token.is_empty() {
            return Err(PlintoError::validation("token", "reset token is required"));
        }
        validate_password(new_password)?;
        let request = ApiRequest::post("/api/v1/auth/reset-password")
            .with_json(&json!({ "token": token, "new_password": new_password }))?;
        acknowledge(self.client, request).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        require_password(current_password)?;
        validate_password(new_password)?;
        let request = ApiRequest::post("/api/v1/auth/change-password").with_json(&json!({
            "current_password": current_password,
            "new_password": new_password,
        }))?;
        acknowledge(self.client, request).await
    }

    /// Start an OAuth authorization-code flow protected by PKCE (S256).
    pub fn oauth_authorize_url(&self, provider: &str, redirect_uri: &str) -> Result<OAuthSession> {
        if provider.is_empty() {
            return Err(PlintoError::validation("provider", "OAuth provider is required"));
        }
        reqwest::Url::parse(redirect_uri).map_err(|e| {
            PlintoError::validation("redirect_uri", format!("'{redirect_uri}' is not a URL: {e}"))
        })?;

        let pkce = PkceChallenge::new();
        let state = generate_state();
        let mut url = self
            .client
            .endpoint_url(&format!("/api/v1/auth/oauth/{}/authorize", segment(provider)))?;
        url.query_pairs_mut()
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);

        tracing::debug!(provider, "OAuth authorization started");
        Ok(OAuthSession {
            provider: provider.to_string(),
            redirect_uri: redirect_uri.to_string(),
            state,
            pkce,
            authorization_url: url,
        })
    }

    /// Finish an OAuth flow and adopt the returned session.
    ///
    /// `state` must be the value the provider echoed back.
    pub async fn exchange_oauth_code(
        &self,
        session: &OAuthSession,
        code: &str,
        state: &str,
    ) -> Result<AuthResponse> {
        if state != session.state {
            return Err(PlintoError::validation(
                "state",
                "OAuth state does not match the authorization request",
            ));
        }
        if code.is_empty() {
            return Err(PlintoError::validation("code", "authorization code is required"));
        }

        let path = format!("/api/v1/auth/oauth/{}/callback", segment(&session.provider));
        let request = ApiRequest::post(path).with_json(&json!({
            "code": code,
            "state": state,
            "code_verifier": session.pkce.verifier,
            "redirect_uri": session.redirect_uri,
        }))?;
        let response: AuthResponse = self.client.send(request).await?;
        let Some(tokens) = response.tokens.as_ref() else {
            return Err(PlintoError::Authentication(
                "OAuth callback did not include an access token".to_string(),
            ));
        };
        self.client.begin_session(Some(tokens), response.user.as_ref());
        tracing::info!(provider = %session.provider, "Signed in with OAuth");
        self.client.emit(AuthEvent::SignedIn {
            user: response.user.clone(),
        });
        Ok(response)
    }
}
