use serde::{Deserialize, Serialize};

use crate::types::User;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "plinto_access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "plinto_refresh_token";

/// Session credentials issued by `signin`, `signup` and `refresh`.
///
/// # Example
/// ```
/// use plinto::auth::TokenResponse;
///
/// let tokens: TokenResponse = serde_json::from_str(
///     r#"{"access_token":"a","refresh_token":"r","expires_in":3600}"#,
/// ).unwrap();
/// assert_eq!(tokens.token_type, "bearer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Response of `signin` / `signup`: credentials plus the signed-in user.
///
/// `signup` may omit credentials when the server requires email
/// verification before the first sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: Option<TokenResponse>,
    #[serde(default)]
    pub user: Option<User>,
}

/// The pair of tokens the client keeps in memory and in its store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}
