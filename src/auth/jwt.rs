//! Local JWT payload decoding.
//!
//! Nothing here checks signatures. The decoded claims are an expiry hint for
//! deciding when to refresh; trust decisions belong to the server or to
//! [`crate::auth::jwks::JwksVerifier`].

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Claims carried in a Plinto access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// String or array of strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JwtClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }
}

/// Decode the payload segment of a JWT without verifying it.
pub fn decode_jwt(token: &str) -> Result<JwtClaims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("payload is not a JSON object: {e}")))
}

/// Expiry of a token, if it decodes and carries `exp`.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode_jwt(token).ok()?.expires_at()
}

/// Whether `token` is expired, or will be within `buffer`.
///
/// Tokens that cannot be decoded count as expired.
pub fn is_token_expired(token: &str, buffer: Duration) -> bool {
    match decode_jwt(token) {
        Ok(claims) => is_expired_at(&claims, buffer, Utc::now()),
        Err(_) => true,
    }
}

/// Pure expiry check: expired when `exp <= now + buffer`.
///
/// Claims without `exp` never expire locally.
pub fn is_expired_at(claims: &JwtClaims, buffer: Duration, now: DateTime<Utc>) -> bool {
    let Some(exp) = claims.exp else {
        return false;
    };
    let buffer_secs = i64::try_from(buffer.as_secs()).unwrap_or(i64::MAX);
    exp <= now.timestamp().saturating_add(buffer_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unsigned_token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.sig")
    }

    #[test]
    fn decodes_standard_and_extra_claims() {
        let token = unsigned_token(json!({
            "sub": "user_1",
            "exp": 1_900_000_000,
            "email": "a@b.com",
            "org_id": "org_9",
            "roles": ["admin"]
        }));
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user_1"));
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.extra.get("org_id"), Some(&json!("org_9")));
        assert_eq!(claims.extra.get("roles"), Some(&json!(["admin"])));
    }

    #[test]
    fn tolerates_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(br#"{"sub":"abc"}"#);
        assert!(body.ends_with('='));
        let claims = decode_jwt(&format!("{header}.{body}.x")).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(decode_jwt("abc"), Err(AuthError::MalformedToken(_))));
        assert!(matches!(decode_jwt("a.b.c.d"), Err(AuthError::MalformedToken(_))));
    }

    #[test]
    fn rejects_non_json_payload() {
        let body = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(
            decode_jwt(&format!("h.{body}.s")),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let buffer = Duration::from_secs(30);
        let at_boundary = JwtClaims {
            exp: Some(1_700_000_030),
            ..Default::default()
        };
        let after_boundary = JwtClaims {
            exp: Some(1_700_000_031),
            ..Default::default()
        };
        assert!(is_expired_at(&at_boundary, buffer, now));
        assert!(!is_expired_at(&after_boundary, buffer, now));
    }

    #[test]
    fn claims_without_exp_do_not_expire() {
        let now = Utc::now();
        assert!(!is_expired_at(&JwtClaims::default(), Duration::from_secs(3600), now));
    }

    #[test]
    fn undecodable_token_counts_as_expired() {
        assert!(is_token_expired("opaque-token", Duration::ZERO));
    }

    #[test]
    fn is_token_expired_uses_wall_clock() {
        let fresh = unsigned_token(json!({ "exp": Utc::now().timestamp() + 3600 }));
        let stale = unsigned_token(json!({ "exp": Utc::now().timestamp() - 10 }));
        assert!(!is_token_expired(&fresh, Duration::from_secs(60)));
        assert!(is_token_expired(&fresh, Duration::from_secs(7200)));
        assert!(is_token_expired(&stale, Duration::ZERO));
        assert!(expires_at(&fresh).is_some());
        assert!(expires_at("opaque").is_none());
    }
}
