//! Request routing rules and response-to-error mapping.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ErrorDetails, PlintoError, Result};

pub(crate) const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Auth endpoints that are called without a bearer token.
const PUBLIC_AUTH_PATHS: &[&str] = &[
    "/api/v1/auth/signin",
    "/api/v1/auth/signup",
    REFRESH_PATH,
    "/api/v1/auth/verify-email",
    "/api/v1/auth/forgot-password",
    "/api/v1/auth/reset-password",
];
const OAUTH_PREFIX: &str = "/api/v1/auth/oauth/";

/// Whether a request to `path` carries `Authorization: Bearer`.
pub fn requires_auth(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path).trim_end_matches('/');
    !(PUBLIC_AUTH_PATHS.contains(&path) || path.starts_with(OAUTH_PREFIX))
}

/// Decode a successful body into `T`, or map the failure to a [`PlintoError`].
///
/// Empty bodies (e.g. `204 No Content`) decode as JSON `null`, so `()` and
/// `Option<_>` targets work for acknowledgement-only endpoints.
pub(crate) async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        if bytes.is_empty() || status == StatusCode::NO_CONTENT {
            return Ok(serde_json::from_slice(b"null")?);
        }
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let retry_after = retry_after_secs(response.headers(), Utc::now());
    let body = response.text().await.unwrap_or_default();
    Err(status_to_error(status, &body, retry_after))
}

/// Build the error for a non-success response.
pub fn status_to_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> PlintoError {
    let (details, message) = parse_error_body(body);
    let message = message
        .or_else(|| details.code.clone())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    if status == StatusCode::TOO_MANY_REQUESTS {
        let message = match retry_after {
            Some(secs) => format!("{message} (retry after {secs} seconds)"),
            None => message,
        };
        return PlintoError::RateLimited {
            retry_after_secs: retry_after,
            message,
        };
    }

    PlintoError::api_with_details(status.as_u16(), message, details)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    error_description: Option<String>,
    message: Option<String>,
    detail: Option<serde_json::Value>,
    request_id: Option<String>,
}

fn parse_error_body(body: &str) -> (ErrorDetails, Option<String>) {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        let text = body.trim();
        let message = (!text.is_empty()).then(|| text.to_string());
        return (ErrorDetails::default(), message);
    };

    // `error` is either a code string or `{code, message}`.
    let (code, nested_message) = match parsed.error {
        Some(serde_json::Value::String(code)) => (Some(code), None),
        Some(serde_json::Value::Object(obj)) => (
            obj.get("code").and_then(|v| v.as_str()).map(str::to_string),
            obj.get("message").and_then(|v| v.as_str()).map(str::to_string),
        ),
        _ => (None, None),
    };

    let message = parsed
        .error_description
        .clone()
        .or(nested_message)
        .or(parsed.message)
        .or_else(|| parsed.detail.as_ref().and_then(detail_message));

    let details = ErrorDetails {
        code,
        description: parsed.error_description,
        request_id: parsed.request_id,
    };
    (details, message)
}

/// FastAPI `detail`: a string, or a list of `{loc, msg, type}` entries.
fn detail_message(detail: &serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

/// `Retry-After` as delta-seconds or an HTTP date.
fn retry_after_secs(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some((at.with_timezone(&Utc) - now).num_seconds().max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    #[test]
    fn auth_endpoints_skip_bearer() {
        assert!(!requires_auth("/api/v1/auth/signin"));
        assert!(!requires_auth("/api/v1/auth/signup/"));
        assert!(!requires_auth("/api/v1/auth/refresh"));
        assert!(!requires_auth("/api/v1/auth/reset-password?token=x"));
        assert!(!requires_auth("/api/v1/auth/oauth/google/callback"));
    }

    #[test]
    fn everything_else_carries_bearer() {
        assert!(requires_auth("/api/v1/auth/signout"));
        assert!(requires_auth("/api/v1/auth/change-password"));
        assert!(requires_auth("/api/v1/users/me"));
        assert!(requires_auth("/api/v1/admin/users"));
    }

    #[test]
    fn error_description_wins() {
        let err = status_to_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#,
            None,
        );
        match err {
            PlintoError::Api {
                status,
                message,
                details: Some(details),
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Refresh token revoked");
                assert_eq!(details.code.as_deref(), Some("invalid_grant"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn nested_error_object_is_understood() {
        let err = status_to_error(
            StatusCode::CONFLICT,
            r#"{"error":{"code":"user_exists","message":"Email already registered"}}"#,
            None,
        );
        assert_eq!(err.code(), Some("user_exists"));
        assert!(err.to_string().contains("Email already registered"));
    }

    #[test]
    fn fastapi_validation_detail_is_joined() {
        let err = status_to_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","email"],"msg":"field required"},{"msg":"too short"}]}"#,
            None,
        );
        assert!(err.to_string().contains("field required; too short"));
    }

    #[test]
    fn falls_back_to_reason_phrase_or_text() {
        let err = status_to_error(StatusCode::BAD_GATEWAY, "", None);
        assert!(err.to_string().contains("Bad Gateway"));
        let err = status_to_error(StatusCode::BAD_GATEWAY, "upstream down", None);
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn rate_limit_message_mentions_retry_after() {
        let err = status_to_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":"rate_limited","error_description":"Too many sign-in attempts"}"#,
            Some(30),
        );
        match err {
            PlintoError::RateLimited {
                retry_after_secs,
                message,
            } => {
                assert_eq!(retry_after_secs, Some(30));
                assert_eq!(message, "Too many sign-in attempts (retry after 30 seconds)");
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn retry_after_accepts_seconds_and_dates() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));
        assert_eq!(retry_after_secs(&headers, now), Some(120));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Mon, 19 Oct 2026 12:01:30 GMT"),
        );
        assert_eq!(retry_after_secs(&headers, now), Some(90));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after_secs(&headers, now), None);
    }
}
