//! `/api/v1/mfa/*`: TOTP enrolment for the signed-in user.

use serde::Deserialize;
use serde_json::json;

use crate::api::acknowledge;
use crate::client::{ApiRequest, PlintoClient};
use crate::error::{PlintoError, Result};
use crate::types::{MessageResponse, MfaSetup, MfaStatus};

#[derive(Debug, Clone, Copy)]
pub struct Mfa<'a> {
    client: &'a PlintoClient,
}

#[derive(Deserialize)]
struct BackupCodes {
    backup_codes: Vec<String>,
}

/// Authenticator codes are six digits; backup codes are longer and
/// alphanumeric, so only emptiness and whitespace are rejected here.
fn check_code(code: &str) -> Result<()> {
    if code.is_empty() || code.chars().any(char::is_whitespace) {
        return Err(PlintoError::validation("code", "MFA code is required"));
    }
    Ok(())
}

impl<'a> Mfa<'a> {
    pub(crate) fn new(client: &'a PlintoClient) -> Self {
        Self { client }
    }

    pub async fn status(&self) -> Result<MfaStatus> {
        self.client.get("/api/v1/mfa/status").await
    }

    /// Begin enrolment. MFA is active only after [`Mfa::verify`].
    pub async fn enable(&self) -> Result<MfaSetup> {
        self.client.post("/api/v1/mfa/enable", &json!({})).await
    }

    pub async fn verify(&self, code: &str) -> Result<MessageResponse> {
        check_code(code)?;
        let request = ApiRequest::post("/api/v1/mfa/verify").with_json(&json!({ "code": code }))?;
        acknowledge(self.client, request).await
    }

    pub async fn disable(&self, code: &str) -> Result<MessageResponse> {
        check_code(code)?;
        let request = ApiRequest::post("/api/v1/mfa/disable").with_json(&json!({ "code": code }))?;
        acknowledge(self.client, request).await
    }

    /// Invalidate the old backup codes and return a fresh set.
    pub async fn regenerate_backup_codes(&self) -> Result<Vec<String>> {
        let codes: BackupCodes = self
            .client
            .post("/api/v1/mfa/backup-codes", &json!({}))
            .await?;
        Ok(codes.backup_codes)
    }
}
