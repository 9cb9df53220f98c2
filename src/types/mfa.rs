use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaStatus {
    pub enabled: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub backup_codes_remaining: u32,
}

/// TOTP enrolment material returned by `POST /api/v1/mfa/enable`.
///
/// MFA stays inactive until a code from the authenticator is confirmed
/// through `POST /api/v1/mfa/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaSetup {
    pub secret: String,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub provisioning_uri: Option<String>,
    #[serde(default)]
    pub backup_codes: Vec<String>,
}
