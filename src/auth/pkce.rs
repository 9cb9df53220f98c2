//! PKCE (RFC 7636) helpers for OAuth authorization-code flows.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Only supported challenge method.
pub const CHALLENGE_METHOD: &str = "S256";

/// A verifier together with its derived challenge.
///
/// # Example
/// ```
/// use plinto::auth::pkce::{generate_code_challenge, PkceChallenge};
///
/// let pkce = PkceChallenge::new();
/// assert_eq!(pkce.challenge, generate_code_challenge(&pkce.verifier));
/// assert_eq!(pkce.method, "S256");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
    pub method: &'static str,
}

impl PkceChallenge {
    pub fn new() -> Self {
        let verifier = generate_code_verifier();
        let challenge = generate_code_challenge(&verifier);
        Self {
            verifier,
            challenge,
            method: CHALLENGE_METHOD,
        }
    }
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

/// 32 bytes from two v4 UUIDs (244 random bits), base64url without
/// padding (43 characters).
pub fn generate_code_verifier() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<32>())
}

/// `base64url(SHA-256(verifier))`.
pub fn generate_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Opaque anti-CSRF value for the `state` parameter.
pub fn generate_state() -> String {
    random_bytes::<32>()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

// v4 UUIDs are filled from the OS CSPRNG; each fixes 6 version/variant bits.
fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    for chunk in buf.chunks_mut(16) {
        let id = uuid::Uuid::new_v4();
        let len = chunk.len();
        chunk.copy_from_slice(&id.as_bytes()[..len]);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_has_rfc_length_and_alphabet() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 43);
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn random_bytes_come_from_independent_uuids() {
        let bytes = random_bytes::<32>();
        assert_ne!(bytes[..16], bytes[16..]);
        // Version nibble of each v4 UUID.
        assert_eq!(bytes[6] >> 4, 4);
        assert_eq!(bytes[22] >> 4, 4);
    }

    #[test]
    fn verifiers_are_unique() {
        assert_ne!(generate_code_verifier(), generate_code_verifier());
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn challenge_is_deterministic() {
        let verifier = generate_code_verifier();
        assert_eq!(
            generate_code_challenge(&verifier),
            generate_code_challenge(&verifier)
        );
    }

    #[test]
    fn challenge_matches_rfc7636_appendix_b() {
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn state_is_hex() {
        let state = generate_state();
        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
