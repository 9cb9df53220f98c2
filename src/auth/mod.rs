//! Token storage, JWT/PKCE helpers and JWKS verification.

pub mod error;
pub mod jwks;
pub mod jwt;
pub mod pkce;
pub mod store;
pub mod token;
pub mod validation;

pub use error::AuthError;
pub use jwks::JwksVerifier;
pub use jwt::{decode_jwt, is_token_expired, JwtClaims};
pub use pkce::{generate_code_challenge, generate_code_verifier, PkceChallenge};
pub use store::{FallbackTokenStore, FileTokenStore, MemoryTokenStore, StorageKind, TokenStore};
pub use token::{AuthResponse, TokenPair, TokenResponse};
