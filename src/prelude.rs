//! Convenience re-exports for common use.

pub use crate::auth::{AuthResponse, StorageKind, TokenResponse, TokenStore};
pub use crate::client::{ApiRequest, AuthEvent, AuthState, PlintoClient};
pub use crate::config::ClientConfig;
pub use crate::error::{PlintoError, Result};
pub use crate::types::{SignInRequest, SignUpRequest, UpdateUserRequest, User};
pub use crate::util::retry::RetryPolicy;
