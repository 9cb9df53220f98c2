//! Plinto: Rust client SDK for the Plinto authentication API.
//!
//! Handles the session lifecycle for you: tokens are persisted in a
//! pluggable [`auth::TokenStore`], attached to every request, refreshed when
//! the API answers 401 (concurrent callers share one refresh), and cleared
//! when the refresh token is no longer accepted.
//!
//! # Quick Start
//!
//! ```no_run
//! use plinto::prelude::*;
//!
//! # async fn example() -> plinto::error::Result<()> {
//! let client = PlintoClient::new(
//!     ClientConfig::builder()
//!         .base_url("https://auth.example.com")
//!         .build(),
//! )?;
//! client.on_auth_change(|event| println!("auth event: {}", event.name()));
//!
//! client
//!     .auth()
//!     .sign_in(SignInRequest::new("ada@example.com", "Aa1!aaaa"))
//!     .await?;
//! for session in client.sessions().list().await? {
//!     println!("{} {:?}", session.id, session.device_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::PlintoClient;
