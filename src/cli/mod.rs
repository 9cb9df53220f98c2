//! CLI entry point for Plinto.

pub mod auth;

use clap::{Parser, Subcommand};

/// Plinto authentication CLI
#[derive(Parser, Debug)]
#[command(name = "plinto", version, about = "Plinto authentication API CLI")]
pub struct Cli {
    /// API base URL (overrides PLINTO_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// Show the signed-in user
    Whoami,
    /// Offline JWT and PKCE helpers
    Token(TokenArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with email and password
    Signin(SigninArgs),
    /// Create an account
    Signup(SignupArgs),
    /// End the stored session
    Signout,
    /// Show the stored session
    Status,
    /// Exchange the refresh token for a new access token
    Refresh,
}

/// Arguments for `plinto auth signin`.
#[derive(Parser, Debug)]
pub struct SigninArgs {
    pub email: String,

    /// Password (prompted on stdin when omitted)
    #[arg(long, env = "PLINTO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for `plinto auth signup`.
#[derive(Parser, Debug)]
pub struct SignupArgs {
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Password (prompted on stdin when omitted)
    #[arg(long, env = "PLINTO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommands,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Print a JWT's claims without verifying it
    Decode {
        /// Token to decode (the stored access token when omitted)
        token: Option<String>,
    },
    /// Generate a PKCE verifier/challenge pair
    Pkce,
}
