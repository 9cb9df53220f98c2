//! Handlers for `plinto auth`, `plinto whoami` and `plinto token`.

use std::io::Write;

use chrono::Utc;

use crate::auth::jwt::{decode_jwt, JwtClaims};
use crate::auth::pkce::{generate_state, PkceChallenge};
use crate::config::ClientConfig;
use crate::types::{SignInRequest, SignUpRequest};
use crate::PlintoClient;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Client over the environment's configuration and the on-disk token store.
pub fn build_client(api_url: Option<&str>) -> Result<PlintoClient, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config.base_url = url.to_string();
    }
    Ok(PlintoClient::new(config)?)
}

fn read_password(provided: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(password) = provided {
        return Ok(password);
    }
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Handle `plinto auth signin <email>`.
pub async fn handle_signin(
    client: &PlintoClient,
    email: &str,
    password: Option<String>,
) -> CliResult {
    let password = read_password(password)?;
    let response = client
        .auth()
        .sign_in(SignInRequest::new(email, password))
        .await?;
    match response.user {
        Some(user) => println!("✅ Signed in as {}", user.email),
        None => println!("✅ Signed in"),
    }
    Ok(())
}

/// Handle `plinto auth signup <email>`.
pub async fn handle_signup(
    client: &PlintoClient,
    email: &str,
    name: Option<String>,
    password: Option<String>,
) -> CliResult {
    let password = read_password(password)?;
    let request = SignUpRequest::builder()
        .email(email)
        .password(password)
        .maybe_name(name)
        .build();
    let response = client.auth().sign_up(request).await?;
    if response.tokens.is_some() {
        println!("✅ Account created and signed in");
    } else {
        println!("📧 Account created. Check {email} for a verification link.");
    }
    Ok(())
}

/// Handle `plinto auth signout`.
pub async fn handle_signout(client: &PlintoClient) -> CliResult {
    client.auth().sign_out().await?;
    println!("✅ Signed out");
    Ok(())
}

/// Handle `plinto auth refresh`.
pub async fn handle_refresh(client: &PlintoClient) -> CliResult {
    let tokens = client.refresh_session().await?;
    println!("✅ Access token refreshed (expires in {}s)", tokens.expires_in);
    Ok(())
}

/// Handle `plinto auth status`. Works offline.
pub fn handle_status(client: &PlintoClient) -> CliResult {
    println!("🔐 Plinto session ({})\n", client.config().base_url);

    let Some(access) = client.access_token() else {
        println!("  ❌ Not signed in");
        return Ok(());
    };

    match decode_jwt(&access) {
        Ok(claims) => {
            if let Some(subject) = &claims.sub {
                println!("  Subject: {subject}");
            }
            if let Some(email) = &claims.email {
                println!("  Email:   {email}");
            }
            let status = match claims.expires_at() {
                Some(expires) if expires > Utc::now() => format!(
                    "✅ Signed in (expires {})",
                    expires.format("%Y-%m-%d %H:%M")
                ),
                Some(_) => "⚠️  Access token expired (will refresh on next request)".to_string(),
                None => "✅ Signed in".to_string(),
            };
            println!("  Status:  {status}");
        }
        Err(_) => println!("  Status:  ✅ Signed in (opaque token)"),
    }

    let refresh = if client.refresh_token().is_some() {
        "✅ Stored"
    } else {
        "❌ None"
    };
    println!("  Refresh: {refresh}");
    Ok(())
}

/// Handle `plinto whoami`.
pub async fn handle_whoami(client: &PlintoClient) -> CliResult {
    let user = client.users().me().await?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

/// Handle `plinto token decode [jwt]`.
pub fn handle_decode(client: &PlintoClient, token: Option<String>) -> CliResult {
    let Some(token) = token.or_else(|| client.access_token()) else {
        return Err("no token given and none stored".into());
    };
    let claims: JwtClaims = decode_jwt(&token)?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    if let Some(expires) = claims.expires_at() {
        let state = if expires > Utc::now() { "expires" } else { "expired" };
        eprintln!("{state} {}", expires.to_rfc3339());
    }
    Ok(())
}

/// Handle `plinto token pkce`.
pub fn handle_pkce() -> CliResult {
    let pkce = PkceChallenge::new();
    println!("code_verifier:         {}", pkce.verifier);
    println!("code_challenge:        {}", pkce.challenge);
    println!("code_challenge_method: {}", pkce.method);
    println!("state:                 {}", generate_state());
    Ok(())
}
