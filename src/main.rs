//! Plinto CLI binary entry point.

use clap::Parser;
use plinto::cli::{auth, AuthCommands, Cli, Commands, TokenCommands};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Token(args) = &cli.command {
        if let TokenCommands::Pkce = args.command {
            return auth::handle_pkce();
        }
    }

    let client = auth::build_client(cli.api_url.as_deref())?;
    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Signin(args) => auth::handle_signin(&client, &args.email, args.password).await,
            AuthCommands::Signup(args) => {
                auth::handle_signup(&client, &args.email, args.name, args.password).await
            }
            AuthCommands::Signout => auth::handle_signout(&client).await,
            AuthCommands::Status => auth::handle_status(&client),
            AuthCommands::Refresh => auth::handle_refresh(&client).await,
        },
        Commands::Whoami => auth::handle_whoami(&client).await,
        Commands::Token(args) => match args.command {
            TokenCommands::Decode { token } => auth::handle_decode(&client, token),
            TokenCommands::Pkce => auth::handle_pkce(),
        },
    }
}
