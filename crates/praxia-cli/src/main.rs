//! praxia - command-line client for the Praxia healthcare assistant.
//!
//! A thin wrapper over `praxia-client`. The session credential is kept in the
//! user's data directory so consecutive invocations share one login.

mod cli;
mod commands;
mod output;
mod session;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    if let Err(err) = run(cli).await {
        report(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Commands::Auth(cmd) => commands::auth::handle(cmd, api_url).await,
        Commands::Profile(cmd) => commands::profile::handle(cmd, api_url).await,
        Commands::Chat(cmd) => commands::chat::handle(cmd, api_url).await,
        Commands::Xray(cmd) => commands::xray::handle(cmd, api_url).await,
        Commands::Health(args) => commands::health::run(args, api_url).await,
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<praxia_core::Error>() {
        Some(api_err) => {
            if err.chain().count() > 1 {
                output::error(&format!("{}: {}", err, api_err.user_message()));
            } else {
                output::error(&api_err.user_message());
            }
            if api_err.is_auth_expired() {
                output::hint("Run 'praxia auth login' to sign in again.");
            }
        }
        None => output::error(&format!("{:#}", err)),
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
