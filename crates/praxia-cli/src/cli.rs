//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::auth::AuthCommand;
use crate::commands::chat::ChatCommand;
use crate::commands::health::HealthArgs;
use crate::commands::profile::ProfileCommand;
use crate::commands::xray::XrayCommand;

/// Command-line client for the Praxia healthcare assistant.
#[derive(Parser, Debug)]
#[command(name = "praxia")]
#[command(author, version = env!("PRAXIA_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL [default: $PRAXIA_API_URL or http://localhost:8000/api]
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, log out and manage sessions
    Auth(AuthCommand),

    /// View and edit the user profile
    Profile(ProfileCommand),

    /// Talk to the assistant
    Chat(ChatCommand),

    /// Upload X-rays and fetch their analyses
    Xray(XrayCommand),

    /// Check backend health
    Health(HealthArgs),
}
