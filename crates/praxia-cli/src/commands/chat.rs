//! Chat subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use praxia_client::FilePart;
use praxia_core::content::parse_content;
use praxia_core::models::ChatMessage;

use crate::output;
use crate::session::{open_client, require_login};

const CHAT_TIMEOUT_MESSAGE: &str = "Request timed out. Please try again with a shorter message.";

#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(subcommand)]
    pub command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ChatSubcommand {
    /// List chat sessions, one JSON object per line
    List,

    /// Start a new chat session
    New(NewArgs),

    /// Send a message and print the assistant's answer
    Send(SendArgs),

    /// Print every message in a session
    History(SessionArgs),

    /// Rename a session
    Rename(RenameArgs),

    /// Delete a session
    Delete(SessionArgs),
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Session title [default: New Chat]
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Chat session ID
    #[arg(long)]
    pub session: i64,

    /// Message text
    pub message: String,

    /// X-ray image to attach
    #[arg(long)]
    pub xray: Option<PathBuf>,

    /// Wait for a pending X-ray analysis to finish
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Chat session ID
    pub session: i64,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    pub session: i64,
    pub title: String,
}

pub async fn handle(cmd: ChatCommand, api_url: Option<&str>) -> Result<()> {
    let client = open_client(api_url)?;
    require_login(&client)?;
    let chat = client.chat();

    match cmd.command {
        ChatSubcommand::List => {
            for session in chat.list_sessions().await.context("Failed to list sessions")? {
                output::json(&serde_json::json!({
                    "id": session.id,
                    "title": session.title,
                    "updated_at": session.updated_at,
                }))?;
            }
        }
        ChatSubcommand::New(args) => {
            let session = chat
                .create_session(args.title.as_deref())
                .await
                .context("Failed to create session")?;
            output::success("Session created");
            output::field("ID", &session.id.to_string());
            output::field("Title", &session.title);
        }
        ChatSubcommand::Send(args) => {
            let xray = args
                .xray
                .as_ref()
                .map(|path| {
                    FilePart::from_path(path)
                        .with_context(|| format!("Failed to read {}", path.display()))
                })
                .transpose()?;

            output::progress("Waiting for the assistant...");
            let response = match chat.send_message(args.session, &args.message, xray).await {
                Ok(response) => response,
                Err(err) if err.is_timeout() => anyhow::bail!(CHAT_TIMEOUT_MESSAGE),
                Err(err) => return Err(err).context("Failed to send message"),
            };

            let mut answer = response.ai_message;
            if args.wait
                && let Some(id) = parse_content(&answer.content).pending_xray()
            {
                output::progress(&format!("Waiting for X-ray analysis {}...", id));
                if let Some(resolved) = chat
                    .resolve_pending_xray(&answer)
                    .await
                    .context("Failed to fetch X-ray analysis")?
                {
                    answer = resolved;
                }
            }

            print_message(&answer);
        }
        ChatSubcommand::History(args) => {
            for message in chat
                .messages(args.session)
                .await
                .context("Failed to fetch messages")?
            {
                output::json(&message)?;
            }
        }
        ChatSubcommand::Rename(args) => {
            let session = chat
                .update_title(args.session, &args.title)
                .await
                .context("Failed to rename session")?;
            output::success(&format!("Renamed to '{}'", session.title));
        }
        ChatSubcommand::Delete(args) => {
            chat.delete_session(args.session)
                .await
                .context("Failed to delete session")?;
            output::success("Session deleted");
        }
    }

    Ok(())
}

fn print_message(message: &ChatMessage) {
    let parsed = parse_content(&message.content);
    let text = parsed
        .value()
        .and_then(|value| value.get("response"))
        .and_then(|value| value.as_str())
        .unwrap_or(message.content.as_str());
    println!("{}", text);

    if !message.sources.is_empty() {
        println!();
        for source in &message.sources {
            let link = source.url.as_deref().unwrap_or("");
            output::field(&source.source.name, &format!("{} {}", source.title, link));
        }
    }
}
