//! Auth subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use praxia_core::LoginCredentials;

use crate::output;
use crate::session::{open_client, require_login};

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Log in and store the session
    Login(LoginArgs),

    /// End the session and forget the stored credential
    Logout(LogoutArgs),

    /// Show the logged-in user
    Whoami,

    /// Refresh the access token now
    Refresh,

    /// List active sessions for this account
    Sessions,

    /// Terminate one of this account's sessions
    Terminate(TerminateArgs),

    /// Create an account
    Register(RegisterArgs),

    /// Confirm an email address with the token from the verification mail
    VerifyEmail(VerifyEmailArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Log out of every device
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct TerminateArgs {
    /// Session key as shown by `praxia auth sessions`
    pub session_key: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub full_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct VerifyEmailArgs {
    pub token: String,
}

pub async fn handle(cmd: AuthCommand, api_url: Option<&str>) -> Result<()> {
    let client = open_client(api_url)?;

    match cmd.command {
        AuthSubcommand::Login(args) => {
            output::progress("Logging in...");
            let response = client
                .auth()
                .login(&LoginCredentials::new(&args.email, &args.password))
                .await
                .context("Failed to login")?;

            if !client.is_authenticated() {
                anyhow::bail!("Login did not return a session. Is the email address verified?");
            }

            output::success("Logged in successfully");
            println!();
            output::field("Email", &response.email);
            output::field("User ID", &response.user_id.to_string());
        }
        AuthSubcommand::Logout(args) => {
            if args.all {
                client.auth().logout_all().await;
                output::success("Logged out of all sessions");
            } else {
                client.auth().logout().await;
                output::success("Logged out");
            }
        }
        AuthSubcommand::Whoami => {
            require_login(&client)?;
            let profile = client
                .profile()
                .get()
                .await
                .context("Failed to fetch profile")?;

            output::field("Username", &profile.username);
            output::field("Email", &profile.email);
            output::field("API", client.config().api_url.as_str());
        }
        AuthSubcommand::Refresh => {
            require_login(&client)?;
            client
                .refresh_access_token()
                .await
                .context("Failed to refresh session")?;
            output::success("Session refreshed");
        }
        AuthSubcommand::Sessions => {
            require_login(&client)?;
            let response = client
                .auth()
                .sessions()
                .await
                .context("Failed to list sessions")?;
            for session in &response.sessions {
                output::json(session)?;
            }
        }
        AuthSubcommand::Terminate(args) => {
            require_login(&client)?;
            let response = client
                .auth()
                .terminate_session(&args.session_key)
                .await
                .context("Failed to terminate session")?;
            output::success(&response.message);
        }
        AuthSubcommand::Register(args) => {
            let response = client
                .auth()
                .register(&args.full_name, &args.email, &args.password, &args.password)
                .await
                .context("Failed to register")?;

            output::success("Account created");
            output::field("Email", &response.email);
            if let Some(message) = response.message.as_deref() {
                output::field("Message", message);
            }
        }
        AuthSubcommand::VerifyEmail(args) => {
            client
                .auth()
                .verify_email(&args.token)
                .await
                .context("Failed to verify email")?;
            output::success("Email verified");
        }
    }

    Ok(())
}
