//! Profile subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use praxia_client::FilePart;
use praxia_core::models::{Gender, Language, ProfileUpdate};

use crate::output;
use crate::session::{open_client, require_login};

#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileSubcommand {
    /// Print the profile as JSON
    Show,

    /// Update profile fields
    Update(UpdateArgs),

    /// Lock the gender field
    ConfirmGender,

    /// Upload a new profile picture
    Picture(PictureArgs),
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub age: Option<u32>,

    /// male, female, other or prefer_not_to_say
    #[arg(long, value_parser = parse_gender)]
    pub gender: Option<Gender>,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<f64>,

    /// Height in centimetres
    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub allergies: Option<String>,

    /// en, es or fr
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Args, Debug)]
pub struct PictureArgs {
    pub path: PathBuf,
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown gender '{}'", value))
}

pub async fn handle(cmd: ProfileCommand, api_url: Option<&str>) -> Result<()> {
    let client = open_client(api_url)?;
    require_login(&client)?;

    match cmd.command {
        ProfileSubcommand::Show => {
            let profile = client.profile().get().await.context("Failed to fetch profile")?;
            output::json_pretty(&profile)?;
        }
        ProfileSubcommand::Update(args) => {
            let update = ProfileUpdate {
                age: args.age,
                gender: args.gender,
                weight: args.weight,
                height: args.height,
                country: args.country,
                allergies: args.allergies,
                preferred_language: args
                    .language
                    .as_deref()
                    .map(|code| Language::normalize(Some(code))),
            };

            let profile = client
                .profile()
                .update(&update)
                .await
                .context("Failed to update profile")?;
            output::success("Profile updated");
            output::json_pretty(&profile)?;
        }
        ProfileSubcommand::ConfirmGender => {
            let response = client
                .profile()
                .confirm_gender()
                .await
                .context("Failed to confirm gender")?;
            output::success(&response.detail);
        }
        ProfileSubcommand::Picture(args) => {
            let picture = FilePart::from_path(&args.path)
                .with_context(|| format!("Failed to read {}", args.path.display()))?;
            let profile = client
                .profile()
                .upload_picture(picture)
                .await
                .context("Failed to upload picture")?;
            output::success("Profile picture updated");
            if let Some(url) = profile.profile_picture.as_deref() {
                output::field("Picture", url);
            }
        }
    }

    Ok(())
}
