//! X-ray subcommands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use praxia_client::{FilePart, PollOptions};
use praxia_core::models::XrayAnalysis;

use crate::output;
use crate::session::{open_client, require_login};

#[derive(Args, Debug)]
pub struct XrayCommand {
    #[command(subcommand)]
    pub command: XraySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum XraySubcommand {
    /// List analyses, one JSON object per line
    List,

    /// Upload an image for analysis
    Upload(UploadArgs),

    /// Fetch an analysis
    Get(GetArgs),

    /// Wait until an analysis finishes
    Wait(WaitArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    pub path: PathBuf,

    /// Wait for the analysis to finish
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    pub id: i64,

    /// Milliseconds between status checks
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Status checks before giving up
    #[arg(long, default_value_t = 30)]
    pub max_attempts: u32,
}

pub async fn handle(cmd: XrayCommand, api_url: Option<&str>) -> Result<()> {
    let client = open_client(api_url)?;
    require_login(&client)?;
    let xray = client.xray();

    match cmd.command {
        XraySubcommand::List => {
            for analysis in xray.list().await.context("Failed to list analyses")? {
                output::json(&analysis)?;
            }
        }
        XraySubcommand::Upload(args) => {
            let image = FilePart::from_path(&args.path)
                .with_context(|| format!("Failed to read {}", args.path.display()))?;
            let analysis = xray.upload(image).await.context("Failed to upload X-ray")?;
            output::success(&format!("Uploaded as analysis {}", analysis.id));

            let analysis = if args.wait {
                output::progress("Waiting for analysis...");
                xray.poll_for_results(analysis.id, None).await?
            } else {
                analysis
            };
            print_analysis(&analysis);
        }
        XraySubcommand::Get(args) => {
            let analysis = xray.get(args.id).await.context("Failed to fetch analysis")?;
            print_analysis(&analysis);
        }
        XraySubcommand::Wait(args) => {
            let options = PollOptions::new(Duration::from_millis(args.interval_ms), args.max_attempts);
            output::progress("Waiting for analysis...");
            let analysis = xray.poll_for_results(args.id, Some(options)).await?;
            print_analysis(&analysis);
        }
    }

    Ok(())
}

fn print_analysis(analysis: &XrayAnalysis) {
    output::field("ID", &analysis.id.to_string());
    output::field("Result", &analysis.analysis_result);
    for (condition, score) in analysis.ranked_conditions() {
        output::field(condition, &format!("{:.1}%", score * 100.0));
    }
}
