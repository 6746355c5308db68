//! Health check command.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Use the authenticated endpoint, which also reports service status
    #[arg(long)]
    pub authenticated: bool,
}

pub async fn run(args: HealthArgs, api_url: Option<&str>) -> Result<()> {
    let client = open_client(api_url)?;

    if args.authenticated {
        let status = client
            .health()
            .check_authenticated()
            .await
            .context("Health check failed")?;
        output::field("Status", &status.status);
        for (service, state) in &status.services_status {
            output::field(service, state);
        }
    } else {
        let status = client.health().check().await.context("Health check failed")?;
        output::field("Status", &status.status);
        output::field("Database", &status.database);
        output::field("AI system", &status.ai_system);
        output::field("Version", &status.version);
    }

    Ok(())
}
