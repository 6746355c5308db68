//! Location of the persisted credential.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Path of the credential file, creating its directory if needed.
pub fn credential_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "praxia").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("credential.json"))
}
