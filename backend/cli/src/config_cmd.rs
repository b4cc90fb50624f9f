//! `config`: print the effective configuration or write it out.

use anyhow::{Context, Result};

use studybuddy_config::write_config;

use crate::config::Settings;
use crate::terminal_output::{note_info, note_success};

pub fn render(settings: &Settings) -> Result<String> {
    serde_yaml::to_string(&settings.config).context("Failed to render config")
}

pub async fn run(settings: &Settings, write: bool) -> Result<()> {
    if write {
        write_config(&settings.config, &settings.path).await?;
        note_success(&format!("Wrote {}", settings.path.display()));
        return Ok(());
    }
    note_info(&format!("Config file: {}", settings.path.display()));
    print!("{}", render(settings)?);
    Ok(())
}
