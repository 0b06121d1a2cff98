//! CLI `log` command: record an activity.

use anyhow::{Context, Result};

use crate::config::FocusLockConfig;

pub fn log(config: &FocusLockConfig, text: &str) -> Result<()> {
    anyhow::ensure!(!text.trim().is_empty(), "activity text must not be empty");

    let mut log = super::open_activity_log(config);
    let entry = log
        .log_activity(text)
        .context("failed to append activity")?;

    println!("Logged: {entry}");
    Ok(())
}
