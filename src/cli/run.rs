//! CLI default command: run one FocusLock cycle.

use anyhow::{Context, Result};

use crate::config::FocusLockConfig;
use crate::cycle::run_cycle;
use crate::model::OllamaModel;
use crate::notify::TelegramNotifier;
use crate::prompt::DomainSelector;

pub async fn run(config: &FocusLockConfig) -> Result<()> {
    // Fail before spending a model call on a message that cannot be sent.
    let credentials = config.credentials()?;

    let mut log = super::open_activity_log(config);
    let model = OllamaModel::new(&config.model).context("failed to build model client")?;
    let notifier = TelegramNotifier::new(&config.delivery, &credentials)
        .context("failed to build Telegram client")?;
    let mut selector = DomainSelector::from_entropy();

    let report = run_cycle(
        &mut log,
        &model,
        &notifier,
        &mut selector,
        config.context.window_size,
    )
    .await?;

    if report.delivered() {
        println!("Sent to Telegram");
    } else {
        println!("Delivery failed; see log output");
    }
    println!("Logged: {}", report.entry);
    Ok(())
}
