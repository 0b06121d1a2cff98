use anyhow::Result;

use crate::config::FocusLockConfig;

/// Print the context the next run would send to the model.
pub fn context(config: &FocusLockConfig, window: Option<usize>) -> Result<()> {
    let window = window.unwrap_or(config.context.window_size);
    let log = super::inspect_activity_log(config);
    let context = log.context_window(window);

    eprintln!("({} context, window {window})", context.source());
    println!("{}", context.render());
    Ok(())
}
