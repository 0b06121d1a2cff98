use anyhow::Result;

use crate::activity::read_entries;
use crate::config::FocusLockConfig;

/// Print the last `limit` persisted entries with their 1-based positions.
pub fn history(config: &FocusLockConfig, limit: usize) -> Result<()> {
    let path = config.resolved_history_path();
    let Some(entries) = read_entries(&path)? else {
        println!("No history at {} yet.", path.display());
        return Ok(());
    };

    if entries.is_empty() {
        println!("History is empty.");
        return Ok(());
    }

    let start = entries.len().saturating_sub(limit);
    for (i, entry) in entries.iter().enumerate().skip(start) {
        println!("{:>4}. {}", i + 1, entry);
    }
    println!();
    println!("{} of {} entries shown.", entries.len() - start, entries.len());
    Ok(())
}
