use super::types::HistoryEntry;

/// Persona-establishing history used before anything has been logged.
///
/// Gives the model a consistent voice on the very first run.
pub const SEED_HISTORY: [&str; 4] = [
    "Set up Termux with Python, Node and git for on-phone development",
    "Cloned an open-source LLM repo to try local inference on a cloud VM",
    "Hacked on the M-Pesa Daraja sandbox to test STK push callbacks",
    "Wrote a small Telegram bot that pings focus reminders",
];

pub fn seed_entries() -> Vec<HistoryEntry> {
    SEED_HISTORY.iter().copied().map(HistoryEntry::new).collect()
}
