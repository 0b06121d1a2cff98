//! CLI `doctor` command: check history, index, model, and credentials.

use anyhow::Result;

use crate::activity::read_entries;
use crate::config::FocusLockConfig;
use crate::embedding::local::model_files;

pub fn doctor(config: &FocusLockConfig) -> Result<()> {
    println!("FocusLock Health Report");
    println!("=======================");
    println!();

    let history_path = config.resolved_history_path();
    println!("History:           {}", history_path.display());
    match read_entries(&history_path) {
        Ok(Some(entries)) => {
            let size = std::fs::metadata(&history_path).map(|m| m.len()).unwrap_or(0);
            println!("  Entries:         {}", entries.len());
            println!("  File size:       {}", format_bytes(size));
        }
        Ok(None) => println!("  Status:          not created yet (seed history will be used)"),
        Err(e) => println!("  Status:          UNREADABLE ({e}); runs will fall back to seed"),
    }
    println!();

    println!("Context:");
    println!("  Window size:     {}", config.context.window_size);
    println!("  Seed history:    {}", on_off(config.context.seed_history));
    println!("  Similarity:      {}", on_off(config.context.similarity));
    if config.context.similarity {
        report_index(config);
    }
    println!();

    println!("Model:");
    println!("  Endpoint:        {}", config.model.endpoint);
    println!("  Name:            {}", config.model.name);
    println!();

    println!("Delivery:");
    println!("  API base:        {}", config.delivery.api_base);
    println!("  TELEGRAM_TOKEN:  {}", present(config.delivery.token.as_deref()));
    println!("  CHAT_ID:         {}", present(config.delivery.chat_id.as_deref()));
    if let Err(e) = config.credentials() {
        println!();
        println!("WARNING: {e}");
    }

    Ok(())
}

fn report_index(config: &FocusLockConfig) {
    let index_path = config.resolved_index_path();
    println!("  Index:           {}", index_path.display());

    let (model_path, tokenizer_path) = model_files(&config.embedding);
    if !model_path.exists() || !tokenizer_path.exists() {
        println!("  Embedding model: MISSING (run `focuslock model download`)");
        return;
    }

    if !index_path.exists() {
        println!("  Status:          not created yet (first run builds it)");
        return;
    }

    match super::open_index_read_only(config).and_then(|i| i.health()) {
        Ok(health) => {
            println!("  Schema version:  {}", health.schema_version);
            println!("  sqlite-vec:      v{}", health.sqlite_vec_version);
            println!("  Documents:       {}", health.document_count);
            println!("  Vectors:         {}", health.vector_count);
            match health.embedding_model.as_deref() {
                Some(stored) if stored != config.embedding.model => println!(
                    "  WARNING: index built with {stored}, configured {}",
                    config.embedding.model
                ),
                Some(_) => println!("  Embedding model: OK (match)"),
                None => println!("  Embedding model: (not recorded)"),
            }
        }
        Err(e) => println!("  Status:          FAILED ({e})"),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn present(value: Option<&str>) -> &'static str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => "set",
        _ => "missing",
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
