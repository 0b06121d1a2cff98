pub mod context;
pub mod doctor;
pub mod history;
pub mod log;
pub mod run;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::activity::ActivityLog;
use crate::config::FocusLockConfig;
use crate::embedding::local::{model_files, MODEL_FILE, TOKENIZER_FILE};
use crate::index::VecIndex;

const MODEL_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Load the history configured in `config`, attaching the similarity index
/// when enabled. Index problems only cost the semantic ranking.
pub fn open_activity_log(config: &FocusLockConfig) -> ActivityLog {
    let log = load_history(config);
    if !config.context.similarity {
        return log;
    }

    match open_index(config) {
        Ok(index) => log.with_index(Box::new(index), config.context.seed_query.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "similarity index unavailable, using recent history");
            log
        }
    }
}

/// Like [`open_activity_log`], but never creates, syncs, or writes the index.
pub fn inspect_activity_log(config: &FocusLockConfig) -> ActivityLog {
    let log = load_history(config);
    if !config.context.similarity {
        return log;
    }

    match open_index_read_only(config) {
        Ok(index) => log.inspect_with_index(Box::new(index), config.context.seed_query.clone()),
        Err(e) => {
            tracing::info!(error = %e, "no similarity index to inspect, using recent history");
            log
        }
    }
}

fn load_history(config: &FocusLockConfig) -> ActivityLog {
    let path = config.resolved_history_path();
    if config.context.seed_history {
        ActivityLog::load(path)
    } else {
        ActivityLog::load_or(path, Vec::new())
    }
}

fn open_index(config: &FocusLockConfig) -> Result<VecIndex> {
    let embedder = crate::embedding::create_provider(&config.embedding)?;
    VecIndex::open(
        config.resolved_index_path(),
        embedder,
        &config.embedding.model,
    )
}

pub(crate) fn open_index_read_only(config: &FocusLockConfig) -> Result<VecIndex> {
    let embedder = crate::embedding::create_provider(&config.embedding)?;
    VecIndex::open_read_only(config.resolved_index_path(), embedder)
}

/// Download the ONNX embedding model and tokenizer to the cache directory.
pub async fn model_download(config: &crate::config::EmbeddingConfig) -> Result<()> {
    let (model_path, tokenizer_path) = model_files(config);
    if let Some(cache_dir) = model_path.parent() {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;
    }

    for (url, dest, label) in [
        (MODEL_URL, &model_path, MODEL_FILE),
        (TOKENIZER_URL, &tokenizer_path, TOKENIZER_FILE),
    ] {
        if dest.exists() {
            println!("{label} already exists at {}", dest.display());
            continue;
        }
        println!("Downloading {label}...");
        download_file(url, dest).await?;
        println!("{label} saved to {}", dest.display());
    }

    println!("Model download complete. Enable `context.similarity` to use it.");
    Ok(())
}

/// Download a file with a progress bar. Writes to a temp file, then renames.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    let bytes = response.bytes().await.context("error reading response")?;
    pb.inc(bytes.len() as u64);
    file.write_all(&bytes)
        .await
        .context("error writing to file")?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
