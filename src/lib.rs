//! FocusLock: scheduled project-idea pings grounded in your own activity.
//!
//! Each run reads an append-only history of what you have been doing, asks a
//! local language model for ONE buildable project idea that ties into it,
//! sends the idea to a Telegram chat, and records the suggestion back into the
//! history.
//!
//! # Architecture
//!
//! - **History**: a JSON array of strings, rewritten in full on every append
//! - **Context**: the last N entries, or the nearest neighbours of a fixed
//!   query when the optional [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   index is enabled
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Model**: Ollama `/api/generate`
//! - **Delivery**: Telegram Bot API `sendMessage`
//!
//! # Modules
//!
//! - [`activity`]: the history log and context selection
//! - [`index`]: similarity index over history entries
//! - [`embedding`]: text-to-vector pipeline
//! - [`model`] / [`notify`]: the two external calls
//! - [`prompt`]: problem domains, prompt template, message format
//! - [`cycle`]: one end-to-end run
//! - [`config`]: TOML file plus environment overrides

pub mod activity;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod embedding;
pub mod error;
pub mod index;
pub mod model;
pub mod notify;
pub mod prompt;
