//! Prompt completion.
//!
//! [`LanguageModel`] is a single synchronous-looking call: one prompt in, one
//! completion out, no retry or streaming. [`ollama::OllamaModel`] talks to a
//! local Ollama server.

pub mod ollama;

use std::future::Future;

use crate::error::ModelError;

pub use ollama::OllamaModel;

pub trait LanguageModel {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Complete `prompt`. The returned text is used verbatim.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, ModelError>> + Send;
}
