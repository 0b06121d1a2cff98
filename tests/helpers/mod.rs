#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use focuslock::activity::{ActivityLog, HistoryEntry};
use focuslock::embedding::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use focuslock::error::{DeliveryError, ModelError};
use focuslock::index::VecIndex;
use focuslock::model::LanguageModel;
use focuslock::notify::{Ack, Notifier};
use tempfile::TempDir;

/// History file path inside a not-yet-existing subdirectory of `tmp`.
pub fn history_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data").join("history.json")
}

/// An empty, unseeded log at a fresh path.
pub fn empty_log(tmp: &TempDir) -> ActivityLog {
    ActivityLog::load_or(history_path(tmp), Vec::new())
}

/// Write `entries` as the persisted history.
pub fn write_history(tmp: &TempDir, entries: &[&str]) -> PathBuf {
    let path = history_path(tmp);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let entries: Vec<HistoryEntry> = entries.iter().copied().map(HistoryEntry::new).collect();
    std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();
    path
}

/// Deterministic embedder: hashed bag of lowercase words, L2-normalized.
/// Texts sharing words land close together.
pub struct BagOfWordsEmbedder;

impl EmbeddingProvider for BagOfWordsEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            v[fnv1a(&word.to_lowercase()) % EMBEDDING_DIM] += 1.0;
        }
        Ok(l2_normalize(&v))
    }
}

/// Embedder producing vectors of the wrong width, so every insert fails.
pub struct WrongWidthEmbedder;

impl EmbeddingProvider for WrongWidthEmbedder {
    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![1.0; 8])
    }
}

fn fnv1a(s: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash as usize
}

pub fn memory_index() -> VecIndex {
    VecIndex::open_in_memory(Box::new(BagOfWordsEmbedder)).unwrap()
}

/// Model double: fixed reply (or an empty-response failure), records prompts.
pub struct FakeModel {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl LanguageModel for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(ModelError::EmptyResponse)
    }
}

/// Notifier double: records messages, optionally rejects them.
#[derive(Default)]
pub struct FakeNotifier {
    reject: bool,
    pub sent: Mutex<Vec<String>>,
}

impl FakeNotifier {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }
}

impl Notifier for FakeNotifier {
    async fn notify(&self, message: &str) -> Result<Ack, DeliveryError> {
        self.sent.lock().unwrap().push(message.to_string());
        if self.reject {
            return Err(DeliveryError::Rejected {
                status: 502,
                description: "Bad Gateway".into(),
            });
        }
        Ok(Ack {
            status: 200,
            message_id: Some(1),
        })
    }
}

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub const SAMPLE_IDEA: &str = "Project: ChamaBot
Why: Automates savings-group contributions over M-Pesa.
Stack: python, flask, daraja
Steps: 1. pip install flask 2. python app.py
Time: 2-4h
Potential: KSh from chama admins";
