//! Optional nearest-neighbour index over history entries.
//!
//! [`SimilarityIndex`] is the seam [`crate::activity::ActivityLog`] talks to.
//! [`VecIndex`] implements it with SQLite + sqlite-vec: documents live in
//! `activity_docs`, their embeddings in the `activity_vec` vec0 table.

pub mod schema;

use std::path::Path;
use std::sync::Once;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use sqlite_vec::sqlite3_vec_init;

use crate::embedding::{EmbeddingProvider, EMBEDDING_DIM};

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A store that can rank history documents against a query string.
pub trait SimilarityIndex {
    /// Add `document` under `id`.
    ///
    /// Returns `false` if `id` already holds the same document. An `id` holding
    /// a different document is overwritten.
    fn add(&mut self, id: &str, document: &str) -> Result<bool>;

    /// The document stored under `id`, if any.
    fn document(&self, id: &str) -> Result<Option<String>>;

    /// Up to `limit` documents nearest to `text`, closest first.
    fn query(&self, text: &str, limit: usize) -> Result<Vec<String>>;

    /// Number of indexed documents.
    fn document_count(&self) -> Result<usize>;

    /// Drop every document, leaving an empty index.
    fn clear(&mut self) -> Result<()>;
}

/// Snapshot of index state for `focuslock doctor`.
#[derive(Debug)]
pub struct IndexHealth {
    pub schema_version: String,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub document_count: usize,
    pub vector_count: usize,
}

/// sqlite-vec backed [`SimilarityIndex`].
pub struct VecIndex {
    conn: Connection,
    embedder: Box<dyn EmbeddingProvider>,
}

impl VecIndex {
    /// Open (or create) the index at `path`.
    ///
    /// Records `model` as the embedding model on first use and warns when an
    /// existing index was built with a different one.
    pub fn open(
        path: impl AsRef<Path>,
        embedder: Box<dyn EmbeddingProvider>,
        model: &str,
    ) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        load_sqlite_vec();

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open index at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema::init_schema(&conn).context("failed to initialize index schema")?;

        match schema::get_embedding_model(&conn)? {
            Some(stored) if stored != model => {
                tracing::warn!(
                    stored = %stored,
                    configured = %model,
                    "embedding model changed; similarity results may be poor until the index is rebuilt"
                );
            }
            Some(_) => {}
            None => schema::set_embedding_model(&conn, model)?,
        }

        tracing::info!(path = %path.display(), "similarity index ready");
        Ok(Self { conn, embedder })
    }

    /// Open an existing index without creating or changing anything.
    ///
    /// Used by inspection commands. Fails when no index exists at `path`.
    pub fn open_read_only(
        path: impl AsRef<Path>,
        embedder: Box<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let path = path.as_ref();
        anyhow::ensure!(path.exists(), "no index at {}", path.display());

        load_sqlite_vec();

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open index at {}", path.display()))?;
        Ok(Self { conn, embedder })
    }

    /// Open a throwaway in-memory index.
    pub fn open_in_memory(embedder: Box<dyn EmbeddingProvider>) -> Result<Self> {
        load_sqlite_vec();
        let conn = Connection::open_in_memory().context("failed to open in-memory index")?;
        schema::init_schema(&conn).context("failed to initialize index schema")?;
        Ok(Self { conn, embedder })
    }

    pub fn health(&self) -> Result<IndexHealth> {
        let schema_version: String = self.conn.query_row(
            "SELECT value FROM index_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        let sqlite_vec_version: String =
            self.conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        let vector_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM activity_vec", [], |row| row.get(0))?;

        Ok(IndexHealth {
            schema_version,
            sqlite_vec_version,
            embedding_model: schema::get_embedding_model(&self.conn)?,
            document_count: self.document_count()?,
            vector_count: vector_count as usize,
        })
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.embedder.embed(text)?;
        anyhow::ensure!(
            embedding.len() == EMBEDDING_DIM,
            "embedding has {} dimensions, index expects {EMBEDDING_DIM}",
            embedding.len()
        );
        Ok(embedding)
    }
}

impl SimilarityIndex for VecIndex {
    fn add(&mut self, id: &str, document: &str) -> Result<bool> {
        let replacing = match self.document(id)? {
            Some(stored) if stored == document => return Ok(false),
            Some(_) => {
                tracing::debug!(id, "indexed document differs from history, replacing");
                true
            }
            None => false,
        };

        let embedding = self.embed(document)?;
        let now = chrono::Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        if replacing {
            tx.execute("DELETE FROM activity_vec WHERE id = ?1", params![id])?;
            tx.execute("DELETE FROM activity_docs WHERE id = ?1", params![id])?;
        }
        let position: i64 = match id.parse() {
            Ok(position) => position,
            Err(_) => tx.query_row("SELECT COUNT(*) + 1 FROM activity_docs", [], |row| {
                row.get(0)
            })?,
        };
        tx.execute(
            "INSERT INTO activity_docs (id, position, document, indexed_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, position, document, now],
        )?;
        tx.execute(
            "INSERT INTO activity_vec (id, embedding) VALUES (?1, ?2)",
            params![id, embedding_to_bytes(&embedding)],
        )?;
        tx.commit()?;

        Ok(true)
    }

    fn query(&self, text: &str, limit: usize) -> Result<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embed(text)?;
        let mut stmt = self.conn.prepare(
            "SELECT id FROM activity_vec \
             WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(
                params![embedding_to_bytes(&embedding), limit as i64],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        // Hydrate in distance order
        let mut lookup = self
            .conn
            .prepare("SELECT document FROM activity_docs WHERE id = ?1")?;
        let mut documents = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(document) = lookup
                .query_row(params![id], |row| row.get::<_, String>(0))
                .optional()?
            {
                documents.push(document);
            }
        }

        Ok(documents)
    }

    fn document_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM activity_docs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn document(&self, id: &str) -> Result<Option<String>> {
        let document = self
            .conn
            .query_row(
                "SELECT document FROM activity_docs WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(document)
    }

    fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM activity_vec", [])?;
        tx.execute("DELETE FROM activity_docs", [])?;
        tx.commit()?;
        Ok(())
    }
}

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}
