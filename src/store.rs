// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-based storage for document chunk vectors.
//!
//! Each record holds the chunk text, its page/source metadata, and the raw
//! embedding bytes (IEEE-754 f32, little-endian, `4*D` bytes). Writes are
//! idempotent upserts keyed by an opaque id; reads tolerate records whose
//! vector has not been written yet.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Meta key recording the embedding model used at index time.
pub const META_MODEL: &str = "embedding_model";
/// Meta key recording the embedding dimension used at index time.
pub const META_DIMENSION: &str = "embedding_dimension";

/// A persisted document chunk with its (optional) embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Opaque unique id.
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// Page number the chunk came from, if known.
    pub page: Option<u32>,
    /// Source label (e.g. `page_3`).
    pub source: String,
    /// Embedding vector. `None` for records written without a vector,
    /// which are present but unsearchable.
    pub embedding: Option<Vec<f32>>,
}

/// Result of a full scan: decoded records plus a count of rows that could
/// not be decoded and were skipped.
#[derive(Debug)]
pub struct ScanOutcome {
    pub records: Vec<VectorRecord>,
    pub malformed: usize,
}

/// SQLite-backed vector store.
///
/// Default location is `.docfind/vectors.sqlite` under the working tree.
pub struct VectorStore {
    conn: Connection,
    path: PathBuf,
}

impl VectorStore {
    /// Opens or creates a vector store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let store = Self { conn, path };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens a vector store in the default location under `root`.
    pub fn open_default<P: AsRef<Path>>(root: P) -> Result<Self> {
        let db_path = root.as_ref().join(".docfind").join("vectors.sqlite");
        Self::open(db_path)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS doc_vectors (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                page INTEGER,
                source TEXT NOT NULL DEFAULT '',
                content_vector BLOB,
                created_at INTEGER NOT NULL
            );
            "#,
            )
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the store connection explicitly.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    /// Idempotent upsert; the last write for a given id wins.
    ///
    /// Rejects empty ids and empty text at the boundary. A `None` embedding
    /// is stored as a NULL vector (the record stays readable but is skipped
    /// by searches). When the store has a recorded dimension, vectors of a
    /// different length are rejected.
    pub fn put(
        &self,
        id: &str,
        text: &str,
        page: Option<u32>,
        source: &str,
        embedding: Option<&[f32]>,
    ) -> Result<()> {
        if id.trim().is_empty() {
            bail!("record id must not be empty");
        }
        if text.trim().is_empty() {
            bail!("record text must not be empty");
        }
        if let (Some(vector), Some(dimension)) = (embedding, self.dimension()?) {
            if vector.len() != dimension {
                bail!(
                    "embedding dimension {} does not match store dimension {}",
                    vector.len(),
                    dimension
                );
            }
        }

        let blob = embedding.map(Self::embedding_to_blob);
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        self.conn
            .execute(
                r#"
                INSERT INTO doc_vectors (id, content, page, source, content_vector, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    content = excluded.content,
                    page = excluded.page,
                    source = excluded.source,
                    content_vector = excluded.content_vector,
                    created_at = excluded.created_at
                "#,
                params![id, text, page, source, blob, created_at],
            )
            .context("Failed to upsert record")?;
        Ok(())
    }

    /// Retrieves a record by id.
    pub fn get(&self, id: &str) -> Result<Option<VectorRecord>> {
        let record = self
            .conn
            .prepare(
                "SELECT id, content, page, source, content_vector FROM doc_vectors WHERE id = ?1",
            )?
            .query_row(params![id], Self::row_to_record)
            .optional()
            .context("Failed to query record")?;
        Ok(record)
    }

    /// Full scan of all records, restartable from the beginning each call.
    ///
    /// Rows that fail to decode (e.g. a vector blob whose length is not a
    /// multiple of 4) are skipped and counted, never an error: one bad row
    /// must not abort a whole search.
    pub fn scan_all(&self) -> Result<ScanOutcome> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, page, source, content_vector FROM doc_vectors ORDER BY id",
        )?;

        let mut records = Vec::new();
        let mut malformed = 0usize;
        let rows = stmt
            .query_map([], Self::row_to_record)
            .context("Failed to scan records")?;
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable record");
                    malformed += 1;
                }
            }
        }

        Ok(ScanOutcome { records, malformed })
    }

    /// Counts stored records.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM doc_vectors", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Deletes all records (maintenance operation; not part of the query
    /// path).
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM doc_vectors", [])
            .context("Failed to clear records")?;
        Ok(())
    }

    /// Gets a metadata value by key.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to get meta")?;
        Ok(value)
    }

    /// Sets a metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO meta (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// The embedding model recorded at index time, if any.
    pub fn indexed_model(&self) -> Result<Option<String>> {
        self.get_meta(META_MODEL)
    }

    /// The embedding dimension recorded at index time, if any.
    pub fn dimension(&self) -> Result<Option<usize>> {
        Ok(self
            .get_meta(META_DIMENSION)?
            .and_then(|v| v.parse::<usize>().ok()))
    }

    /// Records the embedding model and dimension used for indexing.
    pub fn record_model(&self, model: &str, dimension: usize) -> Result<()> {
        self.set_meta(META_MODEL, model)?;
        self.set_meta(META_DIMENSION, &dimension.to_string())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<VectorRecord> {
        let blob: Option<Vec<u8>> = row.get(4)?;
        let embedding = match blob {
            Some(bytes) => Some(Self::blob_to_embedding(&bytes).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Blob,
                    Box::new(e),
                )
            })?),
            None => None,
        };
        Ok(VectorRecord {
            id: row.get(0)?,
            text: row.get(1)?,
            page: row.get(2)?,
            source: row.get(3)?,
            embedding,
        })
    }

    /// Converts an embedding vector to a compact little-endian blob.
    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Converts a blob back to an embedding vector.
    fn blob_to_embedding(blob: &[u8]) -> std::result::Result<Vec<f32>, BlobError> {
        if blob.len() % 4 != 0 {
            return Err(BlobError(blob.len()));
        }
        Ok(blob
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("vector blob length {0} is not a multiple of 4")]
struct BlobError(usize);
