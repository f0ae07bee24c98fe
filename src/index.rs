//! Tenant-aware vector index over SQLite.
//!
//! Stores one row per chunk: deterministic identity, the chunk's vector as a
//! little-endian f32 BLOB, and the ownership properties `{content, user_id,
//! file_id}`. Writes are upserts keyed on identity, so re-ingestion replaces
//! instead of duplicating. Search is always constrained to a single user and
//! an explicit set of document identifiers; there is no unfiltered path.

use sqlx::{Row, SqlitePool};

use crate::error::Result;

/// The persisted unit: identity, vector, and ownership properties.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub user_id: String,
    pub file_id: String,
}

/// One search hit, ordered by similarity descending.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub file_id: String,
    pub score: f32,
}

/// Handle to the chunk collection. Cheap to clone; shares the pool.
#[derive(Clone)]
pub struct VectorIndex {
    pool: SqlitePool,
}

impl VectorIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent creation of the chunk collection and its ownership index.
    /// `IF NOT EXISTS` resolves create/create races without failing either
    /// caller.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS doc_chunks (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                user_id TEXT NOT NULL,
                file_id TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_doc_chunks_owner ON doc_chunks(user_id, file_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace entries by identity, batched in one transaction.
    pub async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO doc_chunks (id, content, user_id, file_id, embedding)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    content = excluded.content,
                    user_id = excluded.user_id,
                    file_id = excluded.file_id,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.content)
            .bind(&entry.user_id)
            .bind(&entry.file_id)
            .bind(vec_to_blob(&entry.vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Return up to `limit` entries owned by `user_id` whose `file_id` is in
    /// `allowed_file_ids`, ordered by cosine similarity to `query_vector`
    /// descending.
    ///
    /// An empty `allowed_file_ids` returns an empty result without touching
    /// the database — there is no fallback to unfiltered search.
    pub async fn search(
        &self,
        query_vector: &[f32],
        user_id: &str,
        allowed_file_ids: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if allowed_file_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; allowed_file_ids.len()].join(", ");
        let sql = format!(
            "SELECT content, file_id, embedding FROM doc_chunks \
             WHERE user_id = ? AND file_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        for file_id in allowed_file_ids {
            query = query.bind(file_id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut hits: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                RetrievedChunk {
                    content: row.get("content"),
                    file_id: row.get("file_id"),
                    score: cosine_similarity(query_vector, &vector),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }

    /// Remove all entries for the given user's documents. Used when a
    /// session is deleted so its vectors do not linger unreachable.
    pub async fn delete_for_files(&self, user_id: &str, file_ids: &[String]) -> Result<u64> {
        if file_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; file_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM doc_chunks WHERE user_id = ? AND file_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        for file_id in file_ids {
            query = query.bind(file_id);
        }
        let result = query.execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}

/// Encode a float vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1, 1]`. Returns `0.0` for empty or
/// mismatched-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
