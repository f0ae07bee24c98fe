//! Document ingestion pipeline: extract → chunk → embed → index.
//!
//! At-least-once semantics: nothing here is transactional across the
//! extract/embed/write boundary, but identities are deterministic and index
//! writes are upserts, so retrying a failed or duplicated ingestion is safe.
//! [`upload_document`] wraps the pipeline for the upload boundary and rolls
//! the ownership record back when ingestion fails.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::chunk::{chunk_identity, split_text};
use crate::config::ChunkingConfig;
use crate::documents;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::extract_text;
use crate::index::{IndexEntry, VectorIndex};
use crate::models::FileRecord;

/// Ingest one document for `(user_id, file_id)` and return the number of
/// chunks written.
///
/// A document with zero extractable text returns 0 without calling the
/// embedder or the index — a valid no-op, not an error. Otherwise all chunk
/// texts are embedded in a single batched call and upserted as one batch.
pub async fn ingest_document(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    chunking: &ChunkingConfig,
    bytes: &[u8],
    content_type: &str,
    user_id: &str,
    file_id: &str,
) -> Result<usize> {
    let text = extract_text(bytes, content_type)?;
    let chunks = split_text(&text, chunking.chunk_size, chunking.overlap);

    if chunks.is_empty() {
        info!(file_id, "document has no extractable text, skipping");
        return Ok(0);
    }

    let vectors = embedder.embed_many(&chunks).await?;

    let entries: Vec<IndexEntry> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(content, vector)| IndexEntry {
            id: chunk_identity(&content, user_id, file_id),
            vector,
            content,
            user_id: user_id.to_string(),
            file_id: file_id.to_string(),
        })
        .collect();

    index.upsert(&entries).await?;

    info!(file_id, chunks = entries.len(), "document ingested");
    Ok(entries.len())
}

/// Upload-boundary flow: create the ownership record, ingest, and return
/// the record with the number of chunks written.
///
/// If ingestion fails the ownership row is deleted so a failed upload
/// leaves no trace in the session, and the ingestion error is returned.
/// A failure during that rollback is logged, never surfaced in place of
/// the ingestion error.
pub async fn upload_document(
    pool: &SqlitePool,
    index: &VectorIndex,
    embedder: &dyn Embedder,
    chunking: &ChunkingConfig,
    bytes: &[u8],
    content_type: &str,
    user_id: &str,
    session_id: &str,
    filename: &str,
) -> Result<(FileRecord, usize)> {
    let record = documents::create_document(pool, user_id, session_id, filename).await?;

    match ingest_document(
        index,
        embedder,
        chunking,
        bytes,
        content_type,
        user_id,
        &record.id,
    )
    .await
    {
        Ok(count) => Ok((record, count)),
        Err(e) => {
            if let Err(rollback) = documents::delete_document(pool, &record.id).await {
                warn!(
                    file_id = %record.id,
                    error = %rollback,
                    "failed to roll back ownership record after ingestion error"
                );
            }
            Err(e)
        }
    }
}
