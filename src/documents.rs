//! Document-ownership records in the relational store.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::FileRecord;

/// Create the ownership row for an uploaded document and return it.
pub async fn create_document(
    pool: &SqlitePool,
    user_id: &str,
    session_id: &str,
    filename: &str,
) -> Result<FileRecord> {
    let record = FileRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
        filename: filename.to_string(),
        uploaded_at: Utc::now().timestamp_millis(),
    };

    sqlx::query(
        "INSERT INTO documents (id, user_id, session_id, filename, uploaded_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.session_id)
    .bind(&record.filename)
    .bind(record.uploaded_at)
    .execute(pool)
    .await?;

    Ok(record)
}

/// All document identifiers owned by `(user_id, session_id)`, upload order.
pub async fn session_file_ids(
    pool: &SqlitePool,
    user_id: &str,
    session_id: &str,
) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT id FROM documents WHERE user_id = ? AND session_id = ? ORDER BY uploaded_at",
    )
    .bind(user_id)
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|row| row.get("id")).collect())
}

/// Remove an ownership row. The upload boundary calls this to roll back
/// when ingestion fails after the row was created.
pub async fn delete_document(pool: &SqlitePool, file_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(file_id)
        .execute(pool)
        .await?;
    Ok(())
}
