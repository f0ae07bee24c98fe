//! Session chat ledger: append-only conversation turns.
//!
//! A session has no row of its own — it exists exactly when a user has at
//! least one turn or one document under it. Listing partitions turns by
//! session and picks the latest turn per partition for the display title.

use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::models::{ChatTurn, Role, SessionSummary};

/// Append one turn. Append-only; nothing here ever updates a prior turn.
pub async fn append_turn(pool: &SqlitePool, turn: &ChatTurn) -> Result<()> {
    sqlx::query(
        "INSERT INTO chat_history (id, user_id, session_id, role, message, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&turn.user_id)
    .bind(&turn.session_id)
    .bind(turn.role.as_str())
    .bind(&turn.message)
    .bind(turn.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

/// All turns of one session, timestamp ascending.
pub async fn history(
    pool: &SqlitePool,
    user_id: &str,
    session_id: &str,
) -> Result<Vec<ChatTurn>> {
    let rows = sqlx::query(
        "SELECT user_id, session_id, role, message, timestamp FROM chat_history \
         WHERE user_id = ? AND session_id = ? ORDER BY timestamp ASC, rowid ASC",
    )
    .bind(user_id)
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let role: String = row.get("role");
            Ok(ChatTurn {
                user_id: row.get("user_id"),
                session_id: row.get("session_id"),
                role: Role::parse(&role)?,
                message: row.get("message"),
                timestamp: row.get("timestamp"),
            })
        })
        .collect()
}

/// One row per distinct session the user owns, titled with the latest
/// turn's message, ordered by that turn's timestamp descending.
pub async fn list_sessions(pool: &SqlitePool, user_id: &str) -> Result<Vec<SessionSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT session_id, message, timestamp FROM (
            SELECT session_id, message, timestamp,
                   ROW_NUMBER() OVER (
                       PARTITION BY session_id
                       ORDER BY timestamp DESC, rowid DESC
                   ) AS rn
            FROM chat_history
            WHERE user_id = ?
        )
        WHERE rn = 1
        ORDER BY timestamp DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| SessionSummary {
            session_id: row.get("session_id"),
            title: row.get("message"),
            last_timestamp: row.get("timestamp"),
        })
        .collect())
}

/// Delete a session: all its turns and all its document records, in one
/// transaction, then its vector-index entries (best effort).
///
/// Fails with [`Error::NotFound`] when the user has no turns under
/// `session_id`.
pub async fn delete_session(
    pool: &SqlitePool,
    index: &VectorIndex,
    user_id: &str,
    session_id: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let turn_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chat_history WHERE user_id = ? AND session_id = ?",
    )
    .bind(user_id)
    .bind(session_id)
    .fetch_one(&mut *tx)
    .await?;

    if turn_count == 0 {
        return Err(Error::NotFound(format!("session {}", session_id)));
    }

    let file_ids: Vec<String> = sqlx::query(
        "SELECT id FROM documents WHERE user_id = ? AND session_id = ?",
    )
    .bind(user_id)
    .bind(session_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|row| row.get("id"))
    .collect();

    sqlx::query("DELETE FROM chat_history WHERE user_id = ? AND session_id = ?")
        .bind(user_id)
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM documents WHERE user_id = ? AND session_id = ?")
        .bind(user_id)
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    // The relational delete is the source of truth; leftover vectors are
    // unreachable through search, so a failure here only wastes space.
    if let Err(e) = index.delete_for_files(user_id, &file_ids).await {
        warn!(session_id, error = %e, "failed to clear index entries for deleted session");
    }

    Ok(())
}
