//! Core data types that flow through the ingestion and answering pipeline.

use crate::error::Error;

/// Ownership record for an uploaded document. One user, one session.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub filename: String,
    /// Unix milliseconds.
    pub uploaded_at: i64,
}

/// Who spoke a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(Error::Validation(format!("unknown role: {}", other))),
        }
    }
}

/// One message in a session's conversation. Append-only.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub user_id: String,
    pub session_id: String,
    pub role: Role,
    pub message: String,
    /// Unix milliseconds; history is ordered by this field.
    pub timestamp: i64,
}

/// One row in the session list: the session id, its display title
/// (the most recent turn's message), and the timestamp of that turn.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub last_timestamp: i64,
}
