//! Retrieval and answering policy.
//!
//! Each question is answered in one of two modes, decided fresh on every
//! call: if the session owns at least one document the answer is grounded
//! in retrieved chunks (RAG mode); otherwise the question passes straight
//! through to the generation service (plain mode). The mode check is never
//! cached — a session gains RAG capability the moment its first document
//! finishes ingesting.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::documents;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::Generator;
use crate::index::VectorIndex;
use crate::ledger;
use crate::models::{ChatTurn, Role};

/// Delimiter between retrieved chunks in the grounding context.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Answering engine. Holds the process-scoped client handles, injected once
/// at construction.
pub struct ChatEngine {
    pool: SqlitePool,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    retrieval_limit: usize,
}

impl ChatEngine {
    pub fn new(
        pool: SqlitePool,
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        retrieval_limit: usize,
    ) -> Self {
        Self {
            pool,
            index,
            embedder,
            generator,
            retrieval_limit,
        }
    }

    /// Answer `query` for `(user_id, session_id)` and record both sides of
    /// the exchange in the session ledger.
    ///
    /// The user turn is appended before the generation call, so a failed
    /// generation still leaves the question on record; the assistant turn
    /// is appended only after generation succeeds.
    pub async fn answer(&self, query: &str, user_id: &str, session_id: &str) -> Result<String> {
        let user_turn = ChatTurn {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            role: Role::User,
            message: query.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        };
        ledger::append_turn(&self.pool, &user_turn).await?;

        // Read the session's documents fresh on every call so newly
        // ingested files are immediately eligible for retrieval.
        let file_ids = documents::session_file_ids(&self.pool, user_id, session_id).await?;

        let reply = if file_ids.is_empty() {
            debug!(session_id, "plain mode: no documents in session");
            self.generator.complete(query).await?
        } else {
            debug!(session_id, files = file_ids.len(), "rag mode");
            let query_vector = self.embedder.embed_one(query).await?;
            let hits = self
                .index
                .search(&query_vector, user_id, &file_ids, self.retrieval_limit)
                .await?;

            // Zero retrieved entries still go to generation with an empty
            // context; downstream handles the empty-context prompt.
            let context = hits
                .iter()
                .map(|hit| hit.content.as_str())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR);

            let prompt = build_grounded_prompt(&context, query);
            self.generator.complete(&prompt).await?
        };

        let assistant_turn = ChatTurn {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            role: Role::Assistant,
            message: reply.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        ledger::append_turn(&self.pool, &assistant_turn).await?;

        Ok(reply)
    }
}

/// Strict-grounding instruction: the service must answer from the supplied
/// context only.
fn build_grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n{}\n\nQuestion: {}",
        context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_prompt_carries_context_and_question() {
        let prompt = build_grounded_prompt("chunk a\n---\nchunk b", "what is a?");
        assert!(prompt.starts_with("Answer the question based only on the following context:"));
        assert!(prompt.contains("chunk a\n---\nchunk b"));
        assert!(prompt.ends_with("Question: what is a?"));
    }
}
