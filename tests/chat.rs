//! Answering-policy behavior: mode decision, grounding, and ledger side
//! effects.

mod common;

use std::sync::Arc;

use common::{CountingEmbedder, EchoGenerator, FailingGenerator};
use docsession::chat::{ChatEngine, CONTEXT_SEPARATOR};
use docsession::config::ChunkingConfig;
use docsession::documents;
use docsession::error::Error;
use docsession::extract::MIME_TEXT;
use docsession::index::VectorIndex;
use docsession::ingest::ingest_document;
use docsession::ledger;
use docsession::models::Role;

struct Harness {
    _tmp: tempfile::TempDir,
    pool: sqlx::SqlitePool,
    index: VectorIndex,
    embedder: Arc<CountingEmbedder>,
}

impl Harness {
    async fn new() -> Self {
        let (tmp, pool) = common::setup_db().await;
        let index = VectorIndex::new(pool.clone());
        Self {
            _tmp: tmp,
            pool,
            index,
            embedder: Arc::new(CountingEmbedder::new()),
        }
    }

    fn engine(&self, generator: Arc<dyn docsession::generation::Generator>) -> ChatEngine {
        ChatEngine::new(
            self.pool.clone(),
            self.index.clone(),
            self.embedder.clone(),
            generator,
            3,
        )
    }

    /// Create an ownership record and ingest `text` under it.
    async fn upload(&self, user: &str, session: &str, text: &str) -> String {
        let record = documents::create_document(&self.pool, user, session, "doc.txt")
            .await
            .unwrap();
        ingest_document(
            &self.index,
            self.embedder.as_ref(),
            &ChunkingConfig {
                chunk_size: 500,
                overlap: 50,
            },
            text.as_bytes(),
            MIME_TEXT,
            user,
            &record.id,
        )
        .await
        .unwrap();
        record.id
    }
}

#[tokio::test]
async fn plain_mode_never_invokes_retrieval() {
    let harness = Harness::new().await;
    let generator = Arc::new(EchoGenerator::new("plain reply"));
    let engine = harness.engine(generator.clone());

    let reply = engine.answer("hello there", "u1", "s1").await.unwrap();

    assert_eq!(reply, "plain reply");
    assert_eq!(harness.embedder.call_count(), 0, "no query embedding");
    // The question passes through untouched, with no grounding preamble.
    assert_eq!(generator.last_prompt().unwrap(), "hello there");
}

#[tokio::test]
async fn both_turns_recorded_in_order() {
    let harness = Harness::new().await;
    let generator = Arc::new(EchoGenerator::new("the answer"));
    let engine = harness.engine(generator);

    engine.answer("a question", "u1", "s1").await.unwrap();

    let turns = ledger::history(&harness.pool, "u1", "s1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].message, "a question");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].message, "the answer");
}

#[tokio::test]
async fn failed_generation_still_records_the_user_turn() {
    let harness = Harness::new().await;
    let engine = harness.engine(Arc::new(FailingGenerator));

    let err = engine.answer("doomed question", "u1", "s1").await.unwrap_err();
    assert!(matches!(err, Error::Generation(_)));

    let turns = ledger::history(&harness.pool, "u1", "s1").await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].message, "doomed question");
}

#[tokio::test]
async fn rag_mode_grounds_on_every_session_document() {
    let harness = Harness::new().await;
    harness
        .upload("u1", "s1", "The first document is about alpine climbing.")
        .await;
    harness
        .upload("u1", "s1", "The second document covers deep sea diving.")
        .await;

    let generator = Arc::new(EchoGenerator::new("grounded reply"));
    let engine = harness.engine(generator.clone());

    engine.answer("what are these about?", "u1", "s1").await.unwrap();

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.starts_with("Answer the question based only on the following context:"));
    // Retrieval is filtered to the session's full file set, not just the
    // most recent upload.
    assert!(prompt.contains("alpine climbing"));
    assert!(prompt.contains("deep sea diving"));
    assert!(prompt.contains(CONTEXT_SEPARATOR));
    assert!(prompt.ends_with("Question: what are these about?"));
}

#[tokio::test]
async fn rag_mode_excludes_other_sessions_and_users() {
    let harness = Harness::new().await;
    harness.upload("u1", "s1", "Session one talks about beekeeping.").await;
    harness.upload("u1", "s2", "Session two talks about beekeeping too.").await;
    harness.upload("u2", "s1", "Another user also keeps bees.").await;

    let generator = Arc::new(EchoGenerator::new("reply"));
    let engine = harness.engine(generator.clone());

    engine.answer("tell me about bees", "u1", "s1").await.unwrap();

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("Session one talks about beekeeping"));
    assert!(!prompt.contains("Session two"));
    assert!(!prompt.contains("Another user"));
}

#[tokio::test]
async fn mode_decision_is_fresh_per_call() {
    let harness = Harness::new().await;
    let generator = Arc::new(EchoGenerator::new("reply"));
    let engine = harness.engine(generator.clone());

    engine.answer("first question", "u1", "s1").await.unwrap();
    assert_eq!(generator.last_prompt().unwrap(), "first question");

    harness.upload("u1", "s1", "A freshly ingested document.").await;

    engine.answer("second question", "u1", "s1").await.unwrap();
    let prompt = generator.last_prompt().unwrap();
    assert!(
        prompt.contains("A freshly ingested document."),
        "new document must be eligible immediately"
    );
}

#[tokio::test]
async fn zero_retrieved_entries_still_invokes_generation() {
    let harness = Harness::new().await;
    // Ownership record exists but its document had no extractable text,
    // so the index holds nothing for this session.
    documents::create_document(&harness.pool, "u1", "s1", "empty.txt")
        .await
        .unwrap();

    let generator = Arc::new(EchoGenerator::new("best effort"));
    let engine = harness.engine(generator.clone());

    let reply = engine.answer("anything in there?", "u1", "s1").await.unwrap();

    assert_eq!(reply, "best effort");
    let prompt = generator.last_prompt().unwrap();
    // RAG mode with an empty grounding context, not an error.
    assert!(prompt.starts_with("Answer the question based only on the following context:"));
    assert!(prompt.ends_with("Question: anything in there?"));
}
