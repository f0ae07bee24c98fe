//! Shared test fixtures: a tempfile-backed database and deterministic
//! in-process stand-ins for the embedding and generation services.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tempfile::TempDir;

use docsession::embedding::Embedder;
use docsession::error::{Error, Result};
use docsession::generation::Generator;
use docsession::{db, migrate};

pub async fn setup_db() -> (TempDir, SqlitePool) {
    let tmp = TempDir::new().unwrap();
    let pool = db::connect(&tmp.path().join("data").join("docsession.sqlite"))
        .await
        .unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    (tmp, pool)
}

/// Deterministic 8-dim embedding: byte histogram, L2-normalized. Similar
/// texts land near each other, which is all the tests need.
pub fn embed_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 8];
    for b in text.bytes() {
        v[(b as usize) % 8] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Embedder that counts service calls (not texts), mirroring the batching
/// contract: one ingestion must cost one call.
pub struct CountingEmbedder {
    pub calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn model_name(&self) -> &str {
        "test-embedder"
    }

    fn dims(&self) -> usize {
        8
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| embed_vector(t)).collect())
    }
}

/// Embedder whose every call fails, for exercising ingestion rollback.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing-embedder"
    }

    fn dims(&self) -> usize {
        8
    }

    async fn embed_many(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding("scripted failure".to_string()))
    }
}

/// Generator that records every prompt it receives and returns a canned
/// reply.
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
    reply: String,
}

impl EchoGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: reply.to_string(),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Generator whose every call fails, for exercising the failure path.
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::Generation("scripted failure".to_string()))
    }
}
