//! # docsession
//!
//! Session-scoped document chat: upload documents into a conversation
//! session and get answers grounded in exactly those documents, falling
//! back to unconstrained chat when the session has none.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐   ┌───────────────────────┐   ┌─────────────┐
//! │ Upload │──▶│ Ingestion Pipeline     │──▶│ VectorIndex  │
//! │ (PDF)  │   │ extract→chunk→embed    │   │ tenant-scoped│
//! └────────┘   └───────────────────────┘   └──────┬──────┘
//!                                                 │ filtered search
//! ┌────────┐   ┌───────────────────────┐          │
//! │  Chat  │──▶│ ChatEngine             │◀─────────┘
//! │        │   │ RAG / plain per call   │──▶ generation service
//! └────────┘   └──────────┬────────────┘
//!                         ▼
//!                  session chat ledger
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`models`] | Core data types |
//! | [`chunk`] | Separator-priority splitter and chunk identity |
//! | [`embedding`] | Embedding service client |
//! | [`index`] | Tenant-aware vector index |
//! | [`extract`] | PDF / plain-text extraction |
//! | [`ingest`] | Ingestion pipeline |
//! | [`chat`] | Retrieval and answering policy |
//! | [`generation`] | Answer-generation service client |
//! | [`ledger`] | Session chat ledger |
//! | [`documents`] | Document-ownership records |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod ledger;
pub mod migrate;
pub mod models;

pub use error::Error;
