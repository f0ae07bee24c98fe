//! # docsession CLI
//!
//! Command-line surface for the document-chat core. Authentication and the
//! HTTP transport of a full deployment live outside this crate; the CLI
//! plays the role of those boundaries, passing an already-authenticated
//! `--user` and a caller-supplied `--session` to the library.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsession init` | Create the SQLite database and run schema migrations |
//! | `docsession upload <path>` | Ingest a document into a session |
//! | `docsession chat "<question>"` | Ask a question in a session |
//! | `docsession history` | Print a session's conversation |
//! | `docsession sessions` | List the user's sessions, most recent first |
//! | `docsession delete-session` | Delete a session, its turns, and its documents |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docsession::chat::ChatEngine;
use docsession::config::{load_config, Config};
use docsession::embedding::OpenAiEmbedder;
use docsession::extract::{MIME_PDF, MIME_TEXT};
use docsession::generation::OpenAiGenerator;
use docsession::index::VectorIndex;
use docsession::{db, ingest, ledger, migrate};

/// Session-scoped document chat.
#[derive(Parser)]
#[command(
    name = "docsession",
    about = "Upload documents into a chat session and get retrieval-grounded answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docsession.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Upload and ingest a document into a session.
    ///
    /// Creates the ownership record, then extracts, chunks, embeds, and
    /// indexes the document. If ingestion fails the ownership record is
    /// rolled back before the error is reported.
    Upload {
        /// Path to the document (.pdf, .txt, .md).
        path: PathBuf,

        /// Authenticated user identifier.
        #[arg(long)]
        user: String,

        /// Session the document belongs to.
        #[arg(long)]
        session: String,
    },

    /// Ask a question in a session.
    ///
    /// Sessions with uploaded documents get answers grounded in those
    /// documents; sessions without documents get plain chat.
    Chat {
        /// The question text.
        query: String,

        #[arg(long)]
        user: String,

        #[arg(long)]
        session: String,
    },

    /// Print a session's conversation, oldest turn first.
    History {
        #[arg(long)]
        user: String,

        #[arg(long)]
        session: String,
    },

    /// List the user's sessions, most recently active first.
    Sessions {
        #[arg(long)]
        user: String,
    },

    /// Delete a session with all its turns and documents.
    DeleteSession {
        #[arg(long)]
        user: String,

        #[arg(long)]
        session: String,
    },
}

fn content_type_for(path: &Path) -> Result<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => Ok(MIME_PDF),
        Some("txt") | Some("md") => Ok(MIME_TEXT),
        other => bail!("unsupported file extension: {:?}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config: Config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&config.db.path).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("initialized {}", config.db.path.display());
        }

        Commands::Upload {
            path,
            user,
            session,
        } => {
            let content_type = content_type_for(&path)?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();

            let pool = db::connect(&config.db.path).await?;
            let index = VectorIndex::new(pool.clone());
            let embedder = OpenAiEmbedder::new(&config.embedding)?;

            let result = ingest::upload_document(
                &pool,
                &index,
                &embedder,
                &config.chunking,
                &bytes,
                content_type,
                &user,
                &session,
                &filename,
            )
            .await;
            pool.close().await;
            let (record, chunk_count) = result?;
            println!("uploaded {}", filename);
            println!("  file id: {}", record.id);
            println!("  chunks created: {}", chunk_count);
        }

        Commands::Chat {
            query,
            user,
            session,
        } => {
            let pool = db::connect(&config.db.path).await?;
            let index = VectorIndex::new(pool.clone());
            let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
            let generator = Arc::new(OpenAiGenerator::new(&config.generation)?);

            let engine = ChatEngine::new(
                pool.clone(),
                index,
                embedder,
                generator,
                config.retrieval.limit,
            );
            let reply = engine.answer(&query, &user, &session).await?;

            pool.close().await;
            println!("{}", reply);
        }

        Commands::History { user, session } => {
            let pool = db::connect(&config.db.path).await?;
            let turns = ledger::history(&pool, &user, &session).await?;
            pool.close().await;

            for turn in turns {
                println!("[{}] {}", turn.role.as_str(), turn.message);
            }
        }

        Commands::Sessions { user } => {
            let pool = db::connect(&config.db.path).await?;
            let sessions = ledger::list_sessions(&pool, &user).await?;
            pool.close().await;

            if sessions.is_empty() {
                println!("no sessions");
            }
            for summary in sessions {
                let date = chrono::DateTime::from_timestamp_millis(summary.last_timestamp)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{}  {}  {}", summary.session_id, date, summary.title);
            }
        }

        Commands::DeleteSession { user, session } => {
            let pool = db::connect(&config.db.path).await?;
            let index = VectorIndex::new(pool.clone());
            ledger::delete_session(&pool, &index, &user, &session).await?;
            pool.close().await;
            println!("deleted session {}", session);
        }
    }

    Ok(())
}
