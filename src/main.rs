//! # Studyhall CLI
//!
//! The `studyhall` binary manages the course retrieval store.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `studyhall init` | Create the SQLite database and run schema migrations |
//! | `studyhall ingest <category> <file.json>` | Ingest a JSON batch of documents |
//! | `studyhall wipe <category>` | Delete all documents of one category |
//! | `studyhall threads` | List already-ingested discussion thread ids |
//! | `studyhall query "<question>"` | Run retrieval and print ranked passages |
//! | `studyhall stats` | Show document counts per category |
//!
//! All commands accept a `--config` flag pointing to a TOML configuration
//! file. See `config/studyhall.example.toml`.
//!
//! The ingest file is a JSON array of `{ "content": ..., "metadata": ... }`
//! items where each metadata object carries a `"type"` tag matching the
//! batch category.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use studyhall::models::{Category, IngestItem};
use studyhall::store::sqlite::SqliteStore;
use studyhall::Store;
use studyhall::{config, db, embedding, ingest, migrate, retrieve};

/// Studyhall — retrieval and ranking engine for course Q&A.
#[derive(Parser)]
#[command(
    name = "studyhall",
    about = "Retrieval and ranking engine for course discussion threads and instruction documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/studyhall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Ingest a JSON batch of documents into one category.
    Ingest {
        /// Document category: instruction or discussion.
        category: String,
        /// Path to a JSON array of `{content, metadata}` items.
        file: PathBuf,
        /// Wipe the category before ingesting.
        #[arg(long)]
        wipe: bool,
    },

    /// Delete all documents (and their chunks) of one category.
    Wipe {
        /// Document category: instruction or discussion.
        category: String,
    },

    /// List thread ids of already-ingested discussion documents.
    Threads,

    /// Retrieve the ranked passages most relevant to a question.
    Query {
        /// The question to search for.
        question: String,
        /// Print results as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Show document counts per category.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&config).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("init");
            println!("  database: {}", config.db.path.display());
            println!("ok");
        }

        Commands::Ingest {
            category,
            file,
            wipe,
        } => {
            let category = Category::parse(&category)?;
            let items: Vec<IngestItem> = serde_json::from_str(
                &std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?,
            )
            .with_context(|| format!("Failed to parse {}", file.display()))?;

            let embedder = embedding::create_embedder(&config.embedding)?;
            let pool = db::connect(&config).await?;
            migrate::run_migrations(&pool).await?;
            let store = SqliteStore::new(pool);

            if wipe {
                let removed = ingest::wipe(&store, category).await?;
                println!("wiped {} {} documents", removed, category);
            }

            let total = items.len();
            let report = ingest::ingest_batch(
                &store,
                embedder.as_ref(),
                config.embedding.batch_size,
                category,
                items,
            )
            .await;

            println!("ingest {}", category);
            println!("  items: {}", total);
            println!("  succeeded: {}", report.succeeded());
            println!("  failed: {}", report.failed());
            println!("  chunks written: {}", report.chunks_written());
            for outcome in report.outcomes.iter().filter(|o| !o.is_ok()) {
                eprintln!(
                    "  item {} ({}): {}",
                    outcome.index,
                    outcome.title,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            store.pool().close().await;
        }

        Commands::Wipe { category } => {
            let category = Category::parse(&category)?;
            let pool = db::connect(&config).await?;
            let store = SqliteStore::new(pool);
            let removed = ingest::wipe(&store, category).await?;
            println!("wipe {}", category);
            println!("  documents removed: {}", removed);
            store.pool().close().await;
        }

        Commands::Threads => {
            let pool = db::connect(&config).await?;
            let store = SqliteStore::new(pool);
            let ids = store.discussion_thread_ids().await?;
            for id in &ids {
                println!("{}", id);
            }
            eprintln!("{} threads ingested", ids.len());
            store.pool().close().await;
        }

        Commands::Query { question, json } => {
            let embedder = embedding::create_embedder(&config.embedding)?;
            let pool = db::connect(&config).await?;
            let store = SqliteStore::new(pool);

            let results = retrieve::find_relevant_content(
                &store,
                embedder.as_ref(),
                &config.retrieval,
                &question,
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("no relevant content found");
            } else {
                for (i, c) in results.iter().enumerate() {
                    println!(
                        "{}. [{}] {} (similarity {:.3}, score {:.3})",
                        i + 1,
                        c.category,
                        c.metadata.title(),
                        c.similarity,
                        c.score
                    );
                    println!("   {}", c.content);
                }
            }
            store.pool().close().await;
        }

        Commands::Stats => {
            let pool = db::connect(&config).await?;
            let store = SqliteStore::new(pool);
            println!("stats");
            println!(
                "  instruction documents: {}",
                store.count_documents(Category::Instruction).await?
            );
            println!(
                "  discussion documents: {}",
                store.count_documents(Category::Discussion).await?
            );
            store.pool().close().await;
        }
    }

    Ok(())
}
