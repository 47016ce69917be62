//! # HeirAid CLI (`heiraid`)
//!
//! The `heiraid` binary drives the whole system: search index setup, the
//! ingestion pipeline, ad-hoc role-filtered search, one-shot grounded chat,
//! and the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! heiraid --config ./config/heiraid.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `heiraid init` | Create or update the search index schema |
//! | `heiraid ingest` | Run the ingestion pipeline over configured containers |
//! | `heiraid search "<query>"` | Role-filtered search against the index |
//! | `heiraid chat "<question>"` | One-shot grounded answer |
//! | `heiraid serve api` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Create the index
//! heiraid init --config ./config/heiraid.toml
//!
//! # Ingest one container, showing what would happen first
//! heiraid ingest --container legal-statutes --dry-run
//! heiraid ingest --container legal-statutes
//!
//! # Search as a member of the public
//! heiraid search "year's support" --role public
//!
//! # Ask a question in Spanish as a legal professional
//! heiraid chat "¿Quién puede solicitar cartas de administración?" \
//!     --language es --role legal_professional
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use heiraid::{chat, config, ingest, search, search_index, server};

/// HeirAid — role-aware legal document search and grounded chat.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/heiraid.example.toml` for a full example. Service
/// credentials come from environment variables, never from the file.
#[derive(Parser)]
#[command(
    name = "heiraid",
    about = "HeirAid — role-aware legal document ingestion, search, and grounded chat",
    version,
    long_about = "HeirAid ingests legal documents from Azure Blob Storage, tags them with \
    role-based access lists, indexes them into Azure AI Search, and answers questions with a \
    hosted chat model grounded on the documents each caller is allowed to see."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/heiraid.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create or update the search index schema.
    ///
    /// Idempotent — running it multiple times is safe. Ingestion also does
    /// this implicitly, but `init` lets deployment verify credentials and
    /// schema before any data moves.
    Init,

    /// Run the ingestion pipeline.
    ///
    /// For every configured container: list or use the configured file set,
    /// download each blob, extract its text, tag it with RBAC roles, and
    /// upload the batch to the search index. Per-file failures are skipped;
    /// an index schema failure aborts the run.
    Ingest {
        /// Only ingest this container (must appear in the config).
        #[arg(long)]
        container: Option<String>,

        /// Show what would be ingested without calling the extraction or
        /// search services.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search indexed documents with a role filter.
    ///
    /// Roles given with `--role` form the user context. No roles means a
    /// deny-all filter: the query runs but matches nothing.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        top: Option<usize>,

        /// Role to search as (repeatable).
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// Ask a one-shot question grounded on visible documents.
    Chat {
        /// The question to answer.
        question: String,

        /// Answer language (BCP-47 code). Non-English requires a configured
        /// translator endpoint.
        #[arg(long, default_value = "en")]
        language: String,

        /// Role to ask as (repeatable).
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// Start the HTTP API server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the JSON API (`POST /chat`, `POST /search`, `GET /health`)
    /// on the address configured in `[server].bind`.
    Api,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let index = search_index::SearchIndexClient::new(&cfg.search)?;
            index.ensure_index().await?;
            println!("Search index '{}' ready.", index.index_name());
        }
        Commands::Ingest {
            container,
            dry_run,
            limit,
        } => {
            ingest::run_ingest(&cfg, container, dry_run, limit).await?;
        }
        Commands::Search { query, top, roles } => {
            search::run_search(&cfg, &query, top, roles).await?;
        }
        Commands::Chat {
            question,
            language,
            roles,
        } => {
            chat::run_chat(&cfg, &question, &language, roles).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Api => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
