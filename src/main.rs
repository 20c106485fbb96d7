//! # Event Recall CLI (`evrec`)
//!
//! Entry point for the event-recall service and its operator commands.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `evrec serve` | Run diagnostics, then start the HTTP service |
//! | `evrec check` | Verify the vector store and model server are reachable |
//! | `evrec ingest <file>` | Ingest one event or an array of events from a JSON file (`-` for stdin) |
//! | `evrec ask "<question>"` | Answer a question from the stored event log |
//!
//! All settings come from the environment; see [`config::Config::from_env`]
//! for keys and defaults.

mod answer;
mod chroma;
mod config;
mod diag;
mod error;
mod ingest;
mod models;
mod normalize;
mod ollama;
mod retrieve;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use crate::chroma::{ChromaClient, Collection};
use crate::config::Config;
use crate::models::QueryRequest;
use crate::ollama::OllamaClient;

#[derive(Parser)]
#[command(
    name = "evrec",
    about = "Retrieval-augmented question answering over a smart-home event log",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service.
    ///
    /// Runs the connection diagnostics first; an unreachable vector
    /// store aborts startup, missing models only warn.
    Serve,

    /// Check connectivity to the vector store and the model server.
    Check,

    /// Ingest events from a JSON file.
    ///
    /// The file may hold a single event object or an array of them.
    /// Pass `-` to read from stdin.
    Ingest {
        /// Path to the JSON file, or `-` for stdin.
        file: PathBuf,
    },

    /// Ask a question against the stored event log.
    Ask {
        /// The question text.
        question: String,

        /// Sampling temperature passed through to the chat model.
        #[arg(long)]
        temperature: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => {
            let (ollama, chroma) = build_clients(&config)?;
            diag::check_connections(&config, &ollama, &chroma).await?;
            let collection = resolve_collection(&config, &chroma).await?;
            let state = server::AppState::new(config, ollama, collection);
            server::run_server(state).await?;
        }
        Commands::Check => {
            let (ollama, chroma) = build_clients(&config)?;
            diag::check_connections(&config, &ollama, &chroma).await?;
            let collection = resolve_collection(&config, &chroma).await?;
            println!(
                "ok: collection '{}' ({}) ready",
                collection.name, collection.id
            );
        }
        Commands::Ingest { file } => {
            let (ollama, chroma) = build_clients(&config)?;
            let collection = resolve_collection(&config, &chroma).await?;
            run_ingest(&config, &ollama, &collection, &file).await?;
        }
        Commands::Ask {
            question,
            temperature,
        } => {
            let (ollama, chroma) = build_clients(&config)?;
            let collection = resolve_collection(&config, &chroma).await?;
            let query = QueryRequest {
                user_query: Some(question),
                options: temperature.map(|t| serde_json::json!({ "temperature": t })),
            };
            let reply = answer::answer_question(&ollama, &collection, &config, &query)
                .await
                .map_err(anyhow::Error::new)?;
            println!("{}", reply);
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("event_recall=info,evrec=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn build_clients(config: &Config) -> Result<(OllamaClient, ChromaClient)> {
    let ollama = OllamaClient::new(&config.ollama.host, config.request_timeout_secs)?;
    let chroma = ChromaClient::new(
        &config.chroma.host,
        config.chroma.port,
        config.request_timeout_secs,
    )?;
    Ok((ollama, chroma))
}

async fn resolve_collection(config: &Config, chroma: &ChromaClient) -> Result<Collection> {
    chroma
        .get_or_create_collection(&config.chroma.collection)
        .await
        .with_context(|| format!("could not open collection '{}'", config.chroma.collection))
}

async fn run_ingest(
    config: &Config,
    ollama: &OllamaClient,
    collection: &Collection,
    file: &PathBuf,
) -> Result<()> {
    let raw = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("could not read {}", file.display()))?
    };

    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("input is not valid JSON")?;

    let events = match payload {
        serde_json::Value::Array(items) => items,
        single => vec![single],
    };

    let mut stored = 0usize;
    for (index, item) in events.into_iter().enumerate() {
        let event: models::EventRecord = serde_json::from_value(item)
            .with_context(|| format!("event #{} has an invalid shape", index))?;
        let doc_id = ingest::ingest_event(ollama, collection, config, &event)
            .await
            .map_err(anyhow::Error::new)
            .with_context(|| format!("event #{} was not stored", index))?;
        println!("{}", doc_id);
        stored += 1;
    }

    println!("stored {} event(s)", stored);
    Ok(())
}
