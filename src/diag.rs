//! Startup connection diagnostics.
//!
//! Run before the server binds and on demand via `evrec check`. The
//! vector store must answer its heartbeat or the service refuses to
//! start; missing Ollama models only warn, since they can be pulled
//! while the service is already running.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chroma::ChromaClient;
use crate::config::Config;
use crate::ollama::OllamaClient;

pub async fn check_connections(
    config: &Config,
    ollama: &OllamaClient,
    chroma: &ChromaClient,
) -> Result<()> {
    chroma
        .heartbeat()
        .await
        .context("vector store health check failed")?;
    info!(
        "Chroma reachable at {}:{}, collection '{}'",
        config.chroma.host, config.chroma.port, config.chroma.collection
    );

    match ollama.list_models().await {
        Ok(models) => {
            info!("Ollama reachable at {}", config.ollama.host);
            warn_if_missing(&models, &config.ollama.embedding_model, "embedding");
            warn_if_missing(&models, &config.ollama.chat_model, "chat");
        }
        Err(err) => {
            // Non-fatal: Ollama may come up after us.
            warn!("could not list Ollama models: {err:#}");
        }
    }

    Ok(())
}

/// Prefix match, because installed tags carry suffixes like `:latest`.
fn warn_if_missing(installed: &[String], wanted: &str, role: &str) {
    if installed.iter().any(|m| m.starts_with(wanted)) {
        info!("{} model '{}' is available", role, wanted);
    } else {
        warn!(
            "{} model '{}' not found on the Ollama server; available: {}",
            role,
            wanted,
            installed.join(", ")
        );
    }
}
