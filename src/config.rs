//! Environment-keyed configuration.
//!
//! Every knob has a default, so the service starts with no configuration
//! at all when Chroma and Ollama run on their conventional local ports.
//! Numeric values that are set but unparseable are startup errors, not
//! silent fallbacks.

use anyhow::{Context, Result};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub chroma: ChromaConfig,
    pub ollama: OllamaConfig,
    pub server: ServerConfig,
    pub rag: RagConfig,
    /// Timeout applied to every outbound HTTP call (embedding, store, chat).
    pub request_timeout_secs: u64,
}

/// Vector store connection settings.
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    pub host: String,
    pub port: u16,
    pub collection: String,
}

/// Generation service settings: one host, two model names.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
    pub embedding_model: String,
    pub chat_model: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Number of nearest documents fetched per query.
    pub result_count: usize,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Assemble the configuration from the process environment.
    ///
    /// | Key | Default |
    /// |-----|---------|
    /// | `CHROMA_HOST` | `localhost` |
    /// | `CHROMA_PORT` | `8087` |
    /// | `CHROMA_COLLECTION` | `home_events` |
    /// | `OLLAMA_HOST` | `http://localhost:11434` |
    /// | `EMBEDDING_MODEL` | `nomic-embed-text` |
    /// | `CHAT_MODEL` | `gemma3:4b` |
    /// | `BIND_HOST` | `0.0.0.0` |
    /// | `BIND_PORT` | `5000` |
    /// | `RAG_RESULT_COUNT` | `10` |
    /// | `REQUEST_TIMEOUT_SECS` | `120` |
    pub fn from_env() -> Result<Self> {
        let config = Self {
            chroma: ChromaConfig {
                host: env_or("CHROMA_HOST", "localhost"),
                port: env_parse("CHROMA_PORT", 8087)?,
                collection: env_or("CHROMA_COLLECTION", "home_events"),
            },
            ollama: OllamaConfig {
                host: env_or("OLLAMA_HOST", "http://localhost:11434"),
                embedding_model: env_or("EMBEDDING_MODEL", "nomic-embed-text"),
                chat_model: env_or("CHAT_MODEL", "gemma3:4b"),
            },
            server: ServerConfig {
                host: env_or("BIND_HOST", "0.0.0.0"),
                port: env_parse("BIND_PORT", 5000)?,
            },
            rag: RagConfig {
                result_count: env_parse("RAG_RESULT_COUNT", 10)?,
            },
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 120)?,
        };

        if config.rag.result_count < 1 {
            anyhow::bail!("RAG_RESULT_COUNT must be >= 1");
        }

        Ok(config)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covers all env-dependent behavior: the process environment
    // is shared across test threads, so splitting these would race.
    #[test]
    fn env_defaults_and_parse_errors() {
        std::env::remove_var("CHROMA_PORT");
        std::env::remove_var("REQUEST_TIMEOUT_SECS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.chroma.port, 8087);
        assert_eq!(config.chroma.collection, "home_events");
        assert_eq!(config.ollama.embedding_model, "nomic-embed-text");
        assert_eq!(config.rag.result_count, 10);
        assert_eq!(config.request_timeout_secs, 120);

        std::env::set_var("REQUEST_TIMEOUT_SECS", "soon");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
        std::env::remove_var("REQUEST_TIMEOUT_SECS");
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:5000");
    }
}
