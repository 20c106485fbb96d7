//! Ollama HTTP client.
//!
//! Wraps the three endpoints the pipeline consumes: `/api/embeddings`
//! for the embedding gateway, `/api/chat` (non-streaming) for answer
//! generation, and `/api/tags` for the startup model inventory.
//!
//! Errors are returned to the caller, never retried here; retry policy
//! belongs to whoever submits events or questions.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// A single message in a chat exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Shared, read-only handle to one Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// `base_url` is a full origin, e.g. `http://localhost:11434`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Compute the embedding vector for one text.
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": model,
            "prompt": text,
        });

        let response = self
            .http
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama embeddings error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_embedding_response(&json)
    }

    /// Run a non-streaming chat exchange and return the reply text.
    ///
    /// `options` is handed through verbatim (temperature, top_p, ...).
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: Option<&Value>,
    ) -> Result<String> {
        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });
        if let Some(options) = options {
            body["options"] = options.clone();
        }

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama chat error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_chat_response(&json)
    }

    /// List the model names installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama tags error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_tags_response(&json)
    }
}

/// Extract the `embedding` array from an embeddings response.
fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("embedding")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing embedding array"))?;

    if embedding.is_empty() {
        bail!("Invalid embeddings response: empty embedding");
    }

    Ok(embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}

/// Extract `message.content` from a chat response. A reply without the
/// content field is an error, not an empty answer.
fn parse_chat_response(json: &Value) -> Result<String> {
    match json
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
    {
        Some(content) => Ok(content.to_string()),
        None => bail!("No valid content in chat response"),
    }
}

/// Extract model names from a tags response. Newer servers report the
/// name under `model`, older ones under `name`; accept either.
fn parse_tags_response(json: &Value) -> Result<Vec<String>> {
    let models = json
        .get("models")
        .and_then(|m| m.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid tags response: missing models array"))?;

    Ok(models
        .iter()
        .filter_map(|m| {
            m.get("model")
                .or_else(|| m.get("name"))
                .and_then(|n| n.as_str())
                .map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_embedding_array() {
        let json = json!({"embedding": [0.25, -1.5, 3.0]});
        let vec = parse_embedding_response(&json).unwrap();
        assert_eq!(vec, vec![0.25, -1.5, 3.0]);
    }

    #[test]
    fn missing_embedding_is_an_error() {
        assert!(parse_embedding_response(&json!({})).is_err());
        assert!(parse_embedding_response(&json!({"embedding": []})).is_err());
    }

    #[test]
    fn parses_chat_content() {
        let json = json!({"message": {"role": "assistant", "content": "The light is on."}});
        assert_eq!(parse_chat_response(&json).unwrap(), "The light is on.");
    }

    #[test]
    fn chat_reply_without_content_is_an_error() {
        for reply in [json!({}), json!({"message": {}}), json!({"message": {"content": 7}})] {
            let err = parse_chat_response(&reply).unwrap_err();
            assert!(err.to_string().contains("No valid content"));
        }
    }

    #[test]
    fn tags_accept_both_name_keys() {
        let json = json!({"models": [
            {"model": "nomic-embed-text:latest"},
            {"name": "gemma3:4b"},
            {"size": 123}
        ]});
        let models = parse_tags_response(&json).unwrap();
        assert_eq!(models, vec!["nomic-embed-text:latest", "gemma3:4b"]);
    }

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("a").role, "system");
        assert_eq!(ChatMessage::user("b").role, "user");
    }
}
