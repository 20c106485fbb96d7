//! Chroma HTTP client.
//!
//! Talks to a Chroma server over its v1 REST API. The pipeline needs
//! exactly three capabilities: a liveness probe, a get-or-create handle
//! to one collection, and add/query on that collection. Index
//! maintenance, retention, and deletion stay on the Chroma side.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::models::DocumentMetadata;

/// Shared, read-only handle to one Chroma server.
#[derive(Debug, Clone)]
pub struct ChromaClient {
    http: reqwest::Client,
    base_url: String,
}

/// Handle to one collection, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Collection {
    http: reqwest::Client,
    base_url: String,
    pub id: String,
    pub name: String,
}

impl ChromaClient {
    pub fn new(host: &str, port: u16, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("http://{}:{}", host, port),
        })
    }

    /// Liveness probe against `GET /api/v1/heartbeat`.
    pub async fn heartbeat(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/api/v1/heartbeat", self.base_url))
            .send()
            .await
            .with_context(|| format!("Chroma unreachable at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Chroma heartbeat returned {}", status);
        }
        Ok(())
    }

    /// Resolve a collection by name, creating it when absent.
    pub async fn get_or_create_collection(&self, name: &str) -> Result<Collection> {
        let body = serde_json::json!({
            "name": name,
            "get_or_create": true,
        });

        let response = self
            .http
            .post(format!("{}/api/v1/collections", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Chroma unreachable at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Chroma collection error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        let id = json
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid collection response: missing id"))?
            .to_string();

        Ok(Collection {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            id,
            name: name.to_string(),
        })
    }
}

impl Collection {
    /// Persist one document with its embedding and metadata.
    ///
    /// A single add call is atomic on the Chroma side: the record is
    /// either fully present afterwards or not at all.
    pub async fn add(
        &self,
        doc_id: &str,
        embedding: &[f32],
        document: &str,
        metadata: &DocumentMetadata,
    ) -> Result<()> {
        let body = serde_json::json!({
            "ids": [doc_id],
            "embeddings": [embedding],
            "documents": [document],
            "metadatas": [metadata],
        });

        let response = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/add",
                self.base_url, self.id
            ))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Chroma add error {}: {}", status, body_text);
        }
        Ok(())
    }

    /// Fetch the texts of the `n_results` nearest documents, in the
    /// similarity order the store returns them.
    pub async fn query_documents(&self, embedding: &[f32], n_results: usize) -> Result<Vec<String>> {
        let body = serde_json::json!({
            "query_embeddings": [embedding],
            "n_results": n_results,
            "include": ["documents"],
        });

        let response = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.base_url, self.id
            ))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Chroma query error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        Ok(parse_query_documents(&json))
    }
}

/// Pull the first documents row out of a query response.
///
/// The response nests one row per query embedding; we always send exactly
/// one. A missing or empty structure reads as zero results.
fn parse_query_documents(json: &Value) -> Vec<String> {
    json.get("documents")
        .and_then(|d| d.as_array())
        .and_then(|rows| rows.first())
        .and_then(|row| row.as_array())
        .map(|row| {
            row.iter()
                .filter_map(|doc| doc.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_documents_preserve_store_order() {
        let json = json!({
            "ids": [["a", "b", "c"]],
            "documents": [["first", "second", "third"]]
        });
        assert_eq!(
            parse_query_documents(&json),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn empty_or_missing_documents_read_as_zero_results() {
        assert!(parse_query_documents(&json!({})).is_empty());
        assert!(parse_query_documents(&json!({"documents": []})).is_empty());
        assert!(parse_query_documents(&json!({"documents": [[]]})).is_empty());
        assert!(parse_query_documents(&json!({"documents": null})).is_empty());
    }

    #[test]
    fn non_string_documents_are_skipped() {
        let json = json!({"documents": [["kept", 42, null, "also kept"]]});
        assert_eq!(parse_query_documents(&json), vec!["kept", "also kept"]);
    }
}
