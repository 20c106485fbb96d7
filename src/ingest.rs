//! Event ingestion.
//!
//! Coordinates the write path: validate the incoming record, normalize
//! it to text, embed the text, and persist id + embedding + text +
//! metadata as one store record. There is no partial-success state: any
//! failure before the store call leaves nothing behind, and the store
//! add is atomic per call.

use chrono::Local;
use tracing::{error, info};

use crate::chroma::Collection;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{DataType, DocumentMetadata, EventRecord};
use crate::normalize::normalize;
use crate::ollama::OllamaClient;

/// Names of the fields a valid event must carry, in reporting order.
const REQUIRED_FIELDS: [&str; 4] = [
    "device_name",
    "event_type",
    "data_type",
    "human_readable_description",
];

/// Collect the names of missing required fields. The `value` key is
/// checked for presence, not truthiness: `null`, `false` and `0` pass.
pub fn missing_fields(event: &EventRecord) -> Vec<String> {
    let mut missing = Vec::new();
    let present = [
        event.device_name.is_some(),
        event.event_type.is_some(),
        event.data_type.is_some(),
        event.human_readable_description.is_some(),
    ];
    for (name, present) in REQUIRED_FIELDS.iter().zip(present) {
        if !present {
            missing.push(name.to_string());
        }
    }
    if event.value.is_none() {
        missing.push("value".to_string());
    }
    missing
}

/// Compose the document id:
/// `<device with '.' → '-'>_<data_type>_<effective ms>_<3 random bytes hex>`.
///
/// The random suffix disambiguates events sharing a timestamp; dots are
/// replaced so the device segment cannot be confused with an id
/// namespace separator downstream.
pub fn compose_doc_id(device_name: &str, data_type: &str, timestamp_ms: i64) -> String {
    let suffix = hex::encode(rand::random::<[u8; 3]>());
    format!(
        "{}_{}_{}_{}",
        device_name.replace('.', "-"),
        data_type,
        timestamp_ms,
        suffix
    )
}

/// Ingest one event and return the stored document id.
pub async fn ingest_event(
    ollama: &OllamaClient,
    collection: &Collection,
    config: &Config,
    event: &EventRecord,
) -> Result<String, PipelineError> {
    let missing = missing_fields(event);
    if !missing.is_empty() {
        return Err(PipelineError::Validation { missing });
    }

    let normalized = normalize(event, Local::now());
    info!(text = %normalized.text, "ingesting event");

    let embedding = ollama
        .embed(&config.ollama.embedding_model, &normalized.text)
        .await
        .map_err(|err| {
            error!("event embedding failed: {err:#}");
            PipelineError::Embedding(err.to_string())
        })?;

    let device_name = event.device_name.clone().unwrap_or_default();
    let data_type = event.data_type.unwrap_or(DataType::Mixed);
    let doc_id = compose_doc_id(&device_name, data_type.as_str(), normalized.effective_timestamp_ms);

    let metadata = DocumentMetadata {
        device_name,
        event_type: event.event_type.clone().unwrap_or_default(),
        value: event.value.clone().unwrap_or_default(),
        data_type: data_type.as_str().to_string(),
        description: event.human_readable_description.clone().unwrap_or_default(),
        location: event.location.clone().unwrap_or_else(|| "unknown".to_string()),
        timestamp_iso: normalized.timestamp_iso.clone(),
        original_timestamp_ms: normalized.original_timestamp_ms,
        timestamp_formatted: normalized.timestamp_formatted.clone(),
        text: normalized.text.clone(),
    };

    collection
        .add(&doc_id, &embedding, &normalized.text, &metadata)
        .await
        .map_err(|err| {
            error!("store write failed: {err:#}");
            PipelineError::Storage(err.to_string())
        })?;

    info!(doc_id = %doc_id, collection = %collection.name, "event stored");
    Ok(doc_id)
}
