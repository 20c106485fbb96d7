//! Failure taxonomy for the ingestion and query pipeline.
//!
//! Every public pipeline operation returns one of these variants instead
//! of letting a transport error escape to the HTTP layer. Two conditions
//! are deliberately not errors: a failed retrieval degrades to the
//! no-context sentinel, and an unparseable origin timestamp degrades to
//! an inline text marker.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more required event fields are missing, or the query text
    /// is empty. Never retried.
    #[error("Missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    /// The embedding capability was unavailable or errored. The inner
    /// message is for the log; callers show a generic message.
    #[error("Error generating embedding")]
    Embedding(String),

    /// The chat capability errored or returned a response without the
    /// expected content field.
    #[error("RAG pipeline error: {0}")]
    Generation(String),

    /// The vector store rejected the write.
    #[error("Error storing event: {0}")]
    Storage(String),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Validation { .. } => StatusCode::BAD_REQUEST,
            PipelineError::Embedding(_)
            | PipelineError::Generation(_)
            | PipelineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
