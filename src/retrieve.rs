//! Context retrieval.
//!
//! Fetches the nearest stored event texts for a query embedding and
//! assembles them into the context block handed to generation. The
//! store's similarity order is authoritative; nothing is re-ranked here.
//!
//! A store failure is treated the same as an empty result: the sentinel
//! goes into the prompt and the model says it has nothing to go on. The
//! query itself still succeeds.

use tracing::warn;

use crate::chroma::Collection;

/// Context handed to generation when retrieval produced nothing.
pub const NO_CONTEXT_SENTINEL: &str =
    "No specific information found for this question in the database.";

/// Header line above the retrieved documents.
const CONTEXT_HEADER: &str = "Relevant information from the database:";

/// Assemble the context block: one bulleted line per document, in the
/// given order, or the sentinel for an empty set.
pub fn build_context_block(documents: &[String]) -> String {
    if documents.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    let mut block = String::from(CONTEXT_HEADER);
    block.push('\n');
    for doc in documents {
        block.push_str("- ");
        block.push_str(doc);
        block.push('\n');
    }
    block
}

/// Query the store for the `k` nearest documents and build the context
/// block. Store errors degrade to the sentinel.
pub async fn retrieve_context(collection: &Collection, embedding: &[f32], k: usize) -> String {
    let documents = match collection.query_documents(embedding, k).await {
        Ok(documents) => documents,
        Err(err) => {
            warn!(collection = %collection.name, "retrieval failed, continuing without context: {err:#}");
            Vec::new()
        }
    };
    build_context_block(&documents)
}
