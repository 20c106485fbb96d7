//! Grounded answer composition.
//!
//! The query path of the pipeline: embed the question, retrieve the
//! nearest event texts, and ask the chat model to answer strictly from
//! that context. The system instruction pins the model to the supplied
//! context; with the no-context sentinel in place the honest reply is
//! that the database has nothing on the topic.

use tracing::{debug, error};

use crate::chroma::Collection;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::QueryRequest;
use crate::ollama::{ChatMessage, OllamaClient};
use crate::retrieve::retrieve_context;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.\n\
Answer the user's question based solely on the following context.\n\
If the context is not sufficient to answer the question, please say so.\n\
Keep your answers clear and direct.";

/// Build the two-message exchange: the fixed system instruction and a
/// user message carrying the context block followed by the question.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
    ]
}

/// Answer a free-text question from the stored event log.
///
/// Fails with [`PipelineError::Validation`] for an empty question,
/// [`PipelineError::Embedding`] when the question cannot be embedded, and
/// [`PipelineError::Generation`] for chat-level failures. Retrieval
/// problems never fail the query; they degrade to the sentinel context.
pub async fn answer_question(
    ollama: &OllamaClient,
    collection: &Collection,
    config: &Config,
    query: &QueryRequest,
) -> Result<String, PipelineError> {
    let question = match query.user_query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q,
        _ => {
            return Err(PipelineError::Validation {
                missing: vec!["user_query".to_string()],
            })
        }
    };

    let embedding = ollama
        .embed(&config.ollama.embedding_model, question)
        .await
        .map_err(|err| {
            error!("query embedding failed: {err:#}");
            PipelineError::Embedding(err.to_string())
        })?;

    let context = retrieve_context(collection, &embedding, config.rag.result_count).await;
    debug!(context = %context, "assembled query context");

    let messages = build_messages(question, &context);
    ollama
        .chat(&config.ollama.chat_model, &messages, query.options.as_ref())
        .await
        .map_err(|err| {
            error!("chat completion failed: {err:#}");
            PipelineError::Generation(err.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::NO_CONTEXT_SENTINEL;

    #[test]
    fn exchange_is_system_then_user() {
        let messages = build_messages("Is the light on?", "Relevant information:\n- light on\n");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn system_message_pins_the_model_to_context() {
        let messages = build_messages("q", "c");
        assert!(messages[0].content.contains("based solely on the following context"));
        assert!(messages[0].content.contains("please say so"));
    }

    #[test]
    fn user_message_carries_context_then_question() {
        let messages = build_messages("Is the light on?", "- light on");
        let content = &messages[1].content;
        assert!(content.starts_with("Context:\n- light on"));
        assert!(content.ends_with("Question: Is the light on?"));
        let context_pos = content.find("- light on").unwrap();
        let question_pos = content.find("Question:").unwrap();
        assert!(context_pos < question_pos);
    }

    #[test]
    fn sentinel_context_is_embedded_verbatim() {
        let messages = build_messages("Anything?", NO_CONTEXT_SENTINEL);
        assert!(messages[1].content.contains(NO_CONTEXT_SENTINEL));
    }
}
