//! HTTP service shell.
//!
//! Exposes the pipeline over a JSON API:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/events` | Ingest one structured event |
//! | `POST` | `/tools/get_event_answer` | Answer a question from the event log |
//! | `GET`  | `/openapi.json` | Tool schema for agent integration |
//! | `GET`  | `/health` | Liveness probe (returns version) |
//!
//! The ingestion endpoint answers `{status, message, doc_id}`; the tool
//! endpoint answers `{answer}` or `{error}`. All origins, methods, and
//! headers are permitted so browser-based agents can call the tool
//! endpoint cross-origin.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::answer::answer_question;
use crate::chroma::Collection;
use crate::config::Config;
use crate::error::PipelineError;
use crate::ingest::ingest_event;
use crate::models::{EventRecord, QueryRequest};
use crate::ollama::OllamaClient;

/// Shared application state, built once before the listener binds and
/// cloned per request. The client handles are read-only singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ollama: Arc<OllamaClient>,
    pub collection: Arc<Collection>,
}

impl AppState {
    pub fn new(config: Config, ollama: OllamaClient, collection: Collection) -> Self {
        Self {
            config: Arc::new(config),
            ollama: Arc::new(ollama),
            collection: Arc::new(collection),
        }
    }
}

/// Assemble the router. Split from [`run_server`] so tests can serve it
/// on an ephemeral listener.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/events", post(handle_event))
        .route("/tools/get_event_answer", post(handle_query))
        .route("/openapi.json", get(handle_openapi))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind_addr();
    let app = build_router(state);

    info!("listening on http://{}", bind_addr);
    info!("  event ingestion:  POST /events");
    info!("  question answers: POST /tools/get_event_answer");
    info!("  tool schema:      GET  /openapi.json");
    info!("  health check:     GET  /health");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ POST /events ============

/// JSON envelope for the ingestion endpoint.
#[derive(Serialize)]
struct IngestResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_id: Option<String>,
}

async fn handle_event(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let event: EventRecord = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(IngestResponse {
                    status: "error",
                    message: format!("Invalid event payload: {}", err),
                    doc_id: None,
                }),
            )
                .into_response();
        }
    };

    match ingest_event(&state.ollama, &state.collection, &state.config, &event).await {
        Ok(doc_id) => (
            StatusCode::OK,
            Json(IngestResponse {
                status: "success",
                message: "Event processed and stored".to_string(),
                doc_id: Some(doc_id),
            }),
        )
            .into_response(),
        Err(err) => (
            err.status_code(),
            Json(IngestResponse {
                status: "error",
                message: err.to_string(),
                doc_id: None,
            }),
        )
            .into_response(),
    }
}

// ============ POST /tools/get_event_answer ============

#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(Serialize)]
struct ToolErrorResponse {
    error: String,
}

async fn handle_query(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let query: QueryRequest = match serde_json::from_value(payload) {
        Ok(query) => query,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ToolErrorResponse {
                    error: format!("Invalid request payload: {}", err),
                }),
            )
                .into_response();
        }
    };

    if let Some(question) = query.user_query.as_deref() {
        info!(question = %question, "tool query received");
    }

    match answer_question(&state.ollama, &state.collection, &state.config, &query).await {
        Ok(answer) => (StatusCode::OK, Json(AnswerResponse { answer })).into_response(),
        Err(err @ PipelineError::Validation { .. }) => (
            err.status_code(),
            Json(ToolErrorResponse {
                error: "Parameter 'user_query' is missing".to_string(),
            }),
        )
            .into_response(),
        Err(err) => (
            err.status_code(),
            Json(ToolErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ GET /openapi.json ============

async fn handle_openapi() -> Json<Value> {
    Json(openapi_document())
}

/// Static OpenAPI 3.0 document advertising the tool endpoint, for agent
/// frameworks that discover tools by schema.
pub fn openapi_document() -> Value {
    serde_json::json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Home Event Answer Server",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Answers questions about recorded smart-home events, grounded in the event database."
        },
        "servers": [
            { "url": "/" }
        ],
        "paths": {
            "/tools/get_event_answer": {
                "post": {
                    "summary": "Answer a question from the recorded event log.",
                    "operationId": "getEventAnswer",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "user_query": {
                                            "type": "string",
                                            "description": "The user's question about recorded events (presence, temperature, device state)."
                                        },
                                        "options": {
                                            "type": "object",
                                            "description": "Optional generation parameters passed through to the model (temperature, top_p, ...).",
                                            "additionalProperties": true
                                        }
                                    },
                                    "required": ["user_query"]
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Answer grounded in the retrieved context",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "answer": { "type": "string" }
                                        }
                                    }
                                }
                            }
                        },
                        "400": {
                            "description": "Invalid request",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "error": { "type": "string" } }
                                    }
                                }
                            }
                        },
                        "500": {
                            "description": "Pipeline failure",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "error": { "type": "string" } }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
