//! # Event Recall
//!
//! Retrieval-augmented question answering over a smart-home event log.
//!
//! Structured device events come in over HTTP, get rendered into one
//! natural-language sentence each, embedded, and stored in a Chroma
//! collection. Free-text questions are answered by embedding the
//! question, pulling the nearest stored event texts, and asking an
//! Ollama chat model to answer strictly from that retrieved context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐
//! │  Events  │──▶│ Normalize │──▶│  Embed  │──▶│  Chroma  │
//! │  (HTTP)  │   │  to text  │   │ (Ollama)│   │  (store) │
//! └──────────┘   └───────────┘   └─────────┘   └────┬─────┘
//!                                                   │ k nearest
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌────▼─────┐
//! │ Question │──▶│   Embed   │──▶│ Retrieve│──▶│  Answer  │
//! │  (HTTP)  │   │  (Ollama) │   │ context │   │ (Ollama) │
//! └──────────┘   └───────────┘   └─────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! evrec check                   # verify Chroma and Ollama are reachable
//! evrec serve                   # start the HTTP service
//! evrec ingest event.json       # ingest events from a file
//! evrec ask "Is the living room light on?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment-keyed configuration |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline failure taxonomy |
//! | [`normalize`] | Event-to-text normalization |
//! | [`ollama`] | Ollama client (embeddings, chat, model inventory) |
//! | [`chroma`] | Chroma client (collection handle, add, query) |
//! | [`retrieve`] | Nearest-neighbor retrieval and context assembly |
//! | [`answer`] | Grounded answer composition |
//! | [`ingest`] | Event validation and storage coordination |
//! | [`diag`] | Startup connection diagnostics |
//! | [`server`] | HTTP service shell |

pub mod answer;
pub mod chroma;
pub mod config;
pub mod diag;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod ollama;
pub mod retrieve;
pub mod server;
