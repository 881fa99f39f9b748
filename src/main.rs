//! QuizForge · elementary-school question generation backend
//!
//! - Axum HTTP + WebSocket API
//! - Question generation through an OpenAI-compatible or Ollama model, with
//!   repair, validation and an embedded fallback catalog
//! - Free-text answer evaluation (grammar, reading comprehension)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   MODEL_BACKEND      : "openai" | "ollama" | "none" (default: openai if OPENAI_API_KEY is set, else ollama)
//!   OPENAI_API_KEY     : API key for the OpenAI-compatible backend
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL       : default "gpt-4o-mini"
//!   OPENAI_MATH_MODEL  : optional override for Math questions
//!   OLLAMA_BASE_URL    : default "http://localhost:11434"
//!   OLLAMA_MODEL       : default "mistral"
//!   OLLAMA_MATH_MODEL  : optional override for Math questions
//!   MODEL_TIMEOUT_SECS : per-call bound (default 30)
//!   QUIZ_CONFIG_PATH   : path to TOML config (prompt overrides + extra fallback questions)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod lexicon;
mod prompts;
mod repair;
mod validate;
mod arithmetic;
mod catalog;
mod model;
mod openai;
mod ollama;
mod generator;
mod evaluator;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (prompts, fallback catalog, model client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizforge", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
