//! Backend-agnostic chat interface used by the generator and the evaluator.
//!
//! Concrete backends live in `openai.rs` (OpenAI-compatible chat/completions)
//! and `ollama.rs` (local Ollama `/api/chat`). Callers only ever see
//! `dyn ModelClient` plus the timeout wrapper below.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ModelError;
use crate::ollama::OllamaClient;
use crate::openai::OpenAiClient;

/// Which configured model to use. Backends may map both to the same model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelRole {
  General,
  Math,
}

/// One system+user exchange. `response_schema`, when set, asks the backend
/// for JSON output (a JSON-schema for Ollama, `json_object` mode for OpenAI).
#[derive(Clone, Debug)]
pub struct ChatRequest {
  pub role: ModelRole,
  pub system: String,
  pub user: String,
  pub temperature: f32,
  pub response_schema: Option<Value>,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
  /// Backend name for logs.
  fn name(&self) -> &str;

  /// Raw completion text. Parsing is the caller's job.
  async fn chat(&self, req: &ChatRequest) -> Result<String, ModelError>;
}

/// Run one chat call bounded by `limit`. A timeout is reported like any other
/// upstream failure; there are no retries.
pub async fn chat_with_timeout(client: &dyn ModelClient, req: &ChatRequest, limit: Duration) -> Result<String, ModelError> {
  match tokio::time::timeout(limit, client.chat(req)).await {
    Ok(res) => res,
    Err(_) => Err(ModelError::Timeout(limit)),
  }
}

/// Pick a backend from MODEL_BACKEND (openai | ollama | none).
/// Without MODEL_BACKEND: OpenAI when OPENAI_API_KEY is set, otherwise Ollama.
pub fn client_from_env() -> Option<Arc<dyn ModelClient>> {
  let backend = std::env::var("MODEL_BACKEND").ok().map(|s| s.trim().to_ascii_lowercase());
  let backend = match backend.as_deref() {
    Some("") | None => {
      if std::env::var("OPENAI_API_KEY").is_ok() { "openai" } else { "ollama" }
    }
    Some(other) => match other {
      "openai" | "openrouter" => "openai",
      "ollama" => "ollama",
      "none" | "disabled" | "off" => {
        warn!(target: "quizforge", "Model backend disabled; every question will come from the fallback catalog");
        return None;
      }
      unknown => {
        warn!(target: "quizforge", backend = %unknown, "Unknown MODEL_BACKEND; model calls disabled");
        return None;
      }
    },
  };

  let client: Option<Arc<dyn ModelClient>> = match backend {
    "openai" => OpenAiClient::from_env().map(|c| Arc::new(c) as Arc<dyn ModelClient>),
    _ => OllamaClient::from_env().map(|c| Arc::new(c) as Arc<dyn ModelClient>),
  };
  match &client {
    Some(c) => info!(target: "quizforge", backend = c.name(), "Model backend configured"),
    None => warn!(target: "quizforge", %backend, "Model backend could not be configured; using fallbacks only"),
  }
  client
}
