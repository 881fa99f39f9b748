//! Ollama client for local inference via the native `/api/chat` endpoint.
//!
//! When a response schema is given it is passed as `format`, which makes Ollama
//! constrain decoding to that JSON schema. No auth; the server is expected to be local.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::ModelError;
use crate::model::{ChatRequest, ModelClient, ModelRole};
use crate::util::trunc_for_log;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral";

#[derive(Clone)]
pub struct OllamaClient {
  client: reqwest::Client,
  base_url: String,
  model: String,
  math_model: String,
}

/// Strip trailing slashes and a `/v1` suffix (people often paste the OpenAI-compatible URL).
fn normalize_base_url(url: &str) -> String {
  let url = url.trim().trim_end_matches('/');
  url.strip_suffix("/v1").unwrap_or(url).to_string()
}

impl OllamaClient {
  pub fn new(base_url: &str, model: &str, math_model: Option<&str>) -> Option<Self> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(300)).build().ok()?;
    Some(Self {
      client,
      base_url: normalize_base_url(base_url),
      model: model.to_string(),
      math_model: math_model.unwrap_or(model).to_string(),
    })
  }

  /// OLLAMA_BASE_URL, OLLAMA_MODEL, OLLAMA_MATH_MODEL.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let math_model = std::env::var("OLLAMA_MATH_MODEL").ok();
    Self::new(&base_url, &model, math_model.as_deref())
  }

  fn model_for(&self, role: ModelRole) -> &str {
    match role {
      ModelRole::General => &self.model,
      ModelRole::Math => &self.math_model,
    }
  }

  fn request_body(&self, req: &ChatRequest) -> OllamaChatRequest {
    OllamaChatRequest {
      model: self.model_for(req.role).to_string(),
      messages: vec![
        OllamaMessage { role: "system".into(), content: req.system.clone() },
        OllamaMessage { role: "user".into(), content: req.user.clone() },
      ],
      stream: false,
      format: req.response_schema.clone(),
      options: OllamaOptions { temperature: req.temperature },
    }
  }
}

#[async_trait]
impl ModelClient for OllamaClient {
  fn name(&self) -> &str {
    "ollama"
  }

  #[instrument(level = "info", skip(self, req), fields(model = %self.model_for(req.role), user_len = req.user.len()))]
  async fn chat(&self, req: &ChatRequest) -> Result<String, ModelError> {
    let url = format!("{}/api/chat", self.base_url);
    let start = Instant::now();

    let res = self
      .client
      .post(&url)
      .header(CONTENT_TYPE, "application/json")
      .json(&self.request_body(req))
      .send()
      .await
      .map_err(|e| ModelError::Unavailable(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_ollama_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      warn!(target: "quizforge", status, %message, "Ollama HTTP error");
      return Err(ModelError::Http { status, message });
    }

    let body: OllamaChatResponse = res.json().await.map_err(|e| ModelError::Unavailable(e.to_string()))?;
    let text = body.message.map(|m| m.content).unwrap_or_default().trim().to_string();
    if text.is_empty() {
      return Err(ModelError::EmptyResponse);
    }
    debug!(
      target: "quizforge",
      elapsed = ?start.elapsed(),
      eval_count = ?body.eval_count,
      len = text.len(),
      preview = %trunc_for_log(&text, 200),
      "Ollama response received"
    );
    Ok(text)
  }
}

// --- DTOs ---

#[derive(Serialize)]
struct OllamaChatRequest {
  model: String,
  messages: Vec<OllamaMessage>,
  stream: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  format: Option<Value>,
  options: OllamaOptions,
}
#[derive(Serialize, Deserialize)]
struct OllamaMessage { role: String, content: String }
#[derive(Serialize)]
struct OllamaOptions { temperature: f32 }

#[derive(Deserialize)]
struct OllamaChatResponse {
  #[serde(default)] message: Option<OllamaMessage>,
  #[serde(default)] eval_count: Option<u64>,
}

fn extract_ollama_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EObj { error: String }
  serde_json::from_str::<EObj>(body).ok().map(|e| e.error)
}
