//! Minimal OpenAI-compatible client (OpenAI, OpenRouter, anything speaking chat/completions).
//!
//! We only call chat/completions and request either plain text or a JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ModelError;
use crate::model::{ChatRequest, ModelClient, ModelRole};
use crate::util::trunc_for_log;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone)]
pub struct OpenAiClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub math_model: String,
}

impl OpenAiClient {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let math_model = std::env::var("OPENAI_MATH_MODEL").unwrap_or_else(|_| model.clone());

    // Outer bound comes from chat_with_timeout; this only guards stuck sockets.
    let client = reqwest::Client::builder().timeout(Duration::from_secs(120)).build().ok()?;

    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model, math_model })
  }

  fn model_for(&self, role: ModelRole) -> &str {
    match role {
      ModelRole::General => &self.model,
      ModelRole::Math => &self.math_model,
    }
  }

  fn request_body(&self, req: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
      model: self.model_for(req.role).to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: req.system.clone() },
        ChatMessageReq { role: "user".into(), content: req.user.clone() },
      ],
      temperature: req.temperature,
      response_format: req.response_schema.as_ref().map(|_| ResponseFormat { r#type: "json_object".into() }),
    }
  }
}

#[async_trait]
impl ModelClient for OpenAiClient {
  fn name(&self) -> &str {
    "openai"
  }

  #[instrument(level = "info", skip(self, req), fields(model = %self.model_for(req.role), system_len = req.system.len(), user_len = req.user.len()))]
  async fn chat(&self, req: &ChatRequest) -> Result<String, ModelError> {
    let url = format!("{}/chat/completions", self.base_url);
    let body = self.request_body(req);
    let start = Instant::now();

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "quizforge-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| ModelError::Unavailable(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      warn!(target: "quizforge", status, %message, "OpenAI HTTP error");
      return Err(ModelError::Http { status, message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| ModelError::Unavailable(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "quizforge", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first().and_then(|c| c.message.content.clone()).unwrap_or_default().trim().to_string();
    if text.is_empty() {
      return Err(ModelError::EmptyResponse);
    }
    debug!(target: "quizforge", elapsed = ?start.elapsed(), len = text.len(), preview = %trunc_for_log(&text, 200), "OpenAI response received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn client() -> OpenAiClient {
    OpenAiClient {
      client: reqwest::Client::new(),
      api_key: "sk-test".into(),
      base_url: DEFAULT_BASE_URL.into(),
      model: "small".into(),
      math_model: "mathy".into(),
    }
  }

  #[test]
  fn request_uses_role_model_and_json_mode() {
    let c = client();
    let req = ChatRequest {
      role: ModelRole::Math,
      system: "sys".into(),
      user: "usr".into(),
      temperature: 0.5,
      response_schema: Some(json!({"type": "object"})),
    };
    let v = serde_json::to_value(c.request_body(&req)).unwrap();
    assert_eq!(v["model"], "mathy");
    assert_eq!(v["messages"][0]["role"], "system");
    assert_eq!(v["messages"][1]["content"], "usr");
    assert_eq!(v["response_format"]["type"], "json_object");

    let plain = ChatRequest { role: ModelRole::General, response_schema: None, ..req };
    let v = serde_json::to_value(c.request_body(&plain)).unwrap();
    assert_eq!(v["model"], "small");
    assert!(v.get("response_format").is_none());
  }

  #[test]
  fn error_bodies_are_unwrapped() {
    assert_eq!(
      extract_openai_error(r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#).as_deref(),
      Some("Invalid API key")
    );
    assert_eq!(extract_openai_error("<html>bad gateway</html>"), None);
  }
}
