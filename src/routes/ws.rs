//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::domain::EvaluationKind;
use crate::evaluator::{evaluate_grammar, evaluate_reading};
use crate::generator::generate_question;
use crate::protocol::{ClientWsMessage, QuestionQuery, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "quizforge", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "quizforge", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = reply_to_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "quizforge", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "quizforge", "WebSocket disconnected");
}

/// Parse, dispatch, serialize. Always yields exactly one JSON reply.
async fn reply_to_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "quizforge", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewQuestion { grade, subject, sub_activity, difficulty, question_type } => {
      let r = QuestionQuery { grade, subject, sub_activity, difficulty, question_type }.resolve();
      let (question, origin) =
        generate_question(state, r.grade, &r.subject, &r.sub_activity, &r.difficulty, &r.question_type).await;
      info!(target: "question", kind = %question.kind(), source = origin.as_str(), has_passage = question.passage().is_some(), "WS new_question served");
      ServerWsMessage::Question { question, source: origin.as_str().to_string() }
    }

    ClientWsMessage::Evaluate { kind, question, user_answer, correct_answer, passage, player_name } => {
      let result = match kind {
        EvaluationKind::Grammar => {
          evaluate_grammar(state, &question, &user_answer, &correct_answer, player_name.as_deref()).await
        }
        EvaluationKind::Reading => {
          evaluate_reading(state, passage.as_deref().unwrap_or_default(), &question, &user_answer, &correct_answer).await
        }
      };
      info!(target: "evaluation", kind = kind.as_str(), is_correct = result.is_correct, "WS evaluate served");
      ServerWsMessage::Evaluation { kind, is_correct: result.is_correct, feedback: result.feedback }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use serde_json::Value;

  use super::*;
  use crate::catalog::FallbackCatalog;
  use crate::config::Prompts;

  fn state() -> AppState {
    AppState::with_parts(None, FallbackCatalog::embedded(), Prompts::default(), Duration::from_secs(1))
  }

  async fn reply(txt: &str) -> Value {
    serde_json::from_str(&reply_to_text(txt, &state()).await).unwrap()
  }

  #[tokio::test]
  async fn new_question_replies_with_question_and_source() {
    let v = reply(r#"{"type": "new_question", "grade": 3, "subject": "English", "sub_activity": "Reading Comprehension", "question_type": "reading-comprehension"}"#).await;
    assert_eq!(v["type"], "question");
    assert_eq!(v["question"]["type"], "reading-comprehension");
    assert!(v["question"]["passage"].is_string());
    assert_eq!(v["source"], "fallback_exact_activity");
  }

  #[tokio::test]
  async fn evaluate_and_errors() {
    let v = reply(r#"{"type": "evaluate", "kind": "reading", "passage": "p", "question": "q", "user_answer": "Brown", "correct_answer": "brown"}"#).await;
    assert_eq!(v["type"], "evaluation");
    assert_eq!(v["is_correct"], true);

    let v = reply(r#"{"type": "ping"}"#).await;
    assert_eq!(v["type"], "pong");

    let v = reply("not json").await;
    assert_eq!(v["type"], "error");
  }
}
