//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::evaluator::{evaluate_grammar, evaluate_reading};
use crate::generator::generate_question;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionParams>,
) -> impl IntoResponse {
  let r = QuestionQuery::from(q).resolve();
  let (question, origin) =
    generate_question(&state, r.grade, &r.subject, &r.sub_activity, &r.difficulty, &r.question_type).await;
  info!(target: "question", kind = %question.kind(), source = origin.as_str(), "HTTP question served");
  Json(question)
}

#[instrument(level = "info", skip(state, body), fields(answer_len = body.user_answer.len()))]
pub async fn http_post_evaluate_grammar(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GrammarEvalIn>,
) -> impl IntoResponse {
  let result = evaluate_grammar(
    &state,
    &body.question,
    &body.user_answer,
    &body.correct_answer,
    body.player_name.as_deref(),
  )
  .await;
  info!(target: "evaluation", is_correct = result.is_correct, "HTTP grammar evaluation served");
  Json(result)
}

#[instrument(level = "info", skip(state, body), fields(answer_len = body.user_answer.len()))]
pub async fn http_post_evaluate_reading(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReadingEvalIn>,
) -> impl IntoResponse {
  let result = evaluate_reading(&state, &body.passage, &body.question, &body.user_answer, &body.correct_answer).await;
  info!(target: "evaluation", is_correct = result.is_correct, "HTTP reading evaluation served");
  Json(result)
}
