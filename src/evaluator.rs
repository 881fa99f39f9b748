//! Free-text answer grading (grammar corrections, reading comprehension).
//!
//! The model is asked for `{is_correct, feedback}`. Anything short of a usable
//! verdict (no backend, timeout, bad JSON, missing or empty fields) drops to a
//! local string comparison, so grading never fails.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::{EvaluationKind, EvaluationResult};
use crate::error::{GenerationError, ModelError};
use crate::model::{chat_with_timeout, ChatRequest, ModelRole};
use crate::prompts::{self, Prompt};
use crate::state::AppState;
use crate::util::{extract_json_text, fill_template, normalize_answer, strip_think_tags, trunc_for_log};

pub const DEFAULT_PLAYER_NAME: &str = "student";

const GRAMMAR_CORRECT_FEEDBACK: &[&str] = &[
  "Nice fix, {name}! You found the grammar mistake and corrected it.",
  "Well done, {name}! That sentence reads much better now.",
  "{name}, you have a sharp eye for grammar. Your correction is spot on.",
  "That's it, {name}! The words fit together correctly now.",
  "Great correction, {name}! You spotted exactly what was wrong.",
];

const GRAMMAR_INCORRECT_FEEDBACK: &[&str] = &[
  "Good try, {name}. Read the sentence again and look for the word that doesn't fit.",
  "{name}, you're close! Check whether the subject and the verb agree.",
  "Almost, {name}. Say the sentence out loud and listen for what sounds off.",
  "Not quite yet, {name}. Look at how each word works with the others.",
  "Keep going, {name}! Think about whether the verb is in the right tense.",
];

const READING_CORRECT_FEEDBACK: &str =
  "Great job! Your answer shows you understood the passage and found the key detail.";
const READING_INCORRECT_FEEDBACK: &str =
  "Good effort! Look back at the passage and find the sentence that answers the question.";

/// Grade a grammar correction. `player_name` defaults to "student" when empty.
#[instrument(level = "info", skip(state, question, user_answer, correct_answer), fields(answer_len = user_answer.len()))]
pub async fn evaluate_grammar(
  state: &AppState,
  question: &str,
  user_answer: &str,
  correct_answer: &str,
  player_name: Option<&str>,
) -> EvaluationResult {
  let name = match player_name.map(str::trim) {
    Some(n) if !n.is_empty() => n,
    _ => DEFAULT_PLAYER_NAME,
  };
  let prompt = prompts::grammar_evaluation(&state.prompts, question, user_answer, correct_answer, name);
  match evaluate_with_model(state, &prompt, EvaluationKind::Grammar).await {
    Ok(result) => result,
    Err(e) => {
      warn!(target: "evaluation", kind = "grammar", reason = e.reason(), error = %e, "Model evaluation failed; using local comparison");
      grammar_fallback(&mut rand::thread_rng(), user_answer, correct_answer, name)
    }
  }
}

/// Grade a reading-comprehension answer against the passage.
#[instrument(level = "info", skip(state, passage, question, user_answer, correct_answer), fields(passage_len = passage.len(), answer_len = user_answer.len()))]
pub async fn evaluate_reading(
  state: &AppState,
  passage: &str,
  question: &str,
  user_answer: &str,
  correct_answer: &str,
) -> EvaluationResult {
  let prompt = prompts::reading_evaluation(&state.prompts, passage, question, user_answer, correct_answer);
  match evaluate_with_model(state, &prompt, EvaluationKind::Reading).await {
    Ok(result) => result,
    Err(e) => {
      warn!(target: "evaluation", kind = "reading", reason = e.reason(), error = %e, "Model evaluation failed; using local comparison");
      reading_fallback(user_answer, correct_answer)
    }
  }
}

async fn evaluate_with_model(state: &AppState, prompt: &Prompt, kind: EvaluationKind) -> Result<EvaluationResult, GenerationError> {
  let model = state.model.as_deref().ok_or(ModelError::NotConfigured)?;
  let req = ChatRequest {
    role: ModelRole::General,
    system: prompt.system.clone(),
    user: prompt.user.clone(),
    temperature: prompt.temperature,
    response_schema: Some(prompt.schema.clone()),
  };
  let raw = chat_with_timeout(model, &req, state.model_timeout).await?;
  debug!(target: "evaluation", kind = kind.as_str(), raw = %trunc_for_log(&raw, 300), "Model verdict received");
  let result = parse_verdict(&raw)?;
  info!(target: "evaluation", kind = kind.as_str(), is_correct = result.is_correct, source = "model", "Answer evaluated");
  Ok(result)
}

/// Accepts a JSON bool or the strings "true"/"false" (any case).
fn coerce_bool(v: &Value) -> Option<bool> {
  match v {
    Value::Bool(b) => Some(*b),
    Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
      "true" => Some(true),
      "false" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

/// Parse the model's `{is_correct, feedback}` reply.
pub fn parse_verdict(raw: &str) -> Result<EvaluationResult, GenerationError> {
  let malformed = |msg: &str| GenerationError::MalformedResponse(msg.to_string());
  let text = extract_json_text(raw).ok_or_else(|| malformed("no JSON object found"))?;
  let value: Value = serde_json::from_str(&text).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
  let is_correct = value.get("is_correct").and_then(coerce_bool).ok_or_else(|| malformed("missing or non-boolean is_correct"))?;
  let feedback = value
    .get("feedback")
    .and_then(Value::as_str)
    .map(strip_think_tags)
    .filter(|f| !f.trim().is_empty())
    .ok_or_else(|| malformed("missing or empty feedback"))?;
  Ok(EvaluationResult { is_correct, feedback })
}

/// Case- and whitespace-insensitive equality; feedback drawn from a varied pool.
pub fn grammar_fallback<R: Rng + ?Sized>(rng: &mut R, user_answer: &str, correct_answer: &str, player_name: &str) -> EvaluationResult {
  let user = normalize_answer(user_answer);
  let is_correct = !user.is_empty() && user == normalize_answer(correct_answer);
  let pool = if is_correct { GRAMMAR_CORRECT_FEEDBACK } else { GRAMMAR_INCORRECT_FEEDBACK };
  let template = pool.choose(rng).copied().unwrap_or("Thanks for your answer, {name}!");
  let feedback = fill_template(template, &[("name", player_name)]);
  info!(target: "evaluation", kind = "grammar", is_correct, source = "fallback", "Answer evaluated");
  EvaluationResult { is_correct, feedback }
}

/// Equality or containment in either direction. An empty answer is never correct.
pub fn reading_fallback(user_answer: &str, correct_answer: &str) -> EvaluationResult {
  let user = normalize_answer(user_answer);
  let correct = normalize_answer(correct_answer);
  let is_correct = !user.is_empty() && (user == correct || correct.contains(&user) || user.contains(&correct));
  let feedback = if is_correct { READING_CORRECT_FEEDBACK } else { READING_INCORRECT_FEEDBACK };
  info!(target: "evaluation", kind = "reading", is_correct, source = "fallback", "Answer evaluated");
  EvaluationResult { is_correct, feedback: feedback.to_string() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::time::Duration;

  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use super::*;
  use crate::catalog::FallbackCatalog;
  use crate::config::Prompts;
  use crate::model::testing::ScriptedModel;
  use crate::model::ModelClient;

  fn state(model: Option<Arc<dyn ModelClient>>) -> AppState {
    AppState::with_parts(model, FallbackCatalog::default(), Prompts::default(), Duration::from_millis(200))
  }

  #[test]
  fn verdict_accepts_bool_and_string_forms() {
    let r = parse_verdict(r#"{"is_correct": "TRUE", "feedback": "Nice!"}"#).unwrap();
    assert!(r.is_correct);
    let r = parse_verdict(r#"{"is_correct": false, "feedback": "<think>hmm</think>Try again."}"#).unwrap();
    assert!(!r.is_correct);
    assert_eq!(r.feedback, "Try again.");
  }

  #[test]
  fn verdict_rejects_missing_or_empty_fields() {
    assert!(parse_verdict(r#"{"feedback": "Nice!"}"#).is_err());
    assert!(parse_verdict(r#"{"is_correct": "yes", "feedback": "Nice!"}"#).is_err());
    assert!(parse_verdict(r#"{"is_correct": true, "feedback": "   "}"#).is_err());
    assert!(parse_verdict(r#"{"is_correct": true}"#).is_err());
    assert!(parse_verdict("sure").is_err());
  }

  #[test]
  fn fallback_asymmetry() {
    let mut rng = StdRng::seed_from_u64(5);
    // Equal (modulo case/space): both kinds accept.
    assert!(grammar_fallback(&mut rng, "  the boy PLAYS  ", "The boy plays", "Ana").is_correct);
    assert!(reading_fallback("brown", "Brown").is_correct);
    // Strict substring: only reading accepts.
    assert!(!grammar_fallback(&mut rng, "plays", "The boy plays", "Ana").is_correct);
    assert!(reading_fallback("brown", "The dog is brown").is_correct);
    assert!(reading_fallback("It was a brown dog", "brown").is_correct);
    assert!(!reading_fallback("black", "brown").is_correct);
    assert!(!reading_fallback("   ", "brown").is_correct);
  }

  #[test]
  fn grammar_fallback_addresses_the_player() {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..20 {
      let r = grammar_fallback(&mut rng, "x", "y", "Kenji");
      assert!(r.feedback.contains("Kenji"));
      assert!(!r.feedback.contains("{name}"));
    }
  }

  #[tokio::test]
  async fn model_verdict_is_used_when_valid() {
    let model = Arc::new(ScriptedModel::replying(r#"{"is_correct": "true", "feedback": "Great work, Leo!"}"#));
    let st = state(Some(model.clone() as Arc<dyn ModelClient>));
    let r = evaluate_grammar(&st, "He go home.", "He goes home", "He goes home.", Some("Leo")).await;
    assert_eq!(r, EvaluationResult { is_correct: true, feedback: "Great work, Leo!".into() });
    let calls = model.calls.lock().unwrap();
    assert!(calls[0].user.contains("Leo"));
    assert!(calls[0].response_schema.is_some());
  }

  #[tokio::test]
  async fn unusable_model_drops_to_fallback() {
    for model in [ScriptedModel::failing(), ScriptedModel::hanging(), ScriptedModel::replying(r#"{"is_correct": true, "feedback": ""}"#)] {
      let st = state(Some(Arc::new(model)));
      let r = evaluate_reading(&st, "Sara has a brown dog.", "What color is the dog?", "brown", "Brown").await;
      assert!(r.is_correct);
      assert_eq!(r.feedback, READING_CORRECT_FEEDBACK);
    }
    let r = evaluate_grammar(&state(None), "q", "wrong", "right", None).await;
    assert!(!r.is_correct);
    assert!(r.feedback.contains(DEFAULT_PLAYER_NAME));
  }
}
