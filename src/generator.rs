//! Question generation dispatcher.
//!
//! normalize -> build prompt -> model call (bounded) -> extract JSON -> repair ->
//! clean choices -> validate -> attach metadata. Any failure along the way is
//! logged with its reason and answered from the fallback catalog, so callers
//! always get a schema-valid question.

use serde_json::Value;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use crate::arithmetic::check_answer;
use crate::domain::{Question, QuestionBody, QuestionKind, QuestionOrigin, QuestionSpec, Subject};
use crate::error::{GenerationError, ModelError, ValidationError};
use crate::model::{chat_with_timeout, ChatRequest, ModelRole};
use crate::prompts;
use crate::repair::{repair, Payload};
use crate::state::AppState;
use crate::util::{cut_embedded_choices, extract_json_text, strip_choice_marker, trunc_for_log};
use crate::validate::validate;

/// Generate one question. Never fails; the origin says whether the model or
/// which fallback rung produced it.
#[instrument(level = "info", skip(state), fields(request_id = tracing::field::Empty))]
pub async fn generate_question(
  state: &AppState,
  grade: i64,
  subject: &str,
  sub_activity: &str,
  difficulty: &str,
  question_type: &str,
) -> (Question, QuestionOrigin) {
  let request_id = Uuid::new_v4().to_string();
  Span::current().record("request_id", request_id.as_str());

  let spec = QuestionSpec::normalize(grade, subject, sub_activity, difficulty, question_type, &request_id);
  debug!(target: "question", %request_id, ?spec, "Normalized request");

  match generate_from_model(state, &spec, &request_id).await {
    Ok(question) => {
      info!(
        target: "question",
        %request_id,
        kind = %question.kind(),
        choices = question.choices().map_or(0, <[String]>::len),
        source = QuestionOrigin::Model.as_str(),
        "Question generated"
      );
      (question, QuestionOrigin::Model)
    }
    Err(e) => {
      warn!(target: "question", %request_id, reason = e.reason(), error = %e, "Generation failed; using fallback catalog");
      let (question, rung) =
        state.catalog.select(spec.grade, spec.subject, &spec.sub_activity, spec.difficulty, spec.kind);
      (question, QuestionOrigin::Fallback(rung))
    }
  }
}

async fn generate_from_model(state: &AppState, spec: &QuestionSpec, request_id: &str) -> Result<Question, GenerationError> {
  let model = state.model.as_deref().ok_or(ModelError::NotConfigured)?;

  let prompt = prompts::build(spec, &state.prompts);
  let req = ChatRequest {
    role: if spec.subject == Subject::Math { ModelRole::Math } else { ModelRole::General },
    system: prompt.system,
    user: prompt.user,
    temperature: prompt.temperature,
    response_schema: Some(prompt.schema),
  };

  let raw = chat_with_timeout(model, &req, state.model_timeout).await?;
  debug!(target: "question", %request_id, backend = model.name(), raw = %trunc_for_log(&raw, 400), "Model replied");

  let payload = parse_payload(&raw)?;
  let body = shape_payload(spec, payload)?;
  let question = Question { body, sub_activity: spec.sub_activity.clone(), subject: spec.subject, difficulty: spec.difficulty };
  if spec.subject == Subject::Math {
    check_answer(&question)?;
  }
  Ok(question)
}

/// Raw model text to a JSON object.
pub fn parse_payload(raw: &str) -> Result<Payload, GenerationError> {
  let text = extract_json_text(raw).ok_or_else(|| GenerationError::MalformedResponse("no JSON object found".into()))?;
  match serde_json::from_str::<Value>(&text) {
    Ok(Value::Object(map)) => Ok(map),
    Ok(other) => Err(GenerationError::MalformedResponse(format!("expected an object, got {}", json_kind(&other)))),
    Err(e) => Err(GenerationError::MalformedResponse(e.to_string())),
  }
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

/// Repair, clean and validate a parsed payload for the requested spec.
pub fn shape_payload(spec: &QuestionSpec, mut payload: Payload) -> Result<QuestionBody, ValidationError> {
  // The request's sub_activity wins over whatever the model echoed.
  payload.insert("sub_activity".into(), Value::String(spec.sub_activity.clone()));
  let mut payload = repair(payload);

  if spec.kind.has_choices() {
    clean_choices(&mut payload);
  }
  if spec.kind == QuestionKind::ReadingComprehension {
    payload.insert("type".into(), Value::String(QuestionKind::ReadingComprehension.as_str().into()));
  }
  validate(spec.kind, &payload)
}

fn as_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Stringify numeric choices/answers, drop "A) " markers and cut choices the
/// model inlined into the question text.
fn clean_choices(p: &mut Payload) {
  if let Some(Value::Array(items)) = p.get_mut("choices") {
    for item in items.iter_mut() {
      if let Some(text) = as_text(item) {
        *item = Value::String(strip_choice_marker(&text));
      }
    }
  }
  if let Some(answer) = p.get("answer").and_then(as_text) {
    p.insert("answer".into(), Value::String(strip_choice_marker(&answer)));
  }
  if let Some(question) = p.get("question").and_then(Value::as_str).map(cut_embedded_choices) {
    p.insert("question".into(), Value::String(question));
  }
}
