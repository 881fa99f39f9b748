//! Heuristic reshaping of near-miss model payloads into the canonical question shape.
//!
//! The repairer is an ordered list of pure rules. Each pass applies the first rule
//! whose precondition holds; passes repeat until the payload stops changing, so the
//! result is a fixpoint and repairing it again is a no-op. Nothing here fails: a
//! payload no rule recognizes is returned as-is for the validator to reject.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{QuestionKind, GRAMMAR_CORRECTION};

pub type Payload = Map<String, Value>;

/// One named rewrite. `apply` returns None when its precondition does not hold.
pub struct RepairRule {
  pub name: &'static str,
  pub apply: fn(&Payload) -> Option<Payload>,
}

/// Order matters: later rules assume earlier ones did not match.
pub const RULES: &[RepairRule] = &[
  RepairRule { name: "grammar_correction", apply: grammar_correction },
  RepairRule { name: "properties_wrapper", apply: properties_wrapper },
  RepairRule { name: "correct_answer_rename", apply: correct_answer_rename },
  RepairRule { name: "choices_mean_multiple_choice", apply: choices_mean_multiple_choice },
  RepairRule { name: "missing_choices_mean_direct_answer", apply: missing_choices_mean_direct_answer },
  RepairRule { name: "passage_means_reading", apply: passage_means_reading },
];

const MAX_PASSES: usize = RULES.len() + 1;

/// Present and not null.
fn has(p: &Payload, key: &str) -> bool {
  p.get(key).map_or(false, |v| !v.is_null())
}

fn with_type(mut p: Payload, kind: QuestionKind) -> Payload {
  p.insert("type".into(), Value::String(kind.as_str().into()));
  p
}

/// Run one pass: the first matching rule wins.
pub fn apply_once(p: &Payload) -> Option<(&'static str, Payload)> {
  RULES.iter().find_map(|r| (r.apply)(p).map(|out| (r.name, out)))
}

/// Best-effort repair. Never fails; unrecognized shapes pass through unchanged.
pub fn repair(payload: Payload) -> Payload {
  let mut current = payload;
  for _ in 0..MAX_PASSES {
    match apply_once(&current) {
      Some((rule, next)) => {
        if next == current {
          return current;
        }
        debug!(target: "question", rule, "Applied repair rule");
        current = next;
      }
      None => {
        if current.is_empty() {
          warn!(target: "question", "Empty payload; nothing to repair");
        }
        return current;
      }
    }
  }
  current
}

fn grammar_correction(p: &Payload) -> Option<Payload> {
  let is_grammar = p.get("sub_activity").and_then(Value::as_str) == Some(GRAMMAR_CORRECTION);
  if !(is_grammar && has(p, "question") && has(p, "answer")) {
    return None;
  }
  let mut out = p.clone();
  out.remove("choices");
  Some(with_type(out, QuestionKind::DirectAnswer))
}

fn bracket_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)\[(.*)\]").ok()).as_ref()
}

/// Pull `["a", "b", 'c']` out of a prose description.
fn array_from_description(desc: &str) -> Option<Vec<Value>> {
  let caps = bracket_re()?.captures(desc)?;
  let inner = caps.get(1)?.as_str();
  let items: Vec<Value> = inner
    .split(',')
    .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'' || c == ' ').to_string())
    .filter(|s| !s.is_empty())
    .map(Value::String)
    .collect();
  if items.is_empty() { None } else { Some(items) }
}

fn text_field(v: &Value, keys: &[&str]) -> Option<Value> {
  match v {
    Value::String(_) => Some(v.clone()),
    Value::Object(o) => keys.iter().find_map(|k| o.get(*k).filter(|x| x.is_string()).cloned()),
    _ => None,
  }
}

fn choices_field(v: &Value) -> Option<Value> {
  match v {
    Value::Array(_) => Some(v.clone()),
    Value::Object(o) => ["items", "enum", "examples"]
      .iter()
      .find_map(|k| o.get(*k).filter(|x| x.is_array()).cloned())
      .or_else(|| {
        o.get("description")
          .and_then(Value::as_str)
          .and_then(array_from_description)
          .map(Value::Array)
      }),
    _ => None,
  }
}

fn properties_wrapper(p: &Payload) -> Option<Payload> {
  let props = p.get("properties")?.as_object()?;
  let mut out = Payload::new();
  if let Some(q) = props.get("question").and_then(|v| text_field(v, &["description", "title"])) {
    out.insert("question".into(), q);
  }
  if let Some(c) = props.get("choices").and_then(choices_field) {
    out.insert("choices".into(), c);
  }
  if let Some(a) = props.get("answer").and_then(|v| text_field(v, &["description", "example"])) {
    out.insert("answer".into(), a);
  }
  Some(with_type(out, QuestionKind::MultipleChoice))
}

fn correct_answer_rename(p: &Payload) -> Option<Payload> {
  if !has(p, "correct_answer") || has(p, "answer") {
    return None;
  }
  let mut out = p.clone();
  if let Some(v) = out.remove("correct_answer") {
    out.insert("answer".into(), v);
  }
  if !has(&out, "type") {
    out = with_type(out, QuestionKind::MultipleChoice);
  }
  Some(out)
}

fn choices_mean_multiple_choice(p: &Payload) -> Option<Payload> {
  if has(p, "question") && has(p, "choices") && has(p, "answer") {
    Some(with_type(p.clone(), QuestionKind::MultipleChoice))
  } else {
    None
  }
}

fn missing_choices_mean_direct_answer(p: &Payload) -> Option<Payload> {
  if !(has(p, "question") && has(p, "answer")) || has(p, "choices") {
    return None;
  }
  let mut out = with_type(p.clone(), QuestionKind::DirectAnswer);
  out.remove("choices");
  let echoed = out
    .get("sub_activity")
    .and_then(Value::as_object)
    .and_then(|o| o.get("description"))
    .and_then(Value::as_str)
    .map(str::to_string);
  if let Some(desc) = echoed {
    out.insert("sub_activity".into(), Value::String(desc));
  }
  Some(out)
}

fn passage_means_reading(p: &Payload) -> Option<Payload> {
  if has(p, "passage") && has(p, "question") && has(p, "choices") && has(p, "answer") {
    Some(with_type(p.clone(), QuestionKind::ReadingComprehension))
  } else {
    None
  }
}
