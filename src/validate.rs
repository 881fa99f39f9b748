//! Schema validation: the one place that maps an observed payload shape onto a
//! `QuestionBody` variant. The requested question type decides which variant is
//! expected; the payload's own `type` field is not trusted.

use std::collections::HashSet;

use serde_json::Value;

use crate::domain::{QuestionBody, QuestionKind};
use crate::error::ValidationError;
use crate::repair::Payload;

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 4;

fn required_text(p: &Payload, key: &'static str) -> Result<String, ValidationError> {
  match p.get(key) {
    Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
    _ => Err(ValidationError::MissingField(key)),
  }
}

fn required_choices(p: &Payload) -> Result<Vec<String>, ValidationError> {
  let arr = match p.get("choices") {
    Some(Value::Array(a)) => a,
    _ => return Err(ValidationError::MissingField("choices")),
  };
  let mut out = Vec::with_capacity(arr.len());
  for v in arr {
    match v {
      Value::String(s) if !s.trim().is_empty() => out.push(s.clone()),
      _ => return Err(ValidationError::MissingField("choices")),
    }
  }
  if !(MIN_CHOICES..=MAX_CHOICES).contains(&out.len()) {
    return Err(ValidationError::ChoiceCount(out.len()));
  }
  let unique: HashSet<&str> = out.iter().map(String::as_str).collect();
  if unique.len() != out.len() {
    return Err(ValidationError::DuplicateChoices);
  }
  Ok(out)
}

fn answer_in_choices(answer: &str, choices: &[String]) -> Result<(), ValidationError> {
  if choices.iter().any(|c| c == answer) {
    Ok(())
  } else {
    Err(ValidationError::AnswerNotInChoices { answer: answer.to_string() })
  }
}

/// Validate a repaired payload against the requested question type.
pub fn validate(kind: QuestionKind, p: &Payload) -> Result<QuestionBody, ValidationError> {
  match kind {
    QuestionKind::MultipleChoice => {
      let question = required_text(p, "question")?;
      let choices = required_choices(p)?;
      let answer = required_text(p, "answer")?;
      answer_in_choices(&answer, &choices)?;
      Ok(QuestionBody::MultipleChoice { question, choices, answer })
    }
    QuestionKind::DirectAnswer => {
      if p.get("choices").map_or(false, |v| !v.is_null()) {
        return Err(ValidationError::UnexpectedField("choices"));
      }
      let question = required_text(p, "question")?;
      let answer = required_text(p, "answer")?;
      Ok(QuestionBody::DirectAnswer { question, answer })
    }
    QuestionKind::ReadingComprehension => {
      let passage = required_text(p, "passage")?;
      let question = required_text(p, "question")?;
      let choices = required_choices(p)?;
      let answer = required_text(p, "answer")?;
      answer_in_choices(&answer, &choices)?;
      Ok(QuestionBody::ReadingComprehension { passage, question, choices, answer })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn obj(v: Value) -> Payload {
    v.as_object().cloned().unwrap_or_default()
  }

  #[test]
  fn accepts_well_formed_variants() {
    let mc = validate(QuestionKind::MultipleChoice, &obj(json!({"question": "2+2?", "choices": ["3", "4", "5"], "answer": "4"}))).unwrap();
    assert_eq!(mc.kind(), QuestionKind::MultipleChoice);

    let da = validate(QuestionKind::DirectAnswer, &obj(json!({"question": "q", "answer": "a", "type": "multiple-choice"}))).unwrap();
    assert_eq!(da, QuestionBody::DirectAnswer { question: "q".into(), answer: "a".into() });

    let rc = validate(
      QuestionKind::ReadingComprehension,
      &obj(json!({"passage": "p", "question": "q", "choices": ["a", "b"], "answer": "b", "type": "multiple-choice"})),
    )
    .unwrap();
    assert_eq!(rc.kind(), QuestionKind::ReadingComprehension);
  }

  #[test]
  fn answer_must_match_a_choice_exactly() {
    let err = validate(QuestionKind::MultipleChoice, &obj(json!({"question": "q", "choices": ["Four", "Five"], "answer": "four"}))).unwrap_err();
    assert_eq!(err, ValidationError::AnswerNotInChoices { answer: "four".into() });
  }

  #[test]
  fn choice_cardinality_and_uniqueness() {
    let one = obj(json!({"question": "q", "choices": ["a"], "answer": "a"}));
    assert_eq!(validate(QuestionKind::MultipleChoice, &one).unwrap_err(), ValidationError::ChoiceCount(1));
    let five = obj(json!({"question": "q", "choices": ["a", "b", "c", "d", "e"], "answer": "a"}));
    assert_eq!(validate(QuestionKind::MultipleChoice, &five).unwrap_err(), ValidationError::ChoiceCount(5));
    let dup = obj(json!({"question": "q", "choices": ["a", "a", "b"], "answer": "a"}));
    assert_eq!(validate(QuestionKind::MultipleChoice, &dup).unwrap_err(), ValidationError::DuplicateChoices);
    let numeric = obj(json!({"question": "q", "choices": [3, 4], "answer": "4"}));
    assert_eq!(validate(QuestionKind::MultipleChoice, &numeric).unwrap_err(), ValidationError::MissingField("choices"));
  }

  #[test]
  fn direct_answer_rejects_choices() {
    let p = obj(json!({"question": "q", "answer": "a", "choices": ["a", "b"]}));
    assert_eq!(validate(QuestionKind::DirectAnswer, &p).unwrap_err(), ValidationError::UnexpectedField("choices"));
  }

  #[test]
  fn missing_fields_are_named() {
    assert_eq!(
      validate(QuestionKind::ReadingComprehension, &obj(json!({"question": "q", "choices": ["a", "b"], "answer": "a"}))).unwrap_err(),
      ValidationError::MissingField("passage")
    );
    assert_eq!(
      validate(QuestionKind::DirectAnswer, &obj(json!({"question": "  ", "answer": "a"}))).unwrap_err(),
      ValidationError::MissingField("question")
    );
  }
}
