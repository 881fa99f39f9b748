//! Local arithmetic check for Math questions.
//!
//! When a question states a single bare expression ("What is 6 x 7?") and the
//! marked answer is a plain number, the expression is evaluated with `evalexpr`
//! and the answer must agree. Word problems, fill-in-the-blank equations and
//! non-numeric answers ("9 r 2", "40 cm²") are left alone.

use std::sync::OnceLock;

use evalexpr::Value;
use regex::Regex;
use tracing::debug;

use crate::domain::Question;
use crate::error::ValidationError;

/// Answers are accepted within this distance of the evaluated value.
const TOLERANCE: f64 = 0.005;

const NUMBER: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)";

fn expression_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| {
    let pattern = format!(r"\(?\s*{NUMBER}(?:\s*\)?\s*[-+*/x×÷]\s*\(?\s*{NUMBER})+(?:\s*\))*");
    Regex::new(&pattern).ok()
  })
  .as_ref()
}

fn number_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(NUMBER).ok()).as_ref()
}

/// The value of the one arithmetic expression in `question`, if there is exactly one.
pub fn expected_value(question: &str) -> Option<f64> {
  // "5 + __ = 9" and "3 + 4 = ?" ask for something other than the bare value.
  if question.contains(['=', '_', '□']) {
    return None;
  }
  let re = expression_re()?;
  let mut found = re.find_iter(question);
  let expr = found.next()?.as_str().trim();
  if found.next().is_some() {
    return None;
  }
  evaluate(expr)
}

fn evaluate(expr: &str) -> Option<f64> {
  let normalized = expr.replace(['x', '×'], "*").replace('÷', "/");
  // Float literals so "7 / 2" is 3.5, not 3.
  let floats = number_re()?.replace_all(&normalized, |caps: &regex::Captures| {
    let n = caps[0].replace(',', "");
    if n.contains('.') { n } else { format!("{n}.0") }
  });
  let value = match evalexpr::eval(&floats) {
    Ok(Value::Float(f)) => f,
    Ok(Value::Int(i)) => i as f64,
    Ok(_) | Err(_) => return None,
  };
  value.is_finite().then_some(value)
}

/// Parse "42", "1,200", "-17", "3.5". Anything else is not a plain number.
fn parse_number(answer: &str) -> Option<f64> {
  answer.trim().replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_value(v: f64) -> String {
  if v.fract().abs() < 1e-9 {
    format!("{}", v.round() as i64)
  } else {
    let s = format!("{v:.4}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
  }
}

/// Reject a question whose numeric answer disagrees with its own expression.
pub fn check_answer(question: &Question) -> Result<(), ValidationError> {
  let Some(expected) = expected_value(question.question_text()) else {
    return Ok(());
  };
  let Some(answer) = parse_number(question.answer()) else {
    return Ok(());
  };
  if (answer - expected).abs() <= TOLERANCE {
    return Ok(());
  }
  let expected = format_value(expected);
  debug!(target: "question", %expected, answer = question.answer(), "Marked answer disagrees with the expression");
  Err(ValidationError::ArithmeticMismatch { expected, answer: question.answer().to_string() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::FallbackCatalog;
  use crate::domain::{Difficulty, QuestionBody, Subject};

  fn mc(question: &str, choices: &[&str], answer: &str) -> Question {
    Question {
      body: QuestionBody::MultipleChoice {
        question: question.into(),
        choices: choices.iter().map(|c| c.to_string()).collect(),
        answer: answer.into(),
      },
      sub_activity: "Addition/Subtraction".into(),
      subject: Subject::Math,
      difficulty: Difficulty::Easy,
    }
  }

  #[test]
  fn evaluates_single_expressions() {
    assert_eq!(expected_value("What is 6 x 7?"), Some(42.0));
    assert_eq!(expected_value("2+2?"), Some(4.0));
    assert_eq!(expected_value("What is 84 ÷ 7? 🍪"), Some(12.0));
    assert_eq!(expected_value("What is 7 / 2?"), Some(3.5));
    assert_eq!(expected_value("What is 1,000 + 250?"), Some(1250.0));
    assert_eq!(expected_value("What is (3 + 4) × 2?"), Some(14.0));
    assert_eq!(expected_value("What is 45 - 62?"), Some(-17.0));
  }

  #[test]
  fn skips_what_it_cannot_judge() {
    assert_eq!(expected_value("Ava has 4 balloons. She gets 1 more. How many now?"), None);
    assert_eq!(expected_value("5 + __ = 9. What goes in the blank?"), None);
    assert_eq!(expected_value("Which is bigger, 3 + 4 or 2 × 5?"), None);
    assert_eq!(expected_value("What is 5 ÷ 0?"), None);
  }

  #[test]
  fn wrong_marked_answer_is_rejected() {
    let q = mc("What is 8 + 7?", &["14", "15", "16"], "14");
    assert_eq!(
      check_answer(&q),
      Err(ValidationError::ArithmeticMismatch { expected: "15".into(), answer: "14".into() })
    );
    assert!(check_answer(&mc("What is 8 + 7?", &["14", "15", "16"], "15")).is_ok());
    assert!(check_answer(&mc("What is 47 ÷ 5?", &["9 r 2", "9 r 3"], "9 r 2")).is_ok());
  }

  #[test]
  fn embedded_math_questions_pass() {
    let catalog = FallbackCatalog::embedded();
    for q in catalog.questions().filter(|q| q.subject == Subject::Math) {
      assert!(check_answer(q).is_ok(), "{}", q.question_text());
    }
  }
}
