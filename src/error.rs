//! Error taxonomy for model calls, payload validation and question generation.
//!
//! None of these ever reach an HTTP caller: the generator and evaluator turn every
//! failure into a fallback result and only log the error.

use std::time::Duration;

use thiserror::Error;

/// Failures of the language-model backend itself.
#[derive(Debug, Error)]
pub enum ModelError {
  #[error("model backend unavailable: {0}")]
  Unavailable(String),

  #[error("model call timed out after {0:?}")]
  Timeout(Duration),

  #[error("model HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("model returned an empty response")]
  EmptyResponse,

  #[error("no model backend configured")]
  NotConfigured,
}

/// Shape violations found while mapping a repaired payload onto a question variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("missing, empty or non-string field '{0}'")]
  MissingField(&'static str),

  #[error("answer '{answer}' is not one of the choices")]
  AnswerNotInChoices { answer: String },

  #[error("field '{0}' is not allowed for this question type")]
  UnexpectedField(&'static str),

  #[error("expected 2 to 4 choices, got {0}")]
  ChoiceCount(usize),

  #[error("choices contain duplicates")]
  DuplicateChoices,

  #[error("answer '{answer}' does not match the expression's value {expected}")]
  ArithmeticMismatch { expected: String, answer: String },
}

/// Anything that makes a single generation attempt unusable.
#[derive(Debug, Error)]
pub enum GenerationError {
  #[error(transparent)]
  Upstream(#[from] ModelError),

  #[error("malformed model response: {0}")]
  MalformedResponse(String),

  #[error(transparent)]
  Validation(#[from] ValidationError),
}

impl GenerationError {
  /// Short machine-friendly label used as a log field.
  pub fn reason(&self) -> &'static str {
    match self {
      GenerationError::Upstream(ModelError::Timeout(_)) => "timeout",
      GenerationError::Upstream(ModelError::NotConfigured) => "not_configured",
      GenerationError::Upstream(_) => "upstream",
      GenerationError::MalformedResponse(_) => "malformed",
      GenerationError::Validation(_) => "validation",
    }
  }
}
