//! Domain models: subjects, difficulties, question variants, request specs and evaluation results.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sub-activity that is always served as a direct-answer question.
pub const GRAMMAR_CORRECTION: &str = "Grammar Correction";

pub const MIN_GRADE: u8 = 1;
pub const MAX_GRADE: u8 = 5;
pub const DEFAULT_GRADE: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
  Math,
  English,
}

impl Subject {
  pub const ALL: [Subject; 2] = [Subject::Math, Subject::English];

  pub fn as_str(&self) -> &'static str {
    match self {
      Subject::Math => "Math",
      Subject::English => "English",
    }
  }

  /// Case-insensitive parse ("math", "MATH", " Math ").
  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s))
  }

  /// Sub-activity used when the caller sends an empty one.
  pub fn default_sub_activity(&self) -> &'static str {
    match self {
      Subject::Math => "Addition/Subtraction",
      Subject::English => "Reading Comprehension",
    }
  }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s))
  }

  pub fn lower(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Question type requested by the caller and carried as the `type` tag of a `Question`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
  MultipleChoice,
  DirectAnswer,
  ReadingComprehension,
}

impl QuestionKind {
  pub const ALL: [QuestionKind; 3] = [
    QuestionKind::MultipleChoice,
    QuestionKind::DirectAnswer,
    QuestionKind::ReadingComprehension,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionKind::MultipleChoice => "multiple-choice",
      QuestionKind::DirectAnswer => "direct-answer",
      QuestionKind::ReadingComprehension => "reading-comprehension",
    }
  }

  /// Accepts "multiple_choice" as well as "multiple-choice".
  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim().replace('_', "-");
    Self::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(&s))
  }

  pub fn has_choices(&self) -> bool {
    !matches!(self, QuestionKind::DirectAnswer)
  }
}

impl fmt::Display for QuestionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Normalized generation request. Built only through `QuestionSpec::normalize`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionSpec {
  pub grade: u8,
  pub subject: Subject,
  pub sub_activity: String,
  pub difficulty: Difficulty,
  pub kind: QuestionKind,
}

impl QuestionSpec {
  /// Normalize raw caller parameters. Out-of-set values are replaced by defaults
  /// (grade clamped to 1..=5, subject Math, difficulty Easy, type multiple-choice);
  /// every substitution is logged and never reported back to the caller.
  pub fn normalize(
    grade: i64,
    subject: &str,
    sub_activity: &str,
    difficulty: &str,
    question_type: &str,
    request_id: &str,
  ) -> Self {
    let clamped = grade.clamp(MIN_GRADE as i64, MAX_GRADE as i64) as u8;
    if clamped as i64 != grade {
      warn!(target: "question", %request_id, grade, substituted = clamped, "Invalid grade; using nearest valid grade");
    }

    let subject_norm = Subject::parse(subject).unwrap_or_else(|| {
      warn!(target: "question", %request_id, %subject, "Invalid subject; defaulting to Math");
      Subject::Math
    });

    let difficulty_norm = Difficulty::parse(difficulty).unwrap_or_else(|| {
      warn!(target: "question", %request_id, %difficulty, "Invalid difficulty; defaulting to Easy");
      Difficulty::Easy
    });

    let sub_activity_norm = match sub_activity.trim() {
      "" => {
        let d = subject_norm.default_sub_activity();
        warn!(target: "question", %request_id, substituted = d, "Empty sub_activity; using subject default");
        d.to_string()
      }
      s => s.to_string(),
    };

    let mut kind = QuestionKind::parse(question_type).unwrap_or_else(|| {
      warn!(target: "question", %request_id, %question_type, "Unrecognized question type; defaulting to multiple-choice");
      QuestionKind::MultipleChoice
    });

    if sub_activity_norm == GRAMMAR_CORRECTION && kind != QuestionKind::DirectAnswer {
      tracing::info!(target: "question", %request_id, requested = %kind, "Grammar Correction forces direct-answer");
      kind = QuestionKind::DirectAnswer;
    }

    Self { grade: clamped, subject: subject_norm, sub_activity: sub_activity_norm, difficulty: difficulty_norm, kind }
  }

  pub fn is_grammar_correction(&self) -> bool {
    self.sub_activity == GRAMMAR_CORRECTION
  }
}

/// Variant payload of a question; serialized with a `type` discriminant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionBody {
  MultipleChoice {
    question: String,
    choices: Vec<String>,
    answer: String,
  },
  DirectAnswer {
    question: String,
    answer: String,
  },
  ReadingComprehension {
    passage: String,
    question: String,
    choices: Vec<String>,
    answer: String,
  },
}

impl QuestionBody {
  pub fn kind(&self) -> QuestionKind {
    match self {
      QuestionBody::MultipleChoice { .. } => QuestionKind::MultipleChoice,
      QuestionBody::DirectAnswer { .. } => QuestionKind::DirectAnswer,
      QuestionBody::ReadingComprehension { .. } => QuestionKind::ReadingComprehension,
    }
  }
}

/// Question handed to callers. Immutable once returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  #[serde(flatten)]
  pub body: QuestionBody,
  pub sub_activity: String,
  pub subject: Subject,
  pub difficulty: Difficulty,
}

impl Question {
  pub fn kind(&self) -> QuestionKind {
    self.body.kind()
  }

  pub fn question_text(&self) -> &str {
    match &self.body {
      QuestionBody::MultipleChoice { question, .. }
      | QuestionBody::DirectAnswer { question, .. }
      | QuestionBody::ReadingComprehension { question, .. } => question,
    }
  }

  pub fn answer(&self) -> &str {
    match &self.body {
      QuestionBody::MultipleChoice { answer, .. }
      | QuestionBody::DirectAnswer { answer, .. }
      | QuestionBody::ReadingComprehension { answer, .. } => answer,
    }
  }

  pub fn choices(&self) -> Option<&[String]> {
    match &self.body {
      QuestionBody::MultipleChoice { choices, .. } | QuestionBody::ReadingComprehension { choices, .. } => {
        Some(choices)
      }
      QuestionBody::DirectAnswer { .. } => None,
    }
  }

  pub fn passage(&self) -> Option<&str> {
    match &self.body {
      QuestionBody::ReadingComprehension { passage, .. } => Some(passage),
      _ => None,
    }
  }
}

/// Which degrade rung of the fallback ladder served a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackRung {
  ExactActivity,
  SameBucket,
  DefaultBucket,
  Absolute,
}

impl FallbackRung {
  pub fn as_str(&self) -> &'static str {
    match self {
      FallbackRung::ExactActivity => "fallback_exact_activity",
      FallbackRung::SameBucket => "fallback_same_bucket",
      FallbackRung::DefaultBucket => "fallback_default_bucket",
      FallbackRung::Absolute => "fallback_absolute",
    }
  }
}

/// Where a served question came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionOrigin {
  Model,
  Fallback(FallbackRung),
}

impl QuestionOrigin {
  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionOrigin::Model => "model_generated",
      QuestionOrigin::Fallback(rung) => rung.as_str(),
    }
  }
}

/// Free-text answer kinds the evaluator grades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
  Grammar,
  Reading,
}

impl EvaluationKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      EvaluationKind::Grammar => "grammar",
      EvaluationKind::Reading => "reading",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
  pub is_correct: bool,
  pub feedback: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_fixes_case_and_defaults() {
    let spec = QuestionSpec::normalize(2, "math", "Addition/Subtraction", "easy", "multiple-choice", "t");
    assert_eq!(spec.subject, Subject::Math);
    assert_eq!(spec.difficulty, Difficulty::Easy);
    assert_eq!(spec.kind, QuestionKind::MultipleChoice);

    let spec = QuestionSpec::normalize(42, "history", "Dates", "extreme", "essay", "t");
    assert_eq!(spec.grade, 5);
    assert_eq!(spec.subject, Subject::Math);
    assert_eq!(spec.difficulty, Difficulty::Easy);
    assert_eq!(spec.kind, QuestionKind::MultipleChoice);

    let spec = QuestionSpec::normalize(-3, "ENGLISH", "  ", "HARD", "reading_comprehension", "t");
    assert_eq!(spec.grade, 1);
    assert_eq!(spec.subject, Subject::English);
    assert_eq!(spec.sub_activity, "Reading Comprehension");
    assert_eq!(spec.kind, QuestionKind::ReadingComprehension);
  }

  #[test]
  fn parse_is_lenient_about_case_space_and_separators() {
    assert_eq!(Subject::parse(" eNGLISH "), Some(Subject::English));
    assert_eq!(Difficulty::parse("MEDIUM"), Some(Difficulty::Medium));
    assert_eq!(QuestionKind::parse("Direct_Answer"), Some(QuestionKind::DirectAnswer));
    assert_eq!(QuestionKind::parse("essay"), None);
  }

  #[test]
  fn grammar_correction_forces_direct_answer() {
    for t in ["multiple-choice", "reading-comprehension", "nonsense", "direct-answer"] {
      let spec = QuestionSpec::normalize(3, "English", GRAMMAR_CORRECTION, "Medium", t, "t");
      assert_eq!(spec.kind, QuestionKind::DirectAnswer, "type {t}");
    }
  }

  #[test]
  fn question_serializes_with_type_tag_and_metadata() {
    let q = Question {
      body: QuestionBody::DirectAnswer { question: "She go school.".into(), answer: "She goes to school.".into() },
      sub_activity: GRAMMAR_CORRECTION.into(),
      subject: Subject::English,
      difficulty: Difficulty::Easy,
    };
    let v = serde_json::to_value(&q).unwrap();
    assert_eq!(v["type"], "direct-answer");
    assert_eq!(v["subject"], "English");
    assert_eq!(v["difficulty"], "Easy");
    assert_eq!(v["sub_activity"], GRAMMAR_CORRECTION);
    assert!(v.get("choices").is_none());

    let back: Question = serde_json::from_value(v).unwrap();
    assert_eq!(back, q);
  }
}
