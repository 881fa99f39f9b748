//! Static fallback questions and the degrade ladder that picks one.
//!
//! The catalog is built once at startup from the embedded TOML (plus any extra
//! `[[fallback]]` entries from the config file) and is read-only afterwards.
//! Every entry goes through the same validator as model output, so a served
//! fallback question is always schema-valid.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::{Difficulty, FallbackRung, Question, QuestionBody, QuestionKind, Subject, DEFAULT_GRADE, MAX_GRADE, MIN_GRADE};
use crate::repair::Payload;
use crate::arithmetic::check_answer;
use crate::validate::validate;

const EMBEDDED_CATALOG: &str = include_str!("../data/fallback_catalog.toml");

type BucketKey = (u8, Subject, Difficulty);

const DEFAULT_BUCKET: BucketKey = (DEFAULT_GRADE, Subject::Math, Difficulty::Easy);

/// One catalog entry as written in TOML. Subject, difficulty and type are kept
/// as strings here and checked when the catalog is built.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogEntry {
  pub grade: u8,
  pub subject: String,
  pub difficulty: String,
  pub sub_activity: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub question: String,
  #[serde(default)]
  pub choices: Option<Vec<String>>,
  pub answer: String,
  #[serde(default)]
  pub passage: Option<String>,
}

#[derive(Deserialize)]
struct CatalogFile {
  #[serde(default)]
  question: Vec<CatalogEntry>,
}

pub fn parse_entries(s: &str) -> Result<Vec<CatalogEntry>, toml::de::Error> {
  toml::from_str::<CatalogFile>(s).map(|f| f.question)
}

impl CatalogEntry {
  fn to_payload(&self) -> Payload {
    let mut p = Payload::new();
    p.insert("type".into(), Value::String(self.kind.clone()));
    p.insert("question".into(), Value::String(self.question.clone()));
    p.insert("answer".into(), Value::String(self.answer.clone()));
    if let Some(choices) = &self.choices {
      p.insert("choices".into(), Value::Array(choices.iter().cloned().map(Value::String).collect()));
    }
    if let Some(passage) = &self.passage {
      p.insert("passage".into(), Value::String(passage.clone()));
    }
    p
  }

  /// Checked conversion into a bucket key and question. None (with a warning) if invalid.
  fn to_question(&self) -> Option<(BucketKey, Question)> {
    let subject = Subject::parse(&self.subject);
    let difficulty = Difficulty::parse(&self.difficulty);
    let kind = QuestionKind::parse(&self.kind);
    let (Some(subject), Some(difficulty), Some(kind)) = (subject, difficulty, kind) else {
      warn!(target: "question", question = %self.question, "Skipping catalog entry with unknown subject/difficulty/type");
      return None;
    };
    if !(MIN_GRADE..=MAX_GRADE).contains(&self.grade) {
      warn!(target: "question", grade = self.grade, question = %self.question, "Skipping catalog entry with out-of-range grade");
      return None;
    }
    let checked = validate(kind, &self.to_payload()).and_then(|body| {
      let q = Question { body, sub_activity: self.sub_activity.clone(), subject, difficulty };
      if subject == Subject::Math {
        check_answer(&q)?;
      }
      Ok(q)
    });
    match checked {
      Ok(q) => Some(((self.grade, subject, difficulty), q)),
      Err(e) => {
        warn!(target: "question", error = %e, question = %self.question, "Skipping invalid catalog entry");
        None
      }
    }
  }
}

/// Read-only fallback question store, keyed by (grade, subject, difficulty).
#[derive(Clone, Debug, Default)]
pub struct FallbackCatalog {
  buckets: HashMap<BucketKey, Vec<Question>>,
}

impl FallbackCatalog {
  pub fn from_entries(entries: &[CatalogEntry]) -> Self {
    let mut catalog = Self::default();
    catalog.merge(entries);
    catalog
  }

  /// The catalog shipped with the binary. A broken embedded file leaves the
  /// catalog empty; `select` still answers from the hard-coded last rung.
  pub fn embedded() -> Self {
    match parse_entries(EMBEDDED_CATALOG) {
      Ok(entries) => {
        let catalog = Self::from_entries(&entries);
        info!(target: "question", questions = catalog.len(), buckets = catalog.buckets.len(), "Loaded embedded fallback catalog");
        catalog
      }
      Err(e) => {
        error!(target: "question", error = %e, "Embedded fallback catalog failed to parse");
        Self::default()
      }
    }
  }

  /// Merge extra entries (from the config file) into this catalog.
  pub fn with_extra(mut self, extra: &[CatalogEntry]) -> Self {
    if !extra.is_empty() {
      self.merge(extra);
      info!(target: "question", extra = extra.len(), total = self.len(), "Merged extra fallback entries");
    }
    self
  }

  fn merge(&mut self, entries: &[CatalogEntry]) {
    for (key, q) in entries.iter().filter_map(CatalogEntry::to_question) {
      self.buckets.entry(key).or_default().push(q);
    }
  }

  pub fn len(&self) -> usize {
    self.buckets.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[cfg(test)]
  pub fn questions(&self) -> impl Iterator<Item = &Question> {
    self.buckets.values().flatten()
  }

  fn of_kind(&self, key: BucketKey, kind: QuestionKind) -> Vec<&Question> {
    self.buckets.get(&key).map(|qs| qs.iter().filter(|q| q.kind() == kind).collect()).unwrap_or_default()
  }

  /// Total fallback selection; see `select_with`.
  pub fn select(
    &self,
    grade: u8,
    subject: Subject,
    sub_activity: &str,
    difficulty: Difficulty,
    kind: QuestionKind,
  ) -> (Question, FallbackRung) {
    self.select_with(&mut rand::thread_rng(), grade, subject, sub_activity, difficulty, kind)
  }

  /// Walk the degrade ladder:
  /// 1. exact bucket, same sub-activity
  /// 2. exact bucket, any sub-activity
  /// 3. default bucket (grade 2, Math, Easy), same sub-activity first
  /// 4. hard-coded question for the kind
  ///
  /// Only entries of the requested kind are eligible. The result echoes the
  /// request's sub_activity, subject and difficulty.
  pub fn select_with<R: Rng + ?Sized>(
    &self,
    rng: &mut R,
    grade: u8,
    subject: Subject,
    sub_activity: &str,
    difficulty: Difficulty,
    kind: QuestionKind,
  ) -> (Question, FallbackRung) {
    let exact = self.of_kind((grade, subject, difficulty), kind);
    let default = self.of_kind(DEFAULT_BUCKET, kind);

    let picked = [
      (same_activity(&exact, sub_activity), FallbackRung::ExactActivity),
      (exact, FallbackRung::SameBucket),
      (same_activity(&default, sub_activity), FallbackRung::DefaultBucket),
      (default, FallbackRung::DefaultBucket),
    ]
    .into_iter()
    .find_map(|(pool, rung)| pool.choose(&mut *rng).map(|q| ((*q).clone(), rung)));

    let (mut question, rung) = picked.unwrap_or_else(|| (absolute_question(kind), FallbackRung::Absolute));
    question.sub_activity = sub_activity.to_string();
    question.subject = subject;
    question.difficulty = difficulty;

    info!(target: "question", grade, %subject, %sub_activity, %difficulty, %kind, rung = rung.as_str(), "Serving fallback question");
    (question, rung)
  }
}

fn same_activity<'a>(pool: &[&'a Question], sub_activity: &str) -> Vec<&'a Question> {
  pool.iter().copied().filter(|q| q.sub_activity == sub_activity).collect()
}

/// Last rung: one fixed question per kind. Metadata is overwritten by the caller.
fn absolute_question(kind: QuestionKind) -> Question {
  let body = match kind {
    QuestionKind::MultipleChoice => QuestionBody::MultipleChoice {
      question: "What is 2 + 2?".into(),
      choices: vec!["3".into(), "4".into(), "5".into(), "6".into()],
      answer: "4".into(),
    },
    QuestionKind::DirectAnswer => QuestionBody::DirectAnswer {
      question: "The boy play with toys.".into(),
      answer: "The boy plays with toys.".into(),
    },
    QuestionKind::ReadingComprehension => QuestionBody::ReadingComprehension {
      passage: "Sara has a dog. Her dog is brown. The dog likes to play in the park.".into(),
      question: "What color is Sara's dog?".into(),
      choices: vec!["Black".into(), "Brown".into(), "White".into(), "Gray".into()],
      answer: "Brown".into(),
    },
  };
  Question { body, sub_activity: String::new(), subject: Subject::Math, difficulty: Difficulty::Easy }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{GRAMMAR_CORRECTION, MAX_GRADE, MIN_GRADE};
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn entry(grade: u8, subject: &str, difficulty: &str, sub_activity: &str, kind: &str) -> CatalogEntry {
    CatalogEntry {
      grade,
      subject: subject.into(),
      difficulty: difficulty.into(),
      sub_activity: sub_activity.into(),
      kind: kind.into(),
      question: "Which word is spelled correctly?".into(),
      choices: Some(vec!["becuase".into(), "because".into()]),
      answer: "because".into(),
      passage: None,
    }
  }

  #[test]
  fn every_embedded_entry_is_valid() {
    let entries = parse_entries(EMBEDDED_CATALOG).unwrap();
    let catalog = FallbackCatalog::from_entries(&entries);
    assert!(!entries.is_empty());
    assert_eq!(catalog.len(), entries.len());
  }

  #[test]
  fn embedded_catalog_covers_every_bucket() {
    let catalog = FallbackCatalog::embedded();
    for grade in MIN_GRADE..=MAX_GRADE {
      for difficulty in Difficulty::ALL {
        for subject in Subject::ALL {
          let (q, rung) = catalog.select(grade, subject, "Anything", difficulty, QuestionKind::MultipleChoice);
          assert_eq!(rung, FallbackRung::SameBucket, "{grade} {subject} {difficulty}");
          assert_eq!(q.kind(), QuestionKind::MultipleChoice);
        }
        let (q, rung) = catalog.select(grade, Subject::English, GRAMMAR_CORRECTION, difficulty, QuestionKind::DirectAnswer);
        assert_eq!(rung, FallbackRung::ExactActivity);
        assert!(q.choices().is_none());
        let (q, rung) =
          catalog.select(grade, Subject::English, "Reading Comprehension", difficulty, QuestionKind::ReadingComprehension);
        assert_eq!(rung, FallbackRung::ExactActivity);
        assert!(q.passage().is_some());
      }
    }
  }

  #[test]
  fn grade_two_addition_fallback_matches_request() {
    let catalog = FallbackCatalog::embedded();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
      let (q, rung) =
        catalog.select_with(&mut rng, 2, Subject::Math, "Addition/Subtraction", Difficulty::Easy, QuestionKind::MultipleChoice);
      assert_eq!(rung, FallbackRung::ExactActivity);
      assert_eq!(q.sub_activity, "Addition/Subtraction");
      let choices = q.choices().unwrap();
      assert_eq!(choices.len(), 4);
      assert!(choices.iter().any(|c| c == q.answer()));
    }
  }

  #[test]
  fn ladder_degrades_to_default_then_absolute() {
    let catalog = FallbackCatalog::embedded();
    // No Math direct-answer entries anywhere.
    let (q, rung) = catalog.select(4, Subject::Math, "Fractions", Difficulty::Hard, QuestionKind::DirectAnswer);
    assert_eq!(rung, FallbackRung::Absolute);
    assert_eq!(q.subject, Subject::Math);
    assert_eq!(q.difficulty, Difficulty::Hard);
    assert_eq!(q.sub_activity, "Fractions");

    let only_default = FallbackCatalog::from_entries(&[entry(2, "Math", "Easy", "Spelling", "multiple-choice")]);
    let (_, rung) = only_default.select(5, Subject::English, "Spelling", Difficulty::Hard, QuestionKind::MultipleChoice);
    assert_eq!(rung, FallbackRung::DefaultBucket);

    let (q, rung) = FallbackCatalog::default().select(1, Subject::English, "x", Difficulty::Medium, QuestionKind::MultipleChoice);
    assert_eq!(rung, FallbackRung::Absolute);
    assert_eq!(q.question_text(), "What is 2 + 2?");
    assert_eq!(q.subject, Subject::English);
  }

  #[test]
  fn extra_entries_merge_and_invalid_ones_are_skipped() {
    let mut bad = entry(3, "English", "Easy", "Spelling", "multiple-choice");
    bad.answer = "nope".into();
    let catalog = FallbackCatalog::default().with_extra(&[
      entry(3, "English", "Easy", "Spelling", "multiple-choice"),
      bad,
      entry(9, "English", "Easy", "Spelling", "multiple-choice"),
      entry(3, "History", "Easy", "Spelling", "multiple-choice"),
    ]);
    assert_eq!(catalog.len(), 1);
    let (q, rung) = catalog.select(3, Subject::English, "Spelling", Difficulty::Easy, QuestionKind::MultipleChoice);
    assert_eq!(rung, FallbackRung::ExactActivity);
    assert_eq!(q.answer(), "because");
  }
}
