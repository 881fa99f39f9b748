//! Loading service configuration (prompt overrides + extra fallback questions) from TOML,
//! plus the env-driven knobs the model layer needs.
//!
//! See `QuizConfig` and `Prompts` for the expected schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::catalog::CatalogEntry;

pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  /// Extra catalog entries merged into the embedded fallback catalog.
  #[serde(default)]
  pub fallback: Vec<CatalogEntry>,
}

/// System prompts and evaluation templates. Defaults are tuned for grades 1-5.
/// Every field can be overridden individually in the `[prompts]` table.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Generation, one system prompt per question type
  pub multiple_choice_system: String,
  pub direct_answer_system: String,
  pub reading_system: String,
  // Appended to the system prompt for Math requests
  pub math_rules: String,
  // Appended for specific English sub-activities
  pub opposites_rules: String,
  pub synonyms_rules: String,
  pub grammar_rules: String,
  // Evaluation
  pub grammar_eval_system: String,
  pub grammar_eval_user_template: String,
  pub reading_eval_system: String,
  pub reading_eval_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      multiple_choice_system: r#"You are an AI that generates educational multiple-choice questions for elementary school students.
Your response MUST be a single valid JSON object with the fields:
1. "question": the question text
2. "choices": an array of EXACTLY 4 distinct possible answers
3. "answer": the correct answer, copied exactly from one of the choices
4. "type": exactly "multiple-choice"

Example:
{"question": "What is 2 + 2? 🔢", "choices": ["3", "4", "5", "6"], "answer": "4", "type": "multiple-choice"}

Always add a few emojis related to the topic to the question text."#.into(),
      direct_answer_system: r#"You are an AI that generates educational direct-answer questions for elementary school students.
Your response MUST be a single valid JSON object with the fields:
1. "question": the question text
2. "answer": the correct answer
3. "type": exactly "direct-answer"
Never include a "choices" field.

Example:
{"question": "What is the capital of France? 🗼", "answer": "Paris", "type": "direct-answer"}"#.into(),
      reading_system: r#"You are an AI that generates educational reading comprehension questions for elementary school students.
Your response MUST be a single valid JSON object with the fields:
1. "passage": a short reading text appropriate for the grade level
2. "question": a question about the passage
3. "choices": an array of EXACTLY 4 distinct possible answers
4. "answer": the correct answer, copied exactly from one of the choices
5. "type": exactly "reading-comprehension"

Example:
{"passage": "Sam has a red ball. 🔴 He likes to play with it in the park. 🌳", "question": "What color is Sam's ball?", "choices": ["Red", "Blue", "Green", "Yellow"], "answer": "Red", "type": "reading-comprehension"}

Add emojis throughout the passage and the question."#.into(),
      math_rules: r#"
For math questions, follow these rules:
1. The question MUST include every number needed to solve it. Never ask about unknown quantities.
   BAD: "Sarah has some apples and gives some away. How many are left?"
   GOOD: "Sarah has 8 apples and gives 3 to her friend. How many apples does she have left?"
2. Work out the correct answer first, then write 3 plausible wrong answers.
3. The correct answer MUST appear in "choices" exactly as written in "answer".
4. Write numbers as plain digits in "choices" and "answer"."#.into(),
      opposites_rules: " When asked to use a specific word in a question about opposites, you MUST use exactly that word and follow the exact question template provided.".into(),
      synonyms_rules: r#"
This question is about SYNONYMS (words with SIMILAR meanings), NOT antonyms.
Examples of synonym pairs: big -> large, small -> tiny, happy -> joyful, cold -> chilly.
Examples of WRONG answers: big -> small, hot -> cold (those are opposites).
Check that the marked answer is not an opposite of the target word."#.into(),
      grammar_rules: r#" For Grammar Correction, "question" is a sentence with exactly one grammatical error and "answer" is the corrected sentence.
Example: {"question": "The dog run very fast.", "answer": "The dog runs very fast.", "type": "direct-answer"}"#.into(),
      grammar_eval_system: r#"You are a thoughtful elementary school teacher evaluating grammar corrections.
Judge whether the student fixed the main grammar issue, even if the wording differs from the expected answer.
Address the student by name, vary your openings, name the grammar rule involved, and keep it to 2-3 sentences.
Never address the student by names that appear in the question text.
Respond ONLY with JSON: {"is_correct": true|false, "feedback": "..."}"#.into(),
      grammar_eval_user_template: r#"ORIGINAL INCORRECT SENTENCE:
{question}

EXPECTED CORRECT ANSWER:
{correct_answer}

STUDENT'S ANSWER:
{user_answer}

STUDENT'S NAME:
{player_name}

Decide if the student's answer is essentially correct: the main grammar issue is fixed, the sentence is grammatical, and the meaning is kept. A minor spelling slip is acceptable.
Return JSON: {"is_correct": true|false, "feedback": "short, encouraging feedback for {player_name}"}"#.into(),
      reading_eval_system: r#"You are a supportive elementary school teacher evaluating reading comprehension answers.
Judge answers by understanding rather than exact wording and give constructive, encouraging feedback in 2-3 sentences.
Respond ONLY with JSON: {"is_correct": true|false, "feedback": "..."}"#.into(),
      reading_eval_user_template: r#"READING PASSAGE:
{passage}

QUESTION:
{question}

CORRECT ANSWER:
{correct_answer}

STUDENT'S ANSWER:
{user_answer}

Decide if the student's answer is essentially correct in meaning, not just exact words.
Return JSON: {"is_correct": true|false, "feedback": "..."}"#.into(),
    }
  }
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_quiz_config(&s) {
      Ok(cfg) => {
        info!(target: "quizforge", %path, extra_fallback = cfg.fallback.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizforge", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizforge", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_quiz_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

/// Upper bound on a single model call (MODEL_TIMEOUT_SECS, default 30).
pub fn model_timeout_from_env() -> Duration {
  let secs = match std::env::var("MODEL_TIMEOUT_SECS") {
    Ok(v) => match v.trim().parse::<u64>() {
      Ok(n) if n > 0 => n,
      _ => {
        warn!(target: "quizforge", value = %v, "Invalid MODEL_TIMEOUT_SECS; using default");
        DEFAULT_MODEL_TIMEOUT_SECS
      }
    },
    Err(_) => DEFAULT_MODEL_TIMEOUT_SECS,
  };
  Duration::from_secs(secs)
}
