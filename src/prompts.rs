//! Prompt construction for question generation and answer evaluation.
//!
//! A prompt is composed from four parts:
//!   1) a system message per question type (plus subject/activity rules),
//!   2) a sub-activity block filled with lexical samples,
//!   3) the numeric policy table for anything arithmetic,
//!   4) an output contract naming exact fields and forbidden ones.
//!
//! Blocks never describe the output format themselves; the contract is appended once.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

use crate::config::Prompts;
use crate::domain::{Difficulty, QuestionKind, QuestionSpec, Subject, GRAMMAR_CORRECTION};
use crate::lexicon::{self, pick, pick_excluding, pick_two, variety_seed};
use crate::util::fill_template;

/// Overused seed words kept out of the vocabulary activities.
pub const OPPOSITES_EXCLUDED_WORD: &str = "happy";
pub const SYNONYMS_EXCLUDED_WORD: &str = "big";

const EVALUATION_TEMPERATURE: f32 = 0.3;

/// Fully rendered prompt ready for a model call.
#[derive(Clone, Debug)]
pub struct Prompt {
  pub system: String,
  pub user: String,
  pub temperature: f32,
  pub schema: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GradeBand {
  Lower,
  Upper,
}

impl GradeBand {
  pub fn of(grade: u8) -> Self {
    if grade <= 2 { GradeBand::Lower } else { GradeBand::Upper }
  }
}

/// Difficulty scaling for every arithmetic activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumericPolicy {
  pub operand_min: u32,
  pub operand_max: u32,
  pub result_bound: u32,
  pub allow_negative: bool,
  pub times_table_max: u32,
  pub remainders: bool,
  pub max_steps: u8,
}

impl NumericPolicy {
  pub fn operand_range(&self) -> String {
    format!("{}-{}", self.operand_min, self.operand_max)
  }

  pub fn sign_policy(&self) -> &'static str {
    if self.allow_negative { "results may be negative" } else { "no negative numbers" }
  }

  fn steps_text(&self) -> &'static str {
    if self.max_steps > 1 { "one or two steps" } else { "exactly one step" }
  }

  fn division_text(&self) -> &'static str {
    if self.remainders { "divisions that may leave a remainder" } else { "divisions that come out even" }
  }
}

const fn policy(
  operand_min: u32,
  operand_max: u32,
  result_bound: u32,
  allow_negative: bool,
  times_table_max: u32,
  remainders: bool,
  max_steps: u8,
) -> NumericPolicy {
  NumericPolicy { operand_min, operand_max, result_bound, allow_negative, times_table_max, remainders, max_steps }
}

const NUMERIC_POLICY: [(GradeBand, Difficulty, NumericPolicy); 6] = [
  (GradeBand::Lower, Difficulty::Easy, policy(1, 10, 20, false, 5, false, 1)),
  (GradeBand::Lower, Difficulty::Medium, policy(5, 20, 30, false, 5, false, 1)),
  (GradeBand::Lower, Difficulty::Hard, policy(10, 30, 50, false, 5, false, 2)),
  (GradeBand::Upper, Difficulty::Easy, policy(10, 30, 50, false, 10, false, 1)),
  (GradeBand::Upper, Difficulty::Medium, policy(20, 50, 100, false, 10, true, 2)),
  (GradeBand::Upper, Difficulty::Hard, policy(30, 100, 150, true, 12, true, 2)),
];

pub fn numeric_policy(grade: u8, difficulty: Difficulty) -> NumericPolicy {
  let band = GradeBand::of(grade);
  NUMERIC_POLICY
    .iter()
    .find(|(b, d, _)| *b == band && *d == difficulty)
    .map(|(_, _, p)| *p)
    .unwrap_or(NUMERIC_POLICY[0].2)
}

/// Passage length and question focus for reading comprehension.
const READING_SHAPE: [(GradeBand, Difficulty, &str, &str); 6] = [
  (GradeBand::Lower, Difficulty::Easy, "very short passage (2-3 simple sentences)", "about the main idea or a specific detail"),
  (GradeBand::Lower, Difficulty::Medium, "short passage (3-4 sentences)", "about the order of events or a simple inference"),
  (GradeBand::Lower, Difficulty::Hard, "passage of 4-5 sentences", "that needs a simple inference"),
  (GradeBand::Upper, Difficulty::Easy, "short passage (3-5 simple sentences)", "about key details or the main idea"),
  (GradeBand::Upper, Difficulty::Medium, "passage of 5-7 sentences", "about how ideas relate or an inference"),
  (GradeBand::Upper, Difficulty::Hard, "passage of 7-10 sentences with varied structure", "about cause and effect or drawing conclusions"),
];

fn reading_shape(grade: u8, difficulty: Difficulty) -> (&'static str, &'static str) {
  let band = GradeBand::of(grade);
  READING_SHAPE
    .iter()
    .find(|(b, d, _, _)| *b == band && *d == difficulty)
    .map(|(_, _, len, focus)| (*len, *focus))
    .unwrap_or((READING_SHAPE[0].2, READING_SHAPE[0].3))
}

const OPPOSITES_TEMPLATES: &[&str] = &[
  "What is the opposite of '{word}'?",
  "Which word means the opposite of '{word}'?",
  "Select the word that has the opposite meaning of '{word}'.",
  "Choose the antonym for '{word}'.",
  "Which of these words is most opposite in meaning to '{word}'?",
];

const SYNONYMS_TEMPLATES: &[&str] = &[
  "What is a synonym for '{word}'?",
  "Which word means the same as '{word}'?",
  "Select the word that has a similar meaning to '{word}'.",
  "Choose the synonym for '{word}'.",
  "Which of these words is most similar in meaning to '{word}'?",
];

const WORD_PROBLEM_TEMPLATES: &[&str] = &[
  "{person} has {num1} {objects}. They get {num2} more. How many {objects} do they have now?",
  "{person} had {num1} {objects}. They gave away {num2} of them. How many {objects} are left?",
  "{person} and {person2} have {num1} and {num2} {objects}. How many {objects} do they have in total?",
  "There are {num1} {objects} at the {location}. {person} brings {num2} more. How many {objects} are there now?",
  "{person} has {num1} {objects} and {person2} has {num2} {objects}. How many more {objects} does {person} have?",
  "{person} has {num1} boxes of {objects}. Each box holds {num2} {objects}. How many {objects} are there in total?",
];

const NOUN_PRONOUN_FOCUS_LOWER: &[&str] = &[
  "identifying common nouns",
  "identifying proper nouns",
  "matching pronouns to nouns",
  "basic singular and plural nouns",
];

const NOUN_PRONOUN_FOCUS_UPPER: &[&str] = &[
  "identifying common and proper nouns",
  "identifying subject and object pronouns",
  "replacing nouns with the right pronoun",
  "possessive nouns and pronouns",
  "pronoun-antecedent agreement",
];

const VOCABULARY_FOCUS: &[&str] = &[
  "the meaning of a word in a Mario adventure",
  "a synonym or antonym using a Mario-themed sentence",
  "completing a sentence about a Mario adventure",
  "the part of speech of a word in a Mario-themed sentence",
];

/// Which prompt block serves a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
  AdditionSubtraction,
  MultiplicationDivision,
  WordProblems,
  MushroomCalculations,
  OppositesAntonyms,
  Synonyms,
  ReadingComprehension,
  NounsPronouns,
  GrammarCorrection,
  MushroomVocabulary,
  Generic,
}

impl Activity {
  pub fn classify(spec: &QuestionSpec) -> Self {
    if spec.kind == QuestionKind::ReadingComprehension {
      return Activity::ReadingComprehension;
    }
    if spec.sub_activity == GRAMMAR_CORRECTION {
      return Activity::GrammarCorrection;
    }
    match (spec.subject, spec.sub_activity.as_str()) {
      (Subject::Math, "Addition/Subtraction") => Activity::AdditionSubtraction,
      (Subject::Math, "Multiplication/Division") => Activity::MultiplicationDivision,
      (Subject::Math, "Word Problems") => Activity::WordProblems,
      (Subject::Math, "Mushroom Kingdom Calculations") => Activity::MushroomCalculations,
      (Subject::English, "Opposites/Antonyms") => Activity::OppositesAntonyms,
      (Subject::English, "Synonyms") => Activity::Synonyms,
      (Subject::English, "Reading Comprehension") => Activity::ReadingComprehension,
      (Subject::English, "Nouns/Pronouns") => Activity::NounsPronouns,
      (Subject::English, "Mushroom Kingdom Vocabulary") => Activity::MushroomVocabulary,
      _ => Activity::Generic,
    }
  }
}

/// Sampling temperature for a generation request.
pub fn temperature(spec: &QuestionSpec) -> f32 {
  match spec.kind {
    QuestionKind::ReadingComprehension => 0.8,
    QuestionKind::DirectAnswer if spec.is_grammar_correction() => 0.7,
    QuestionKind::DirectAnswer => 0.5,
    QuestionKind::MultipleChoice => match (spec.subject, spec.sub_activity.as_str()) {
      (Subject::English, "Opposites/Antonyms") => 0.9,
      (Subject::English, "Synonyms") => 0.8,
      (Subject::English, _) => 0.7,
      (Subject::Math, _) => 0.5,
    },
  }
}

/// JSON schema handed to backends that support structured output.
pub fn response_schema(kind: QuestionKind) -> Value {
  match kind {
    QuestionKind::MultipleChoice => json!({
      "type": "object",
      "properties": {
        "question": { "type": "string" },
        "choices": { "type": "array", "items": { "type": "string" }, "minItems": 4, "maxItems": 4 },
        "answer": { "type": "string" },
        "type": { "type": "string", "enum": ["multiple-choice"] }
      },
      "required": ["question", "choices", "answer", "type"]
    }),
    QuestionKind::DirectAnswer => json!({
      "type": "object",
      "properties": {
        "question": { "type": "string" },
        "answer": { "type": "string" },
        "type": { "type": "string", "enum": ["direct-answer"] }
      },
      "required": ["question", "answer", "type"]
    }),
    QuestionKind::ReadingComprehension => json!({
      "type": "object",
      "properties": {
        "passage": { "type": "string" },
        "question": { "type": "string" },
        "choices": { "type": "array", "items": { "type": "string" }, "minItems": 4, "maxItems": 4 },
        "answer": { "type": "string" },
        "type": { "type": "string", "enum": ["reading-comprehension"] }
      },
      "required": ["passage", "question", "choices", "answer", "type"]
    }),
  }
}

pub fn evaluation_schema() -> Value {
  json!({
    "type": "object",
    "properties": {
      "is_correct": { "type": "boolean" },
      "feedback": { "type": "string" }
    },
    "required": ["is_correct", "feedback"]
  })
}

/// Exact output contract appended to every generation prompt.
pub fn output_contract(kind: QuestionKind) -> &'static str {
  match kind {
    QuestionKind::MultipleChoice => r#"
OUTPUT FORMAT (mandatory):
Return ONLY one JSON object with exactly these keys: "question", "choices", "answer", "type".
- "choices": an array of EXACTLY 4 distinct strings. Do not put the choices inside the question text.
- "answer": copied character for character from one of the "choices".
- "type": exactly "multiple-choice".
Do NOT include "passage" or "correct_answer". Do NOT nest fields under "properties". No markdown, no commentary."#,
    QuestionKind::DirectAnswer => r#"
OUTPUT FORMAT (mandatory):
Return ONLY one JSON object with exactly these keys: "question", "answer", "type".
- "answer": the single correct answer as a string.
- "type": exactly "direct-answer".
Do NOT include "choices" or "passage". Do NOT nest fields under "properties". No markdown, no commentary."#,
    QuestionKind::ReadingComprehension => r#"
OUTPUT FORMAT (mandatory):
Return ONLY one JSON object with exactly these keys: "passage", "question", "choices", "answer", "type".
- "choices": an array of EXACTLY 4 distinct strings. Do not put the choices inside the question text.
- "answer": copied character for character from one of the "choices".
- "type": exactly "reading-comprehension".
Do NOT include "correct_answer". Do NOT nest fields under "properties". No markdown, no commentary."#,
  }
}

/// Build the generation prompt for a normalized request.
pub fn build(spec: &QuestionSpec, prompts: &Prompts) -> Prompt {
  let mut rng = rand::thread_rng();
  build_with(spec, prompts, &mut rng)
}

pub fn build_with<R: Rng + ?Sized>(spec: &QuestionSpec, prompts: &Prompts, rng: &mut R) -> Prompt {
  let activity = Activity::classify(spec);
  let seed = variety_seed(rng);

  let block = match activity {
    Activity::AdditionSubtraction => addition_block(spec, rng),
    Activity::MultiplicationDivision => multiplication_block(spec, rng),
    Activity::WordProblems => word_problem_block(spec, rng),
    Activity::MushroomCalculations => mushroom_math_block(spec, rng),
    Activity::OppositesAntonyms => opposites_block(spec, rng),
    Activity::Synonyms => synonyms_block(spec, rng),
    Activity::ReadingComprehension => reading_block(spec, rng),
    Activity::NounsPronouns => nouns_block(spec, rng),
    Activity::GrammarCorrection => grammar_block(spec, rng),
    Activity::MushroomVocabulary => mushroom_vocabulary_block(spec, rng),
    Activity::Generic => generic_block(spec, rng),
  };

  let user = format!(
    "{}\nUse this random seed for variety: {}\nMake it different from questions you generated before.\n{}",
    block.trim_end(),
    seed,
    output_contract(spec.kind)
  );

  Prompt { system: system_message(spec, activity, prompts), user, temperature: temperature(spec), schema: response_schema(spec.kind) }
}

fn system_message(spec: &QuestionSpec, activity: Activity, prompts: &Prompts) -> String {
  let mut system = match spec.kind {
    QuestionKind::MultipleChoice => prompts.multiple_choice_system.clone(),
    QuestionKind::DirectAnswer => prompts.direct_answer_system.clone(),
    QuestionKind::ReadingComprehension => prompts.reading_system.clone(),
  };
  if spec.subject == Subject::Math && spec.kind != QuestionKind::ReadingComprehension {
    system.push_str(&prompts.math_rules);
  }
  match activity {
    Activity::OppositesAntonyms => system.push_str(&prompts.opposites_rules),
    Activity::Synonyms => system.push_str(&prompts.synonyms_rules),
    Activity::GrammarCorrection => system.push_str(&prompts.grammar_rules),
    _ => {}
  }
  system
}

fn header(spec: &QuestionSpec, topic: &str) -> String {
  format!(
    "Generate a {} grade-{} level {} question about {} for elementary school students.",
    spec.difficulty.lower(),
    spec.grade,
    spec.subject.as_str().to_lowercase(),
    topic
  )
}

fn numbers_line(p: &NumericPolicy) -> String {
  format!(
    "Use numbers in the range {}, keep every result at or below {}, {}.",
    p.operand_range(),
    p.result_bound,
    p.sign_policy()
  )
}

fn addition_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let p = numeric_policy(spec.grade, spec.difficulty);
  let operation = pick(rng, &["addition", "subtraction", "adding", "subtracting", "sums", "differences"]);
  let (person1, person2) = pick_two(rng, lexicon::NAMES);
  format!(
    "{}\n{}\nYou can optionally use these elements:\n- Names: {} and/or {}\n- Objects: {}\n- Location: {}\nThe question must be solvable with one addition or subtraction.\nAdd emojis to make it appealing to children.",
    header(spec, operation),
    numbers_line(&p),
    person1,
    person2,
    pick(rng, lexicon::MATH_OBJECTS),
    pick(rng, lexicon::MATH_LOCATIONS),
  )
}

fn multiplication_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let p = numeric_policy(spec.grade, spec.difficulty);
  let (person1, person2) = pick_two(rng, lexicon::NAMES);
  format!(
    "{}\nFor multiplication, use times tables up to {}. For division, use {} with divisors up to {}.\nYou can optionally use these elements:\n- Names: {} and/or {}\n- Objects arranged in groups or rows: {}\n- Location: {}\nAdd emojis to make it appealing to children.",
    header(spec, "multiplication or division"),
    p.times_table_max,
    p.division_text(),
    p.times_table_max,
    person1,
    person2,
    pick(rng, lexicon::MATH_OBJECTS),
    pick(rng, lexicon::MATH_LOCATIONS),
  )
}

fn word_problem_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let p = numeric_policy(spec.grade, spec.difficulty);
  let (person1, person2) = pick_two(rng, lexicon::NAMES);
  let objects = pick(rng, lexicon::MATH_OBJECTS);
  let location = pick(rng, lexicon::MATH_LOCATIONS);
  let num1 = rng.gen_range(p.operand_min..=p.operand_max).to_string();
  let num2 = rng.gen_range(p.operand_min..=p.operand_max).to_string();
  let example = fill_template(
    pick(rng, WORD_PROBLEM_TEMPLATES),
    &[("person", person1), ("person2", person2), ("objects", objects), ("location", location), ("num1", &num1), ("num2", &num2)],
  );
  format!(
    "{}\nThe problem should need {} and use numbers in the range {} with results at or below {}, {}.\nInclude these elements:\n- Characters: {} and optionally {}\n- Objects: {}\n- Activity: {}\n- Setting: {}\nHere is one possible structure; write your own story: \"{}\"\nThe problem must state every number needed to solve it.\nAdd emojis to make it appealing to children.",
    header(spec, "a word problem"),
    p.steps_text(),
    p.operand_range(),
    p.result_bound,
    p.sign_policy(),
    person1,
    person2,
    objects,
    pick(rng, lexicon::MATH_ACTIVITIES),
    location,
    example,
  )
}

fn mushroom_math_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let p = numeric_policy(spec.grade, spec.difficulty);
  let (hero, other) = pick_two(rng, lexicon::MARIO_CHARACTERS);
  format!(
    "{}\nSet it in a Mario and Luigi themed world with these elements:\n- Characters: {} and/or {}\n- Items: {}\n- Location: {}\n- Activity: {}\n{}\nThe math should be collecting coins, counting items, comparing scores or measuring distances in the Mushroom Kingdom.\nAdd emojis to make it appealing to children.",
    header(spec, "Mushroom Kingdom math"),
    hero,
    other,
    pick(rng, lexicon::MARIO_ITEMS),
    pick(rng, lexicon::MARIO_LOCATIONS),
    pick(rng, lexicon::MARIO_ACTIVITIES),
    numbers_line(&p),
  )
}

/// Target word and pinned phrasing for an antonym question.
pub fn sample_opposites<R: Rng + ?Sized>(rng: &mut R) -> (&'static str, String) {
  let word = pick_excluding(rng, lexicon::ENGLISH_ADJECTIVES, OPPOSITES_EXCLUDED_WORD);
  let template = pick(rng, OPPOSITES_TEMPLATES);
  (word, fill_template(template, &[("word", word)]))
}

pub fn sample_synonyms<R: Rng + ?Sized>(rng: &mut R) -> (&'static str, String) {
  let word = pick_excluding(rng, lexicon::ENGLISH_ADJECTIVES, SYNONYMS_EXCLUDED_WORD);
  let template = pick(rng, SYNONYMS_TEMPLATES);
  (word, fill_template(template, &[("word", word)]))
}

fn word_level(spec: &QuestionSpec) -> &'static str {
  match GradeBand::of(spec.grade) {
    GradeBand::Lower => "a simple word",
    GradeBand::Upper => "a word",
  }
}

fn opposites_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let (word, pinned) = sample_opposites(rng);
  format!(
    "{}\nYOU MUST use exactly this question text WITHOUT changing the word: \"{}\"\nThe target word is '{}'. Do not substitute it. Do not use the word '{}'.\nThe correct answer is the true opposite of {} appropriate for grade {}.\nAdd emojis to make it appealing to children.",
    header(spec, "opposites (antonyms)"),
    pinned,
    word,
    OPPOSITES_EXCLUDED_WORD,
    word_level(spec),
    spec.grade,
  )
}

fn synonyms_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let (word, pinned) = sample_synonyms(rng);
  format!(
    "{}\nYOU MUST use exactly this question text WITHOUT changing the word: \"{}\"\nThe target word is '{}'. Do not substitute it. Do not use the word '{}'.\nThe correct answer has a SIMILAR meaning to '{}'. It must NOT be an opposite.\nPick {} appropriate for grade {}.\nAdd emojis to make it appealing to children.",
    header(spec, "synonyms (words with similar meanings)"),
    pinned,
    word,
    SYNONYMS_EXCLUDED_WORD,
    word,
    word_level(spec),
    spec.grade,
  )
}

fn reading_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let (length, focus) = reading_shape(spec.grade, spec.difficulty);
  let (character1, character2) = pick_two(rng, lexicon::NAMES);
  let placement = if spec.kind == QuestionKind::ReadingComprehension {
    ""
  } else {
    "\nThere is no separate passage field: put the short passage at the start of the question text, then ask the question."
  };
  format!(
    "{}{}",
    reading_text(spec, rng, length, focus, character1, character2),
    placement
  )
}

fn reading_text<R: Rng + ?Sized>(
  spec: &QuestionSpec,
  rng: &mut R,
  length: &str,
  focus: &str,
  character1: &str,
  character2: &str,
) -> String {
  let shape = match spec.kind {
    QuestionKind::DirectAnswer => "short-answer question with no answer choices",
    QuestionKind::MultipleChoice | QuestionKind::ReadingComprehension => "multiple-choice question",
  };
  format!(
    "Generate a {} grade-{} level reading comprehension passage and question for elementary school students.\nWrite a {} about {} set at a {}, followed by a {} {}.\nInclude the character {} and optionally {}.\nThe passage should use vocabulary for grade {}, have a clear beginning, middle and end, and include details worth asking about.\nAdd emojis throughout the passage and the question.",
    spec.difficulty.lower(),
    spec.grade,
    length,
    pick(rng, lexicon::READING_TOPICS),
    pick(rng, lexicon::READING_LOCATIONS),
    shape,
    focus,
    character1,
    character2,
    spec.grade,
  )
}

fn nouns_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let focus_pool = match GradeBand::of(spec.grade) {
    GradeBand::Lower => NOUN_PRONOUN_FOCUS_LOWER,
    GradeBand::Upper => NOUN_PRONOUN_FOCUS_UPPER,
  };
  let (name1, name2) = pick_two(rng, lexicon::NAMES);
  let nouns: Vec<&str> = lexicon::ENGLISH_NOUNS.choose_multiple(rng, 3).copied().collect();
  format!(
    "{}\nUse these elements:\n- Names: {} and/or {}\n- Objects: {}\nMake the question clear, with one correct answer, and add emojis.",
    header(spec, pick(rng, focus_pool)),
    name1,
    name2,
    nouns.join(", "),
  )
}

/// Error category for a grammar-correction sentence. Lower grades only see the easier ones.
pub fn sample_grammar_error<R: Rng + ?Sized>(grade: u8, rng: &mut R) -> &'static str {
  let pool = match GradeBand::of(grade) {
    GradeBand::Lower => &lexicon::GRAMMAR_ERROR_TYPES[..lexicon::EASY_GRAMMAR_ERROR_COUNT],
    GradeBand::Upper => lexicon::GRAMMAR_ERROR_TYPES,
  };
  pick(rng, pool)
}

fn grammar_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let error_type = sample_grammar_error(spec.grade, rng);
  let (person1, person2) = pick_two(rng, lexicon::NAMES);
  format!(
    "Create a grammar correction question for a {} grade-{} student.\nStep 1: write a grammatically CORRECT, natural sentence. Optional context:\n- Characters: {}, {}\n- Scenario: {}\n- Location: {}\n- Object: {}\n- Time: {}\n- Topic: {}\nThat sentence is the \"answer\".\nStep 2: introduce EXACTLY ONE error of the type '{}' into it. The sentence with the error is the \"question\".\nExample for 'subject-verb agreement': question \"The cat jump high. 🐈\", answer \"The cat jumps high.\"",
    spec.difficulty.lower(),
    spec.grade,
    person1,
    person2,
    pick(rng, lexicon::SCENARIOS),
    pick(rng, lexicon::LOCATIONS),
    pick(rng, lexicon::OBJECTS),
    pick(rng, lexicon::TIME_EXPRESSIONS),
    pick(rng, lexicon::ENGLISH_TOPICS),
    error_type,
  )
}

fn mushroom_vocabulary_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let (hero, other) = pick_two(rng, lexicon::MARIO_CHARACTERS);
  format!(
    "{}\nSet it in a Mario and Luigi themed world with these elements:\n- Characters: {} and/or {}\n- Items: {}\n- Location: {}\nFocus on {}.\nUse vocabulary appropriate for grade {}.",
    header(spec, "vocabulary"),
    hero,
    other,
    pick(rng, lexicon::MARIO_ITEMS),
    pick(rng, lexicon::MARIO_LOCATIONS),
    pick(rng, VOCABULARY_FOCUS),
    spec.grade,
  )
}

fn generic_block<R: Rng + ?Sized>(spec: &QuestionSpec, rng: &mut R) -> String {
  let (person1, person2) = pick_two(rng, lexicon::NAMES);
  let mut block = format!(
    "{}\nYou can optionally use these names: {} and/or {}.\nMake it fun and engaging, with emojis.",
    header(spec, &spec.sub_activity),
    person1,
    person2,
  );
  if spec.subject == Subject::Math {
    let p = numeric_policy(spec.grade, spec.difficulty);
    block.push('\n');
    block.push_str(&numbers_line(&p));
  }
  block
}

/// Prompt asking the model to grade a grammar correction.
pub fn grammar_evaluation(
  prompts: &Prompts,
  question: &str,
  user_answer: &str,
  correct_answer: &str,
  player_name: &str,
) -> Prompt {
  let user = fill_template(
    &prompts.grammar_eval_user_template,
    &[
      ("question", question),
      ("user_answer", user_answer),
      ("correct_answer", correct_answer),
      ("player_name", player_name),
    ],
  );
  Prompt {
    system: prompts.grammar_eval_system.clone(),
    user,
    temperature: EVALUATION_TEMPERATURE,
    schema: evaluation_schema(),
  }
}

/// Prompt asking the model to grade a reading-comprehension answer.
pub fn reading_evaluation(
  prompts: &Prompts,
  passage: &str,
  question: &str,
  user_answer: &str,
  correct_answer: &str,
) -> Prompt {
  let user = fill_template(
    &prompts.reading_eval_user_template,
    &[
      ("passage", passage),
      ("question", question),
      ("user_answer", user_answer),
      ("correct_answer", correct_answer),
    ],
  );
  Prompt {
    system: prompts.reading_eval_system.clone(),
    user,
    temperature: EVALUATION_TEMPERATURE,
    schema: evaluation_schema(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn spec(grade: u8, subject: Subject, sub: &str, difficulty: Difficulty, kind: QuestionKind) -> QuestionSpec {
    QuestionSpec { grade, subject, sub_activity: sub.into(), difficulty, kind }
  }

  #[test]
  fn numeric_policy_covers_every_band_and_difficulty() {
    for grade in 1..=5u8 {
      for d in Difficulty::ALL {
        let p = numeric_policy(grade, d);
        assert!(p.operand_min < p.operand_max);
        assert!(p.result_bound >= p.operand_max);
      }
    }
    assert_eq!(numeric_policy(2, Difficulty::Easy).operand_range(), "1-10");
    assert_eq!(numeric_policy(3, Difficulty::Hard).result_bound, 150);
    assert!(numeric_policy(5, Difficulty::Hard).allow_negative);
    assert!(!numeric_policy(1, Difficulty::Hard).allow_negative);
  }

  #[test]
  fn addition_prompt_carries_the_policy_range() {
    let mut rng = StdRng::seed_from_u64(11);
    let s = spec(2, Subject::Math, "Addition/Subtraction", Difficulty::Medium, QuestionKind::MultipleChoice);
    let p = build_with(&s, &Prompts::default(), &mut rng);
    assert!(p.user.contains("5-20"), "{}", p.user);
    assert!(p.user.contains("at or below 30"));
    assert!(p.system.contains("For math questions"));
    assert_eq!(p.temperature, 0.5);
  }

  #[test]
  fn opposites_never_target_the_excluded_word() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..300 {
      let (word, pinned) = sample_opposites(&mut rng);
      assert_ne!(word, OPPOSITES_EXCLUDED_WORD);
      assert!(pinned.contains(&format!("'{word}'")));
    }
    for _ in 0..300 {
      let (word, _) = sample_synonyms(&mut rng);
      assert_ne!(word, SYNONYMS_EXCLUDED_WORD);
    }
  }

  #[test]
  fn younger_grades_get_easier_grammar_errors() {
    let mut rng = StdRng::seed_from_u64(9);
    let easy = &lexicon::GRAMMAR_ERROR_TYPES[..lexicon::EASY_GRAMMAR_ERROR_COUNT];
    for _ in 0..200 {
      assert!(easy.contains(&sample_grammar_error(1, &mut rng)));
      assert!(easy.contains(&sample_grammar_error(2, &mut rng)));
    }
    let mut seen_hard = false;
    for _ in 0..500 {
      if !easy.contains(&sample_grammar_error(4, &mut rng)) {
        seen_hard = true;
      }
    }
    assert!(seen_hard);
  }

  #[test]
  fn contract_names_forbidden_fields_per_type() {
    assert!(output_contract(QuestionKind::DirectAnswer).contains("Do NOT include \"choices\""));
    assert!(output_contract(QuestionKind::MultipleChoice).contains("EXACTLY 4"));
    assert!(output_contract(QuestionKind::ReadingComprehension).contains("\"passage\""));
  }

  #[test]
  fn every_activity_renders_a_prompt_with_contract_and_seed() {
    let subs = [
      (Subject::Math, "Addition/Subtraction"),
      (Subject::Math, "Multiplication/Division"),
      (Subject::Math, "Word Problems"),
      (Subject::Math, "Mushroom Kingdom Calculations"),
      (Subject::Math, "Fractions"),
      (Subject::English, "Opposites/Antonyms"),
      (Subject::English, "Synonyms"),
      (Subject::English, "Reading Comprehension"),
      (Subject::English, "Nouns/Pronouns"),
      (Subject::English, GRAMMAR_CORRECTION),
      (Subject::English, "Mushroom Kingdom Vocabulary"),
      (Subject::English, "Spelling"),
    ];
    let mut rng = StdRng::seed_from_u64(21);
    for (subject, sub) in subs {
      for grade in 1..=5u8 {
        for kind in QuestionKind::ALL {
          let s = spec(grade, subject, sub, Difficulty::Hard, kind);
          let p = build_with(&s, &Prompts::default(), &mut rng);
          assert!(p.user.contains("OUTPUT FORMAT"), "{sub}");
          assert!(p.user.contains("random seed for variety"));
          assert!(!p.user.contains("{person"), "unfilled template in {sub}");
          assert!(p.schema["required"].as_array().map(|a| a.len()).unwrap_or(0) >= 3);
        }
      }
    }
  }

  #[test]
  fn temperatures_follow_activity() {
    let t = |subject, sub: &str, kind| temperature(&spec(2, subject, sub, Difficulty::Easy, kind));
    assert_eq!(t(Subject::English, "Opposites/Antonyms", QuestionKind::MultipleChoice), 0.9);
    assert_eq!(t(Subject::English, "Synonyms", QuestionKind::MultipleChoice), 0.8);
    assert_eq!(t(Subject::English, "Nouns/Pronouns", QuestionKind::MultipleChoice), 0.7);
    assert_eq!(t(Subject::English, GRAMMAR_CORRECTION, QuestionKind::DirectAnswer), 0.7);
    assert_eq!(t(Subject::Math, "Addition/Subtraction", QuestionKind::DirectAnswer), 0.5);
    assert_eq!(t(Subject::English, "Reading Comprehension", QuestionKind::ReadingComprehension), 0.8);
  }

  #[test]
  fn evaluation_prompts_fill_every_placeholder() {
    let prompts = Prompts::default();
    let p = grammar_evaluation(&prompts, "She go school.", "She goes to school.", "She goes to school.", "Mia");
    assert!(p.user.contains("She go school."));
    assert!(p.user.contains("Mia"));
    assert!(!p.user.contains("{player_name}"));
    let r = reading_evaluation(&prompts, "Sara has a dog.", "What does Sara have?", "a dog", "A dog");
    assert!(r.user.contains("Sara has a dog."));
    assert!(!r.user.contains("{passage}"));
  }

  #[test]
  fn reading_block_names_the_requested_question_shape() {
    let mut rng = StdRng::seed_from_u64(11);
    let direct = spec(3, Subject::English, "Reading Comprehension", Difficulty::Medium, QuestionKind::DirectAnswer);
    let p = build_with(&direct, &Prompts::default(), &mut rng);
    assert!(p.user.contains("followed by a short-answer question with no answer choices"));
    assert!(!p.user.contains("followed by a multiple-choice question"));

    let reading = spec(3, Subject::English, "Reading Comprehension", Difficulty::Medium, QuestionKind::ReadingComprehension);
    let p = build_with(&reading, &Prompts::default(), &mut rng);
    assert!(p.user.contains("followed by a multiple-choice question"));
  }

  fn line_after<'a>(text: &'a str, label: &str) -> &'a str {
    let mut lines = text.lines();
    let _ = lines.by_ref().find(|l| l.trim() == label);
    lines.next().unwrap_or_default()
  }

  #[test]
  fn evaluation_prompts_keep_student_text_verbatim() {
    let prompts = Prompts::default();
    let p = reading_evaluation(&prompts, "Sara has a brown dog.", "What color is the dog?", "{correct_answer}", "brown");
    assert_eq!(line_after(&p.user, "STUDENT'S ANSWER:"), "{correct_answer}");
    assert_eq!(line_after(&p.user, "CORRECT ANSWER:"), "brown");

    let p = grammar_evaluation(&prompts, "He go {user_answer}.", "{correct_answer} {player_name}", "He goes home.", "Mia");
    assert_eq!(line_after(&p.user, "STUDENT'S ANSWER:"), "{correct_answer} {player_name}");
    assert_eq!(line_after(&p.user, "ORIGINAL INCORRECT SENTENCE:"), "He go {user_answer}.");
    assert_eq!(line_after(&p.user, "EXPECTED CORRECT ANSWER:"), "He goes home.");
    assert_eq!(line_after(&p.user, "STUDENT'S NAME:"), "Mia");
  }
}
