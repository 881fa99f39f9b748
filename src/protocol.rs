//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::{EvaluationKind, Question, Subject, DEFAULT_GRADE};

pub const DEFAULT_SUBJECT: Subject = Subject::Math;
pub const DEFAULT_DIFFICULTY: &str = "Easy";
pub const DEFAULT_QUESTION_TYPE: &str = "multiple-choice";

/// Raw question parameters as a caller sends them. Nothing is validated here;
/// `QuestionSpec::normalize` does that.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuestionQuery {
    pub grade: Option<Value>,
    pub subject: Option<String>,
    pub sub_activity: Option<String>,
    pub difficulty: Option<String>,
    pub question_type: Option<String>,
}

/// Query parameters for `GET /api/v1/question`. Query strings only carry text.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuestionParams {
    pub grade: Option<String>,
    pub subject: Option<String>,
    pub sub_activity: Option<String>,
    pub difficulty: Option<String>,
    pub question_type: Option<String>,
}

impl From<QuestionParams> for QuestionQuery {
    fn from(p: QuestionParams) -> Self {
        Self {
            grade: p.grade.map(Value::String),
            subject: p.subject,
            sub_activity: p.sub_activity,
            difficulty: p.difficulty,
            question_type: p.question_type,
        }
    }
}

/// Parameters with request defaults filled in (grade 2, Math, Addition/Subtraction, Easy, multiple-choice).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub grade: i64,
    pub subject: String,
    pub sub_activity: String,
    pub difficulty: String,
    pub question_type: String,
}

impl QuestionQuery {
    pub fn resolve(self) -> ResolvedQuery {
        let grade = match &self.grade {
            None | Some(Value::Null) => DEFAULT_GRADE as i64,
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)).unwrap_or(DEFAULT_GRADE as i64),
            Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or_else(|_| {
                warn!(target: "question", grade = %s, "Non-numeric grade; using default");
                DEFAULT_GRADE as i64
            }),
            Some(other) => {
                warn!(target: "question", grade = %other, "Unsupported grade value; using default");
                DEFAULT_GRADE as i64
            }
        };
        let subject = self.subject.unwrap_or_else(|| DEFAULT_SUBJECT.as_str().into());
        // Empty sub_activity is left for normalization, which picks the subject default.
        let sub_activity = self.sub_activity.unwrap_or_else(|| {
            Subject::parse(&subject).unwrap_or(DEFAULT_SUBJECT).default_sub_activity().into()
        });
        ResolvedQuery {
            grade,
            subject,
            sub_activity,
            difficulty: self.difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.into()),
            question_type: self.question_type.unwrap_or_else(|| DEFAULT_QUESTION_TYPE.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GrammarEvalIn {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingEvalIn {
    pub passage: String,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewQuestion {
        #[serde(default)]
        grade: Option<Value>,
        #[serde(default)]
        subject: Option<String>,
        #[serde(default)]
        sub_activity: Option<String>,
        #[serde(default)]
        difficulty: Option<String>,
        #[serde(default)]
        question_type: Option<String>,
    },
    Evaluate {
        kind: EvaluationKind,
        question: String,
        user_answer: String,
        correct_answer: String,
        #[serde(default)]
        passage: Option<String>,
        #[serde(default)]
        player_name: Option<String>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        question: Question,
        source: String,
    },
    Evaluation {
        kind: EvaluationKind,
        is_correct: bool,
        feedback: String,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_query_resolves_to_defaults() {
        let r = QuestionQuery::default().resolve();
        assert_eq!(
            r,
            ResolvedQuery {
                grade: 2,
                subject: "Math".into(),
                sub_activity: "Addition/Subtraction".into(),
                difficulty: "Easy".into(),
                question_type: "multiple-choice".into(),
            }
        );
    }

    #[test]
    fn grade_accepts_numbers_and_numeric_strings() {
        let q = QuestionQuery { grade: Some(json!(4)), ..Default::default() };
        assert_eq!(q.resolve().grade, 4);
        let q: QuestionQuery = QuestionParams { grade: Some(" 9 ".into()), ..Default::default() }.into();
        assert_eq!(q.resolve().grade, 9);
        let q = QuestionQuery { grade: Some(json!("three")), ..Default::default() };
        assert_eq!(q.resolve().grade, 2);
        let q = QuestionQuery { subject: Some("english".into()), ..Default::default() };
        assert_eq!(q.resolve().sub_activity, "Reading Comprehension");
    }

    #[test]
    fn ws_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type": "new_question", "grade": 3, "subject": "English"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::NewQuestion { subject: Some(_), .. }));
        let m: ClientWsMessage = serde_json::from_str(
            r#"{"type": "evaluate", "kind": "reading", "passage": "p", "question": "q", "user_answer": "a", "correct_answer": "a"}"#,
        )
        .unwrap();
        assert!(matches!(m, ClientWsMessage::Evaluate { kind: EvaluationKind::Reading, .. }));
        let out = serde_json::to_value(ServerWsMessage::Evaluation {
            kind: EvaluationKind::Grammar,
            is_correct: true,
            feedback: "ok".into(),
        })
        .unwrap();
        assert_eq!(out["type"], "evaluation");
        assert_eq!(out["kind"], "grammar");
    }
}
