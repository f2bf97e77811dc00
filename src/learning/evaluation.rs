//! Placement test grading.
//!
//! A test is a list of [`Question`]s stored as JSON. Learners receive the
//! [`PublicQuestion`] view with the answers stripped, submit a map from
//! question id to answer, and get back a [`GradedTest`] with the CEFR band.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CefrLevel, RuleError};

pub const MAX_QUESTIONS: usize = 500;
pub const MAX_QUESTION_POINTS: i32 = 1000;

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default = "default_points")]
    pub points: i32,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String>, correct: usize },
    FillBlank { accepted: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PublicQuestion {
    pub id: String,
    pub prompt: String,
    pub points: i32,
    pub kind: PublicQuestionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicQuestionKind {
    MultipleChoice { options: Vec<String> },
    FillBlank,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        let kind = match &q.kind {
            QuestionKind::MultipleChoice { options, .. } => PublicQuestionKind::MultipleChoice {
                options: options.clone(),
            },
            QuestionKind::FillBlank { .. } => PublicQuestionKind::FillBlank,
        };

        Self {
            id: q.id.clone(),
            prompt: q.prompt.clone(),
            points: q.points,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionOutcome {
    pub id: String,
    pub correct: bool,
    pub points_awarded: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct GradedTest {
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub level: CefrLevel,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Parses the stored JSON and checks it with [`validate_questions`].
pub fn parse_questions(raw: &Value) -> Result<Vec<Question>, RuleError> {
    let questions: Vec<Question> = serde_json::from_value(raw.clone())
        .map_err(|e| RuleError::InvalidTest(e.to_string()))?;
    validate_questions(&questions)?;
    Ok(questions)
}

pub fn validate_questions(questions: &[Question]) -> Result<(), RuleError> {
    if questions.is_empty() {
        return Err(RuleError::InvalidTest("test has no questions".into()));
    }
    if questions.len() > MAX_QUESTIONS {
        return Err(RuleError::InvalidTest(format!(
            "test has more than {MAX_QUESTIONS} questions"
        )));
    }

    let mut seen = HashSet::new();
    for q in questions {
        let id = q.id.trim();
        if id.is_empty() {
            return Err(RuleError::InvalidTest("question id is empty".into()));
        }
        if !seen.insert(id) {
            return Err(RuleError::InvalidTest(format!("duplicate question id `{id}`")));
        }
        if !(1..=MAX_QUESTION_POINTS).contains(&q.points) {
            return Err(RuleError::InvalidTest(format!(
                "question `{id}` must be worth 1 to {MAX_QUESTION_POINTS} points"
            )));
        }

        match &q.kind {
            QuestionKind::MultipleChoice { options, correct } => {
                if options.len() < 2 {
                    return Err(RuleError::InvalidTest(format!(
                        "question `{id}` needs at least two options"
                    )));
                }
                if *correct >= options.len() {
                    return Err(RuleError::InvalidTest(format!(
                        "question `{id}` marks a missing option as correct"
                    )));
                }
            }
            QuestionKind::FillBlank { accepted } => {
                if accepted.iter().all(|a| normalize(a).is_empty()) {
                    return Err(RuleError::InvalidTest(format!(
                        "question `{id}` has no accepted answers"
                    )));
                }
            }
        }
    }

    Ok(())
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_correct(kind: &QuestionKind, answer: Option<&Value>) -> bool {
    let Some(answer) = answer else {
        return false;
    };

    match kind {
        QuestionKind::MultipleChoice { correct, .. } => {
            answer.as_u64() == Some(*correct as u64)
        }
        QuestionKind::FillBlank { accepted } => match answer.as_str() {
            Some(given) => {
                let given = normalize(given);
                !given.is_empty() && accepted.iter().any(|a| normalize(a) == given)
            }
            None => false,
        },
    }
}

/// Grades `answers` (question id to answer) against `questions`. Missing or
/// mistyped answers score zero; ids not in the test are ignored. The level
/// is banded on the exact percentage; the reported one is rounded to two
/// decimals.
pub fn grade(questions: &[Question], answers: &HashMap<String, Value>) -> GradedTest {
    let mut score: i32 = 0;
    let mut max_score: i32 = 0;
    let mut outcomes = Vec::with_capacity(questions.len());

    for q in questions {
        max_score = max_score.saturating_add(q.points);
        let correct = is_correct(&q.kind, answers.get(&q.id));
        let points_awarded = if correct { q.points } else { 0 };
        score = score.saturating_add(points_awarded);

        outcomes.push(QuestionOutcome {
            id: q.id.clone(),
            correct,
            points_awarded,
        });
    }

    let raw = if max_score > 0 {
        f64::from(score) * 100.0 / f64::from(max_score)
    } else {
        0.0
    };

    GradedTest {
        score,
        max_score,
        percentage: (raw * 100.0).round() / 100.0,
        level: CefrLevel::from_percentage(raw),
        outcomes,
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn sample() -> Vec<Question> {
        parse_questions(&json!([
            {
                "id": "q1",
                "prompt": "She ___ to school every day.",
                "kind": { "type": "multiple_choice", "options": ["go", "goes", "going"], "correct": 1 }
            },
            {
                "id": "q2",
                "prompt": "Past tense of `eat`",
                "points": 2,
                "kind": { "type": "fill_blank", "accepted": ["ate"] }
            },
            {
                "id": "q3",
                "prompt": "I have lived here ___ 2010.",
                "kind": { "type": "fill_blank", "accepted": ["since"] }
            }
        ]))
        .unwrap()
    }

    fn answers(v: Value) -> HashMap<String, Value> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn points_default_to_one() {
        let qs = sample();
        assert_eq!(qs[0].points, 1);
        assert_eq!(qs[1].points, 2);
    }

    #[test]
    fn all_correct_is_c2() {
        let graded = grade(&sample(), &answers(json!({"q1": 1, "q2": "ate", "q3": "since"})));
        assert_eq!(graded.score, 4);
        assert_eq!(graded.max_score, 4);
        assert_eq!(graded.percentage, 100.0);
        assert_eq!(graded.level, CefrLevel::C2);
        assert!(graded.outcomes.iter().all(|o| o.correct));
    }

    #[test]
    fn fill_blank_ignores_case_and_spacing() {
        let graded = grade(&sample(), &answers(json!({"q2": "  ATE ", "q3": "Since"})));
        assert_eq!(graded.score, 3);
        assert_eq!(graded.level, CefrLevel::C1);
    }

    #[test]
    fn missing_and_mistyped_answers_score_zero() {
        let graded = grade(&sample(), &answers(json!({"q1": "1", "q2": 7, "zzz": "ate"})));
        assert_eq!(graded.score, 0);
        assert_eq!(graded.level, CefrLevel::A1);
        assert_eq!(graded.outcomes.len(), 3);
    }

    #[test]
    fn percentage_is_rounded_to_two_decimals() {
        let graded = grade(&sample(), &answers(json!({"q3": "since"})));
        assert_eq!(graded.score, 1);
        assert_eq!(graded.percentage, 25.0);
        assert_eq!(graded.level, CefrLevel::A2);

        let mut qs = sample();
        qs.truncate(1);
        qs.push(Question {
            id: "x".into(),
            prompt: "x".into(),
            points: 2,
            kind: QuestionKind::FillBlank {
                accepted: vec!["x".into()],
            },
        });
        let graded = grade(&qs, &answers(json!({"q1": 1})));
        assert_eq!(graded.percentage, 33.33);
    }

    fn fill_blank(id: &str, points: i32) -> Question {
        Question {
            id: id.into(),
            prompt: "?".into(),
            points,
            kind: QuestionKind::FillBlank {
                accepted: vec!["yes".into()],
            },
        }
    }

    #[test]
    fn level_uses_unrounded_percentage() {
        // 4999 of 25000 is 19.996%: reported as 20.0 but banded A1
        let mut qs: Vec<Question> = (0..4).map(|i| fill_blank(&format!("hit{i}"), 1000)).collect();
        qs.push(fill_blank("hit4", 999));
        qs.extend((0..20).map(|i| fill_blank(&format!("miss{i}"), 1000)));
        qs.push(fill_blank("miss20", 1));
        validate_questions(&qs).unwrap();

        let given = answers(json!({
            "hit0": "yes", "hit1": "yes", "hit2": "yes", "hit3": "yes", "hit4": "yes"
        }));
        let graded = grade(&qs, &given);
        assert_eq!(graded.score, 4999);
        assert_eq!(graded.max_score, 25000);
        assert_eq!(graded.percentage, 20.0);
        assert_eq!(graded.level, CefrLevel::A1);
    }

    #[test]
    fn points_are_bounded() {
        let huge = vec![fill_blank("a", i32::MAX), fill_blank("b", i32::MAX)];
        assert!(validate_questions(&huge).is_err());
        assert!(validate_questions(&[fill_blank("a", MAX_QUESTION_POINTS)]).is_ok());
        assert!(validate_questions(&[fill_blank("a", MAX_QUESTION_POINTS + 1)]).is_err());

        let many: Vec<Question> = (0..=MAX_QUESTIONS).map(|i| fill_blank(&i.to_string(), 1)).collect();
        assert!(validate_questions(&many).is_err());

        // unvalidated input still grades without overflowing
        let graded = grade(&huge, &HashMap::new());
        assert_eq!(graded.max_score, i32::MAX);
        assert_eq!(graded.level, CefrLevel::A1);
    }

    #[test]
    fn public_view_strips_answers() {
        let public: Vec<PublicQuestion> = sample().iter().map(PublicQuestion::from).collect();
        let text = serde_json::to_string(&public).unwrap();
        assert!(!text.contains("correct"));
        assert!(!text.contains("accepted"));
        assert!(!text.contains("ate"));
        assert!(text.contains("goes"));
    }

    #[test]
    fn validation_rejects_broken_tests() {
        assert!(parse_questions(&json!([])).is_err());
        assert!(parse_questions(&json!({"not": "a list"})).is_err());
        assert!(
            parse_questions(&json!([
                {"id": "a", "prompt": "?", "kind": {"type": "multiple_choice", "options": ["x", "y"], "correct": 2}}
            ]))
            .is_err()
        );
        assert!(
            parse_questions(&json!([
                {"id": "a", "prompt": "?", "kind": {"type": "multiple_choice", "options": ["x"], "correct": 0}}
            ]))
            .is_err()
        );
        assert!(
            parse_questions(&json!([
                {"id": "a", "prompt": "?", "kind": {"type": "fill_blank", "accepted": ["  "]}}
            ]))
            .is_err()
        );
        assert!(
            parse_questions(&json!([
                {"id": "a", "prompt": "?", "kind": {"type": "fill_blank", "accepted": ["x"]}},
                {"id": "a", "prompt": "?", "kind": {"type": "fill_blank", "accepted": ["y"]}}
            ]))
            .is_err()
        );
        assert!(
            parse_questions(&json!([
                {"id": "a", "prompt": "?", "points": 0, "kind": {"type": "fill_blank", "accepted": ["x"]}}
            ]))
            .is_err()
        );
    }
}
