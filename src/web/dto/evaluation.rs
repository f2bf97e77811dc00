use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    learning::{
        CefrLevel,
        evaluation::{GradedTest, PublicQuestion, Question, QuestionOutcome},
    },
    model::entity::{EvaluationResult, EvaluationTest},
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EvaluationTestResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
}

impl EvaluationTestResponse {
    pub fn from_entity(test: &EvaluationTest, questions: &[Question]) -> Self {
        Self {
            id: test.id(),
            title: test.title().to_string(),
            description: test.description().to_string(),
            questions: questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EvaluationSubmitBody {
    pub test_id: Uuid,
    /// Question id to answer: option index for multiple choice, text for
    /// fill in the blank
    pub answers: HashMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EvaluationSubmitResponse {
    pub result_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub cefr_level: CefrLevel,
    pub outcomes: Vec<QuestionOutcome>,
}

impl EvaluationSubmitResponse {
    pub fn new(result: &EvaluationResult, graded: GradedTest) -> Self {
        Self {
            result_id: result.id(),
            score: graded.score,
            max_score: graded.max_score,
            percentage: graded.percentage,
            cefr_level: graded.level,
            outcomes: graded.outcomes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EvaluationResultResponse {
    pub id: Uuid,
    pub test_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub cefr_level: Option<CefrLevel>,
    pub created_at: DateTime<Utc>,
}

impl From<EvaluationResult> for EvaluationResultResponse {
    fn from(r: EvaluationResult) -> Self {
        Self {
            id: r.id(),
            test_id: r.test_id(),
            score: r.score(),
            max_score: r.max_score(),
            percentage: r.percentage(),
            cefr_level: r.cefr_level(),
            created_at: *r.created_at(),
        }
    }
}
