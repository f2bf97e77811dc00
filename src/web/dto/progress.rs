use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::EvaluationResult;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EvaluationSummary {
    pub id: Uuid,
    pub percentage: f64,
    pub cefr_level: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&EvaluationResult> for EvaluationSummary {
    fn from(r: &EvaluationResult) -> Self {
        Self {
            id: r.id(),
            percentage: r.percentage(),
            cefr_level: r.cefr_level().map(|l| l.to_string()),
            created_at: *r.created_at(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserProgressResponse {
    pub username: String,
    pub cefr_level: Option<String>,
    pub xp: i32,
    pub xp_level: i32,
    pub xp_to_next_level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub total_stars: i64,
    pub completed_activities: i64,
    pub latest_evaluation: Option<EvaluationSummary>,
}
