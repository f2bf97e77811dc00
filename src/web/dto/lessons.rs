use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    learning::Streak,
    model::entity::{
        Lesson, LessonActivity, LessonActivityResult, LessonWithProgressRow, UserProgress,
    },
    web::{WebResult, validate},
};

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LessonListQuery {
    /// CEFR level to filter by, e.g. `B1`
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonSummaryResponse {
    pub id: Uuid,
    pub level: String,
    pub lesson_number: i32,
    pub topic: String,
    pub title: String,
    pub description: String,
    pub activity_count: i64,
    pub completed: bool,
    pub score: Option<i32>,
    pub stars: Option<i32>,
    pub unlocked: bool,
}

impl From<LessonWithProgressRow> for LessonSummaryResponse {
    fn from(row: LessonWithProgressRow) -> Self {
        Self {
            id: row.id,
            level: row.level,
            lesson_number: row.lesson_number,
            topic: row.topic,
            title: row.title,
            description: row.description,
            activity_count: row.activity_count,
            completed: row.completed,
            score: row.score,
            stars: row.stars,
            unlocked: row.unlocked,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActivityResultShort {
    pub score: i32,
    pub max_score: i32,
    pub attempts: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub activity_type: String,
    pub title: String,
    pub content: Value,
    pub order_index: i32,
    pub result: Option<ActivityResultShort>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonProgressShort {
    pub score: i32,
    pub stars: i32,
    pub completed: bool,
    pub attempts: i32,
}

impl From<&UserProgress> for LessonProgressShort {
    fn from(p: &UserProgress) -> Self {
        Self {
            score: p.score(),
            stars: p.stars(),
            completed: p.completed(),
            attempts: p.attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonDetailResponse {
    pub id: Uuid,
    pub level: String,
    pub lesson_number: i32,
    pub topic: String,
    pub title: String,
    pub description: String,
    pub activities: Vec<ActivityResponse>,
    pub progress: Option<LessonProgressShort>,
}

impl LessonDetailResponse {
    pub fn from_entities(
        lesson: Lesson,
        activities: Vec<LessonActivity>,
        results: Vec<LessonActivityResult>,
        progress: Option<UserProgress>,
    ) -> Self {
        let activities = activities
            .into_iter()
            .map(|a| {
                let result = results
                    .iter()
                    .find(|r| r.activity_id() == a.id())
                    .map(|r| ActivityResultShort {
                        score: r.score(),
                        max_score: r.max_score(),
                        attempts: r.attempts(),
                    });

                ActivityResponse {
                    id: a.id(),
                    activity_type: a.activity_type().to_string(),
                    title: a.title().to_string(),
                    content: a.content().clone(),
                    order_index: a.order_index(),
                    result,
                }
            })
            .collect();

        Self {
            id: lesson.id(),
            level: lesson
                .level()
                .map(|l| l.to_string())
                .unwrap_or_default(),
            lesson_number: lesson.lesson_number(),
            topic: lesson.topic().to_string(),
            title: lesson.title().to_string(),
            description: lesson.description().to_string(),
            activities,
            progress: progress.as_ref().map(LessonProgressShort::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActivityResultBody {
    pub score: i32,
    pub max_score: i32,
    /// Raw answers as the client recorded them, stored for review
    pub answers: Option<Value>,
}

impl ActivityResultBody {
    pub fn validate(&self) -> WebResult<()> {
        validate::score(self.score, self.max_score)
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ActivityResultResponse {
    pub result: LessonActivityResult,
    pub first_attempt: bool,
    pub xp_awarded: i32,
    pub xp: i32,
    pub streak: Streak,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LessonCompleteResponse {
    pub lesson_id: Uuid,
    pub percentage: i32,
    pub stars: i32,
    pub best_score: i32,
    pub best_stars: i32,
    pub xp_awarded: i32,
    pub xp: i32,
    pub streak: Streak,
    pub next_lesson_id: Option<Uuid>,
}
