use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonActivityResult {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    activity_id: Uuid,
    score: i32,
    max_score: i32,
    attempts: i32,
    answers: Value,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for LessonActivityResult {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ActivityResult
    }
}

impl LessonActivityResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn activity_id(&self) -> Uuid {
        self.activity_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    pub fn attempts(&self) -> i32 {
        self.attempts
    }

    pub fn completed_at(&self) -> &DateTime<Utc> {
        &self.completed_at
    }
}

pub struct LessonActivityResultCreate {
    pub lesson_id: Uuid,
    pub activity_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub answers: Value,
}

#[derive(FromRow)]
struct UpsertedRow {
    #[sqlx(flatten)]
    result: LessonActivityResult,
    inserted: bool,
}

impl LessonActivityResult {
    /// Records an attempt of `actor` at an activity.
    ///
    /// One row per (user, activity): a repeated submission bumps `attempts`,
    /// replaces the answers and keeps whichever score pair has the better
    /// ratio. The returned flag is `true` when this was the first attempt.
    pub async fn upsert(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: LessonActivityResultCreate,
    ) -> DatabaseResult<(Self, bool)> {
        let row: UpsertedRow = sqlx::query_as(
            r#"
            INSERT INTO lesson_activity_results AS r
                (id, user_id, lesson_id, activity_id, score, max_score, answers)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            ON CONFLICT (user_id, activity_id) DO UPDATE SET
                score = CASE
                    WHEN EXCLUDED.score::FLOAT8 / EXCLUDED.max_score >= r.score::FLOAT8 / r.max_score
                    THEN EXCLUDED.score ELSE r.score END,
                max_score = CASE
                    WHEN EXCLUDED.score::FLOAT8 / EXCLUDED.max_score >= r.score::FLOAT8 / r.max_score
                    THEN EXCLUDED.max_score ELSE r.max_score END,
                attempts = r.attempts + 1,
                answers = EXCLUDED.answers,
                completed_at = now()
            RETURNING r.*, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.lesson_id)
        .bind(data.activity_id)
        .bind(data.score)
        .bind(data.max_score)
        .bind(&data.answers)
        .fetch_one(mm.executor())
        .await?;

        Ok((row.result, row.inserted))
    }

    pub async fn find_all_by_lesson(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM lesson_activity_results WHERE lesson_id = $1 AND user_id = $2",
        )
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn count_for_user(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lesson_activity_results WHERE user_id = $1")
                .bind(actor.user_id())
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }
}
