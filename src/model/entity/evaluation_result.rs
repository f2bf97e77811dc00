use crate::learning::{CefrLevel, evaluation::GradedTest};
use crate::model::entity::UserEntity;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct EvaluationResult {
    id: Uuid,
    user_id: Uuid,
    test_id: Uuid,
    score: i32,
    max_score: i32,
    percentage: f64,
    cefr_level: String,
    answers: Value,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for EvaluationResult {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::EvaluationResult
    }
}

impl EvaluationResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn test_id(&self) -> Uuid {
        self.test_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn cefr_level(&self) -> Option<CefrLevel> {
        self.cefr_level.parse().ok()
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

pub struct EvaluationResultCreate<'a> {
    pub test_id: Uuid,
    pub graded: &'a GradedTest,
    pub answers: Value,
}

impl EvaluationResult {
    /// Stores a graded submission, sets the user's level from it and counts
    /// it toward the streak, all in one transaction.
    pub async fn record(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: EvaluationResultCreate<'_>,
        today: NaiveDate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        let row = sqlx::query_as(
            r#"
            INSERT INTO evaluation_results
                (id, user_id, test_id, score, max_score, percentage, cefr_level, answers)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.test_id)
        .bind(data.graded.score)
        .bind(data.graded.max_score)
        .bind(data.graded.percentage)
        .bind(data.graded.level.as_str())
        .bind(&data.answers)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET level = $1 WHERE id = $2")
            .bind(data.graded.level.as_str())
            .bind(actor.user_id())
            .execute(&mut *tx)
            .await?;

        UserEntity::apply_activity(&mut *tx, actor.user_id(), today, 0).await?;
        tx.commit().await?;

        Ok(row)
    }

    pub async fn find_latest(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT *
            FROM evaluation_results
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }
}
