use crate::learning::{Streak, xp_gain};
use crate::model::entity::UserEntity;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserProgress {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    score: i32,
    stars: i32,
    completed: bool,
    attempts: i32,
    completed_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for UserProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::UserProgress
    }
}

impl UserProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    /// Best percentage over all completions.
    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn stars(&self) -> i32 {
        self.stars
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn attempts(&self) -> i32 {
        self.attempts
    }
}

pub struct LessonCompletion {
    pub progress: UserProgress,
    pub xp_awarded: i32,
    pub streak: Streak,
    /// XP total after the award.
    pub xp: i32,
}

pub struct UserProgressCreate {
    lesson_id: Uuid,
    score: i32,
    stars: i32,
}

impl UserProgressCreate {
    pub fn new(lesson_id: Uuid, score: i32, stars: i32) -> Self {
        Self {
            lesson_id,
            score,
            stars,
        }
    }
}

impl UserProgress {
    /// Marks the lesson completed for `actor`, keeping the best score and
    /// stars seen so far, and pays the XP improvement over the previous
    /// best. The user row is locked first, so concurrent completions of the
    /// same user are applied one after another.
    pub async fn complete(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: UserProgressCreate,
        today: NaiveDate,
    ) -> DatabaseResult<LessonCompletion> {
        let mut tx = mm.executor().begin().await?;
        UserEntity::lock(&mut *tx, actor.user_id()).await?;

        let previous: Option<i32> = sqlx::query_scalar(
            "SELECT stars FROM user_progress WHERE user_id = $1 AND lesson_id = $2",
        )
        .bind(actor.user_id())
        .bind(data.lesson_id)
        .fetch_optional(&mut *tx)
        .await?;
        let xp_awarded = xp_gain(previous, data.stars);

        let progress = sqlx::query_as(
            r#"
            INSERT INTO user_progress AS up
                (id, user_id, lesson_id, score, stars, completed, attempts, completed_at)
            VALUES ($1,$2,$3,$4,$5,TRUE,1,now())
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                score = GREATEST(up.score, EXCLUDED.score),
                stars = GREATEST(up.stars, EXCLUDED.stars),
                completed = TRUE,
                attempts = up.attempts + 1,
                completed_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.lesson_id)
        .bind(data.score)
        .bind(data.stars)
        .fetch_one(&mut *tx)
        .await?;

        let (streak, xp) =
            UserEntity::apply_activity(&mut *tx, actor.user_id(), today, xp_awarded).await?;
        tx.commit().await?;

        Ok(LessonCompletion {
            progress,
            xp_awarded,
            streak,
            xp,
        })
    }

    pub async fn find_for_lesson(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM user_progress WHERE user_id = $1 AND lesson_id = $2")
            .bind(actor.user_id())
            .bind(lesson_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn count_completed(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_progress WHERE user_id = $1 AND completed = TRUE",
        )
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn total_stars(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(stars), 0)::BIGINT FROM user_progress WHERE user_id = $1",
        )
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
