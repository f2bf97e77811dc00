use crate::impl_paginatable_for;
use crate::learning::{CefrLevel, Unlockable};
use crate::model::DatabaseError;
use crate::model::entity::{LessonActivity, LessonActivityCreate};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    level: String,
    lesson_number: i32,
    topic: String,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn level(&self) -> Option<CefrLevel> {
        self.level.parse().ok()
    }

    pub fn lesson_number(&self) -> i32 {
        self.lesson_number
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub level: CefrLevel,
    pub lesson_number: i32,
    pub topic: String,
    pub title: String,
    pub description: Option<String>,
}

impl Lesson {
    async fn insert<'e>(exec: impl PgExecutor<'e>, data: &LessonCreate) -> DatabaseResult<Self> {
        let lesson = sqlx::query_as(
            r#"
            INSERT INTO lessons (id, level, lesson_number, topic, title, description)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.level.as_str())
        .bind(data.lesson_number)
        .bind(&data.topic)
        .bind(&data.title)
        .bind(data.description.as_deref().unwrap_or(""))
        .fetch_one(exec)
        .await
        .map_err(DatabaseError::from_write)?;

        Ok(lesson)
    }

    /// Creates the lesson together with its activities in one transaction.
    /// Each activity's `lesson_id` is replaced with the new lesson's id.
    pub async fn create_with_activities(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
        activities: Vec<LessonActivityCreate>,
    ) -> DatabaseResult<(Self, Vec<LessonActivity>)> {
        let mut tx = mm.executor().begin().await?;
        let lesson = Self::insert(&mut *tx, &data).await?;

        let mut created = Vec::with_capacity(activities.len());
        for mut activity in activities {
            activity.lesson_id = lesson.id;
            created.push(LessonActivity::insert(&mut *tx, &activity).await?);
        }

        tx.commit().await?;
        Ok((lesson, created))
    }
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, uuid::Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        Self::insert(mm.executor(), &data).await
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let description = data.description.unwrap_or_default();
        sqlx::query(
            r#"
            UPDATE lessons
            SET level = $1, lesson_number = $2, topic = $3, title = $4, description = $5
            WHERE id = $6
            "#,
        )
        .bind(data.level.as_str())
        .bind(data.lesson_number)
        .bind(&data.topic)
        .bind(&data.title)
        .bind(&description)
        .bind(self.id)
        .execute(mm.executor())
        .await
        .map_err(DatabaseError::from_write)?;

        self.level = data.level.to_string();
        self.lesson_number = data.lesson_number;
        self.topic = data.topic;
        self.title = data.title;
        self.description = description;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM lessons ORDER BY level, lesson_number LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Lesson, LessonCreate, Uuid);

impl Lesson {
    /// Next lesson in the same level, by number.
    pub async fn find_next(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT *
            FROM lessons
            WHERE level = $1 AND lesson_number > $2
            ORDER BY lesson_number ASC
            LIMIT 1
            "#,
        )
        .bind(&self.level)
        .bind(self.lesson_number)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonWithProgressRow {
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
    #[sqlx(skip)]
    pub unlocked: bool,
}

impl Unlockable for LessonWithProgressRow {
    fn level(&self) -> Option<CefrLevel> {
        self.level.parse().ok()
    }

    fn number(&self) -> i32 {
        self.lesson_number
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn set_unlocked(&mut self, unlocked: bool) {
        self.unlocked = unlocked;
    }
}

impl LessonWithProgressRow {
    /// Lesson catalogue for `actor`, optionally limited to one level, with
    /// unlock flags applied.
    pub async fn fetch_all(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        level: Option<CefrLevel>,
    ) -> DatabaseResult<Vec<Self>> {
        let mut rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT
                l.id,
                l.level,
                l.lesson_number,
                l.topic,
                l.title,
                l.description,
                (SELECT COUNT(*) FROM lesson_activities a WHERE a.lesson_id = l.id) AS activity_count,
                COALESCE(up.completed, FALSE) AS completed,
                up.score,
                up.stars
            FROM lessons l
            LEFT JOIN user_progress up
                ON up.lesson_id = l.id
                AND up.user_id = $1
            WHERE ($2::TEXT IS NULL OR l.level = $2)
            ORDER BY l.level, l.lesson_number
            "#,
        )
        .bind(actor.user_id())
        .bind(level.map(|l| l.to_string()))
        .fetch_all(mm.executor())
        .await?;

        crate::learning::mark_unlocked(&mut rows);
        Ok(rows)
    }
}

/// Aggregate of a user's activity results over one lesson.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LessonScoreRow {
    pub total_activities: i64,
    pub finished_activities: i64,
    pub score: i64,
    pub max_score: i64,
}

impl LessonScoreRow {
    pub async fn fetch(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            SELECT
                COUNT(a.id) AS total_activities,
                COUNT(r.id) AS finished_activities,
                COALESCE(SUM(r.score), 0)::BIGINT AS score,
                COALESCE(SUM(r.max_score), 0)::BIGINT AS max_score
            FROM lesson_activities a
            LEFT JOIN lesson_activity_results r
                ON r.activity_id = a.id
                AND r.user_id = $2
            WHERE a.lesson_id = $1
            "#,
        )
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub fn is_complete(&self) -> bool {
        self.total_activities > 0 && self.finished_activities == self.total_activities
    }
}
