use crate::learning::ActivityType;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgExecutor;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One exercise inside a lesson. `content` is the widget payload (words,
/// sentences, options...) and is passed through to the client untouched.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonActivity {
    id: Uuid,
    lesson_id: Uuid,
    activity_type: String,
    title: String,
    content: Value,
    order_index: i32,
}

impl ResourceTyped for LessonActivity {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonActivity
    }
}

impl LessonActivity {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonActivityCreate {
    pub lesson_id: Uuid,
    pub activity_type: ActivityType,
    pub title: String,
    pub content: Value,
    pub order_index: Option<i32>,
}

impl LessonActivity {
    pub(crate) async fn insert<'e>(
        exec: impl PgExecutor<'e>,
        data: &LessonActivityCreate,
    ) -> DatabaseResult<Self> {
        // without an explicit position the activity goes last
        let activity = sqlx::query_as(
            r#"
            INSERT INTO lesson_activities (id, lesson_id, activity_type, title, content, order_index)
            VALUES (
                $1, $2, $3, $4, $5,
                COALESCE($6, (SELECT COALESCE(MAX(order_index) + 1, 0) FROM lesson_activities WHERE lesson_id = $2))
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.lesson_id)
        .bind(data.activity_type.as_str())
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.order_index)
        .fetch_one(exec)
        .await?;

        Ok(activity)
    }
}

#[async_trait]
impl CrudRepository<LessonActivity, LessonActivityCreate, uuid::Uuid> for LessonActivity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonActivityCreate,
    ) -> DatabaseResult<Self> {
        Self::insert(mm.executor(), &data).await
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonActivityCreate,
    ) -> DatabaseResult<Self> {
        let order_index = data.order_index.unwrap_or(self.order_index);
        sqlx::query(
            r#"
            UPDATE lesson_activities
            SET lesson_id = $1, activity_type = $2, title = $3, content = $4, order_index = $5
            WHERE id = $6
            "#,
        )
        .bind(data.lesson_id)
        .bind(data.activity_type.as_str())
        .bind(&data.title)
        .bind(&data.content)
        .bind(order_index)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.lesson_id = data.lesson_id;
        self.activity_type = data.activity_type.to_string();
        self.title = data.title;
        self.content = data.content;
        self.order_index = order_index;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lesson_activities WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lesson_activities WHERE id = $1")
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
            "SELECT * FROM lesson_activities ORDER BY lesson_id, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson_activities")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

// Utils
impl LessonActivity {
    pub async fn find_all_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT *
            FROM lesson_activities a
            WHERE a.lesson_id = $1
            ORDER BY a.order_index, a.title
            "#,
        )
        .bind(lesson_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
