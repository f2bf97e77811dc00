use crate::impl_paginatable_for;
use crate::learning::{CefrLevel, Streak, next_streak};
use crate::model::DatabaseError;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: uuid::Uuid,
    username: String,
    email: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
    level: Option<String>,
    xp: i32,
    current_streak: i32,
    longest_streak: i32,
    last_activity_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserEntityCreateUpdate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    /// `None` until the user has taken a placement test or an admin set it.
    pub fn level(&self) -> Option<CefrLevel> {
        self.level.as_deref().and_then(|l| l.parse().ok())
    }

    pub fn xp(&self) -> i32 {
        self.xp
    }

    pub fn streak(&self) -> Streak {
        Streak {
            current: self.current_streak,
            longest: self.longest_streak,
            last_activity: self.last_activity_date,
        }
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, uuid::Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let role = UserRole::User.to_string();
        let user = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&role)
        .fetch_one(mm.executor())
        .await
        .map_err(DatabaseError::from_write)?;

        Ok(user)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET username = $1, email = $2, password_hash = $3 WHERE id = $4")
            .bind(&data.username)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(DatabaseError::from_write)?;

        self.username = data.username;
        self.email = data.email;
        self.password_hash = data.password_hash;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at, username LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for UserEntity {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_email(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Sign-in accepts either the username or the email address.
    pub async fn find_by_login(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        login: &str,
    ) -> DatabaseResult<Option<Self>> {
        if login.contains('@') {
            Self::find_by_email(mm, actor, login).await
        } else {
            Self::find_by_username(mm, actor, login).await
        }
    }

    pub async fn set_role(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        role: UserRole,
    ) -> DatabaseResult<Self> {
        let role = role.to_string();
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(&role)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.role = role;
        Ok(self)
    }

    pub async fn set_level(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        level: Option<CefrLevel>,
    ) -> DatabaseResult<Self> {
        let level = level.map(|l| l.to_string());
        sqlx::query("UPDATE users SET level = $1 WHERE id = $2")
            .bind(&level)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.level = level;
        Ok(self)
    }

    /// Applies the daily streak rule for `today` and adds `xp`. The row is
    /// locked for the read-modify-write so concurrent submissions of the
    /// same user serialize. Returns the new streak and XP total.
    pub async fn record_activity(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        today: NaiveDate,
        xp: i32,
    ) -> DatabaseResult<(Streak, i32)> {
        let mut tx = mm.executor().begin().await?;
        let res = Self::apply_activity(&mut *tx, actor.user_id(), today, xp).await?;
        tx.commit().await?;
        Ok(res)
    }

    /// Locks the user row until the surrounding transaction ends.
    pub(crate) async fn lock(conn: &mut PgConnection, user_id: Uuid) -> DatabaseResult<()> {
        sqlx::query("SELECT 1 FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(())
    }

    /// [`Self::record_activity`] inside a caller's transaction.
    pub(crate) async fn apply_activity(
        conn: &mut PgConnection,
        user_id: Uuid,
        today: NaiveDate,
        xp: i32,
    ) -> DatabaseResult<(Streak, i32)> {
        let (current, longest, last_activity, total_xp): (i32, i32, Option<NaiveDate>, i32) =
            sqlx::query_as(
                r#"
                SELECT current_streak, longest_streak, last_activity_date, xp
                FROM users
                WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        let streak = next_streak(
            Streak {
                current,
                longest,
                last_activity,
            },
            today,
        );
        let total_xp = total_xp.saturating_add(xp.max(0));

        sqlx::query(
            r#"
            UPDATE users
            SET current_streak = $1, longest_streak = $2, last_activity_date = $3, xp = $4
            WHERE id = $5
            "#,
        )
        .bind(streak.current)
        .bind(streak.longest)
        .bind(streak.last_activity)
        .bind(total_xp)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        Ok((streak, total_xp))
    }
}
