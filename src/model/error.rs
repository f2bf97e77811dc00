use thiserror::Error;

use crate::learning::RuleError;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("stored data breaks a rule: {0}")]
    RuleError(#[from] RuleError),
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("unique constraint violated: {0}")]
    Conflict(String),
}

impl DatabaseError {
    /// Turns unique violations into [`DatabaseError::Conflict`], everything
    /// else into [`DatabaseError::SqlxError`].
    pub fn from_write(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.constraint().unwrap_or("unknown").to_string())
            }
            _ => Self::SqlxError(e),
        }
    }
}
