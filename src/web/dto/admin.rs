use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    learning::{
        ActivityType, CefrLevel,
        evaluation::{Question, parse_questions},
    },
    model::entity::{EvaluationTestCreate, LessonCreate},
    web::{UserRole, WebError, WebResult, validate},
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AdminUserUpdateBody {
    /// `user` or `admin`
    pub role: Option<String>,
    pub level: Option<CefrLevel>,
}

impl AdminUserUpdateBody {
    pub fn role(&self) -> WebResult<Option<UserRole>> {
        match self.role.as_deref() {
            None => Ok(None),
            Some("user") => Ok(Some(UserRole::User)),
            Some("admin") => Ok(Some(UserRole::Admin)),
            Some(_) => Err(WebError::bad_request("role must be `user` or `admin`")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonBody {
    pub level: String,
    pub lesson_number: i32,
    pub topic: String,
    pub title: String,
    pub description: Option<String>,
}

impl TryFrom<LessonBody> for LessonCreate {
    type Error = WebError;

    fn try_from(body: LessonBody) -> Result<Self, Self::Error> {
        let level: CefrLevel = body
            .level
            .parse()
            .map_err(|e: crate::learning::RuleError| WebError::bad_request(e.to_string()))?;
        validate::title("title", &body.title)?;
        validate::title("topic", &body.topic)?;
        if body.lesson_number < 1 {
            return Err(WebError::bad_request("lesson_number must be at least 1"));
        }

        Ok(LessonCreate {
            level,
            lesson_number: body.lesson_number,
            topic: body.topic.trim().to_string(),
            title: body.title.trim().to_string(),
            description: body.description,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActivityBody {
    pub activity_type: String,
    pub title: String,
    pub content: Value,
    pub order_index: Option<i32>,
}

impl ActivityBody {
    /// Checked activity type; title and content are checked too.
    pub fn validate(&self) -> WebResult<ActivityType> {
        let kind = self
            .activity_type
            .parse::<ActivityType>()
            .map_err(|e| WebError::bad_request(e.to_string()))?;
        validate::title("title", &self.title)?;
        validate::json_object("content", &self.content)?;
        if matches!(self.order_index, Some(i) if i < 0) {
            return Err(WebError::bad_request("order_index must not be negative"));
        }
        Ok(kind)
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EvaluationTestBody {
    pub title: String,
    pub description: Option<String>,
    /// List of questions, see `Question`
    pub questions: Value,
}

impl TryFrom<EvaluationTestBody> for EvaluationTestCreate {
    type Error = WebError;

    fn try_from(body: EvaluationTestBody) -> Result<Self, Self::Error> {
        validate::title("title", &body.title)?;
        let questions: Vec<Question> =
            parse_questions(&body.questions).map_err(|e| WebError::bad_request(e.to_string()))?;

        Ok(EvaluationTestCreate {
            title: body.title.trim().to_string(),
            description: body.description,
            questions,
        })
    }
}
