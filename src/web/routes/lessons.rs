use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::{Router, extract::State, middleware, response::IntoResponse, routing::get};
use chrono::Utc;
use uuid::Uuid;

use crate::learning::{CefrLevel, activity_xp, stars_for, total_percentage};
use crate::model::entity::{
    Lesson, LessonActivity, LessonActivityResult, LessonActivityResultCreate, LessonScoreRow,
    LessonWithProgressRow, UserEntity, UserProgress, UserProgressCreate,
};
use crate::model::{CrudRepository, ResourceType, ResourceTyped};
use crate::web::dto::lessons::{
    ActivityResultBody, ActivityResultResponse, LessonCompleteResponse, LessonDetailResponse,
    LessonListQuery, LessonSummaryResponse,
};
use crate::web::{
    AppState, ErrorResponse, RequestContext, ValidJson, WebError, WebResult, middlewares,
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(lessons_list_handler))
        .route("/{id}", get(lessons_get_handler))
        .route(
            "/{id}/activities/{activity_id}/result",
            post(lessons_activity_result_handler),
        )
        .route("/{id}/complete", post(lessons_complete_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/",
    description = "Lesson catalogue with the caller's progress and unlock state",
    params(LessonListQuery),
    responses(
        (status = 200, description = "Lessons ordered by level and number", body = Vec<LessonSummaryResponse>),
        (status = 400, description = "Unknown CEFR level", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
async fn lessons_list_handler(
    State(state): State<AppState>,
    Query(query): Query<LessonListQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let level = query
        .level
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .map(str::parse::<CefrLevel>)
        .transpose()
        .map_err(|e| WebError::bad_request(e.to_string()))?;

    let lessons: Vec<LessonSummaryResponse> =
        LessonWithProgressRow::fetch_all(state.pool(), user, level)
            .await
            .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
            .into_iter()
            .map(LessonSummaryResponse::from)
            .collect();

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}",
    description = "Lesson with its ordered activities and the caller's results",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonDetailResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    let (activities, results, progress) = tokio::try_join!(
        LessonActivity::find_all_by_lesson(state.pool(), user, id),
        LessonActivityResult::find_all_by_lesson(state.pool(), user, id),
        UserProgress::find_for_lesson(state.pool(), user, id),
    )
    .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let res = LessonDetailResponse::from_entities(lesson, activities, results, progress);
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/activities/{activity_id}/result",
    description = "Records an attempt at an activity",
    request_body = ActivityResultBody,
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson"),
        ("activity_id" = Uuid, Path, description = "ID of the activity within the lesson")
    ),
    responses(
        (status = 200, description = "Result stored", body = ActivityResultResponse),
        (status = 400, description = "Invalid score", body = ErrorResponse),
        (status = 404, description = "Activity not found in this lesson", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
async fn lessons_activity_result_handler(
    State(state): State<AppState>,
    Path((id, activity_id)): Path<(Uuid, Uuid)>,
    ctx: RequestContext,
    ValidJson(payload): ValidJson<ActivityResultBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;

    let rt = LessonActivity::get_resource_type;
    let activity = LessonActivity::find_by_id(state.pool(), user, activity_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .filter(|a| a.lesson_id() == id)
        .ok_or_else(|| WebError::resource_not_found(rt()))?;

    let data = LessonActivityResultCreate {
        lesson_id: id,
        activity_id: activity.id(),
        score: payload.score,
        max_score: payload.max_score,
        answers: payload.answers.unwrap_or(serde_json::Value::Null),
    };
    let (result, first_attempt) = LessonActivityResult::upsert(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_error(ResourceType::ActivityResult, e))?;

    let xp_awarded = if first_attempt {
        activity_xp(payload.score, payload.max_score)
    } else {
        0
    };
    let (streak, xp) = UserEntity::record_activity(state.pool(), user, Utc::now().date_naive(), xp_awarded)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    tracing::debug!(
        user_id = %user.user_id(),
        activity_id = %activity_id,
        first_attempt,
        xp_awarded,
        "activity result recorded"
    );

    let res = ActivityResultResponse {
        result,
        first_attempt,
        xp_awarded,
        xp,
        streak,
    };
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/complete",
    description = "Completes a lesson once every activity has a result",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to complete")
    ),
    responses(
        (status = 200, description = "Lesson completed", body = LessonCompleteResponse),
        (status = 400, description = "Lesson has no activities or some are unfinished", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
async fn lessons_complete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    let totals = LessonScoreRow::fetch(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::UserProgress, e))?;

    if totals.total_activities == 0 {
        return Err(WebError::bad_request("lesson has no activities"));
    }
    if !totals.is_complete() {
        return Err(WebError::bad_request(format!(
            "{} of {} activities finished",
            totals.finished_activities, totals.total_activities
        )));
    }

    let pct = total_percentage(totals.score, totals.max_score);
    let stars = stars_for(pct);

    let done = UserProgress::complete(
        state.pool(),
        user,
        UserProgressCreate::new(id, pct, stars),
        Utc::now().date_naive(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(ResourceType::UserProgress, e))?;

    let next = lesson
        .find_next(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    tracing::info!(
        user_id = %user.user_id(),
        lesson_id = %id,
        pct,
        stars,
        xp_awarded = done.xp_awarded,
        "lesson completed"
    );

    let res = LessonCompleteResponse {
        lesson_id: id,
        percentage: pct,
        stars,
        best_score: done.progress.score(),
        best_stars: done.progress.stars(),
        xp_awarded: done.xp_awarded,
        xp: done.xp,
        streak: done.streak,
        next_lesson_id: next.map(|l| l.id()),
    };
    Ok((StatusCode::OK, Json(res)))
}
