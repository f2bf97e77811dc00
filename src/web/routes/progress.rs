use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    learning::{xp_level, xp_to_next_level},
    model::{
        CrudRepository, ResourceTyped,
        entity::{EvaluationResult, Lesson, LessonActivityResult, UserEntity, UserProgress},
    },
    web::{
        AppState, ErrorResponse, RequestContext, WebError, WebResult,
        dto::progress::{EvaluationSummary, UserProgressResponse},
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(progress_get_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/progress/",
    description = "Dashboard summary of the current user's progress",
    responses(
        (status = 200, description = "Progress found", body = UserProgressResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
async fn progress_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    let (found, total_lessons, completed_lessons, total_stars, completed_activities, latest) =
        tokio::try_join!(
            UserEntity::find_by_id(mm, user, user.user_id()),
            Lesson::count(mm, user),
            UserProgress::count_completed(mm, user),
            UserProgress::total_stars(mm, user),
            LessonActivityResult::count_for_user(mm, user),
            EvaluationResult::find_latest(mm, user),
        )
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;

    let found = found.ok_or_else(WebError::auth_required)?;
    let streak = found.streak();

    let res = UserProgressResponse {
        username: found.username().to_string(),
        cefr_level: found.level().map(|l| l.to_string()),
        xp: found.xp(),
        xp_level: xp_level(found.xp()),
        xp_to_next_level: xp_to_next_level(found.xp()),
        current_streak: streak.current,
        longest_streak: streak.longest,
        total_lessons,
        completed_lessons,
        total_stars,
        completed_activities,
        latest_evaluation: latest.as_ref().map(EvaluationSummary::from),
    };

    Ok((StatusCode::OK, Json(res)))
}
