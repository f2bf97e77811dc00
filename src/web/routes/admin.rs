//! Content and user management. Every handler requires the admin role.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{
            EvaluationTest, EvaluationTestCreate, Lesson, LessonActivity, LessonActivityCreate,
            LessonCreate, UserEntity,
        },
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, ValidJson, WebError,
        WebResult,
        dto::admin::{ActivityBody, AdminUserUpdateBody, EvaluationTestBody, LessonBody},
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/users", get(admin_users_list_handler))
        .route(
            "/users/{id}",
            put(admin_users_update_handler).delete(admin_users_delete_handler),
        )
        .route(
            "/lessons",
            get(admin_lessons_list_handler).post(admin_lessons_create_handler),
        )
        .route(
            "/lessons/{id}",
            put(admin_lessons_update_handler).delete(admin_lessons_delete_handler),
        )
        .route(
            "/lessons/{id}/activities",
            post(admin_activities_create_handler),
        )
        .route(
            "/activities/{id}",
            put(admin_activities_update_handler).delete(admin_activities_delete_handler),
        )
        .route(
            "/evaluation",
            get(admin_evaluation_list_handler).post(admin_evaluation_create_handler),
        )
        .route(
            "/evaluation/{id}",
            put(admin_evaluation_update_handler).delete(admin_evaluation_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_lesson(state: &AppState, admin: &AuthenticatedUser, id: Uuid) -> WebResult<Lesson> {
    let rt = Lesson::get_resource_type;
    Lesson::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))
}

async fn find_activity(
    state: &AppState,
    admin: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<LessonActivity> {
    let rt = LessonActivity::get_resource_type;
    LessonActivity::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))
}

async fn find_test(
    state: &AppState,
    admin: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<EvaluationTest> {
    let rt = EvaluationTest::get_resource_type;
    EvaluationTest::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))
}

// Users

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_users_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;

    let users = UserEntity::page(state.pool(), admin, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}",
    request_body = AdminUserUpdateBody,
    params(
        ("id" = Uuid, Path, description = "ID of the user to change")
    ),
    responses(
        (status = 200, description = "User updated", body = UserEntity),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_users_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<AdminUserUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let role = payload.role()?;
    let rt = UserEntity::get_resource_type;

    let mut found = UserEntity::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))?;

    if let Some(role) = role {
        found = found
            .set_role(state.pool(), admin, role)
            .await
            .map_err(|e| WebError::resource_fetch_error(rt(), e))?;
    }
    if let Some(level) = payload.level {
        found = found
            .set_level(state.pool(), admin, Some(level))
            .await
            .map_err(|e| WebError::resource_fetch_error(rt(), e))?;
    }

    tracing::info!(admin_id = %admin.user_id(), user_id = %id, "user changed by admin");
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_users_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let rt = UserEntity::get_resource_type;

    let found = UserEntity::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))?;

    found
        .delete(state.pool(), admin)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?;

    Ok(StatusCode::OK)
}

// Lessons

#[utoipa::path(
    get,
    path = "/api/v1/admin/lessons",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Lesson>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_lessons_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;

    let lessons = Lesson::page(state.pool(), admin, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons",
    request_body = LessonBody,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Invalid lesson", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 409, description = "Lesson number already used in this level", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_lessons_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LessonBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let data = LessonCreate::try_from(payload)?;

    let created = Lesson::create(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::resource_error(Lesson::get_resource_type(), e))?;

    tracing::info!(lesson_id = %created.id(), "lesson created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/lessons/{id}",
    request_body = LessonBody,
    params(
        ("id" = Uuid, Path, description = "ID of the lesson to update")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 400, description = "Invalid lesson", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 409, description = "Lesson number already used in this level", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_lessons_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<LessonBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let data = LessonCreate::try_from(payload)?;
    let found = find_lesson(&state, admin, id).await?;

    let updated = found
        .update(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::resource_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/lessons/{id}",
    description = "Deletes a lesson with its activities and all progress on it",
    params(
        ("id" = Uuid, Path, description = "ID of the lesson to delete")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_lessons_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let found = find_lesson(&state, admin, id).await?;

    found
        .delete(state.pool(), admin)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

// Activities

#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons/{id}/activities",
    request_body = ActivityBody,
    params(
        ("id" = Uuid, Path, description = "ID of the lesson the activity belongs to")
    ),
    responses(
        (status = 201, description = "Activity created", body = LessonActivity),
        (status = 400, description = "Invalid activity", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_activities_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<ActivityBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let activity_type = payload.validate()?;
    let lesson = find_lesson(&state, admin, id).await?;

    let data = LessonActivityCreate {
        lesson_id: lesson.id(),
        activity_type,
        title: payload.title.trim().to_string(),
        content: payload.content,
        order_index: payload.order_index,
    };
    let created = LessonActivity::create(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::resource_error(LessonActivity::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/activities/{id}",
    request_body = ActivityBody,
    params(
        ("id" = Uuid, Path, description = "ID of the activity to update")
    ),
    responses(
        (status = 200, description = "Activity updated", body = LessonActivity),
        (status = 400, description = "Invalid activity", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_activities_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<ActivityBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let activity_type = payload.validate()?;
    let found = find_activity(&state, admin, id).await?;

    let data = LessonActivityCreate {
        lesson_id: found.lesson_id(),
        activity_type,
        title: payload.title.trim().to_string(),
        content: payload.content,
        order_index: payload.order_index,
    };
    let updated = found
        .update(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::resource_error(LessonActivity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/activities/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the activity to delete")
    ),
    responses(
        (status = 200, description = "Activity deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_activities_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let found = find_activity(&state, admin, id).await?;

    found
        .delete(state.pool(), admin)
        .await
        .map_err(|e| WebError::resource_fetch_error(LessonActivity::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

// Evaluation tests

#[utoipa::path(
    get,
    path = "/api/v1/admin/evaluation",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page, answers included", body = crate::model::Page<EvaluationTest>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_evaluation_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;

    let tests = EvaluationTest::page(state.pool(), admin, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(EvaluationTest::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(tests)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/evaluation",
    description = "Creates a placement test and makes it the active one",
    request_body = EvaluationTestBody,
    responses(
        (status = 201, description = "Test created and activated", body = EvaluationTest),
        (status = 400, description = "Invalid questions", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_evaluation_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<EvaluationTestBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let data = EvaluationTestCreate::try_from(payload)?;

    let created = EvaluationTest::create_active(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(EvaluationTest::get_resource_type(), e))?;

    tracing::info!(test_id = %created.id(), "evaluation test activated");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/evaluation/{id}",
    request_body = EvaluationTestBody,
    params(
        ("id" = Uuid, Path, description = "ID of the test to update")
    ),
    responses(
        (status = 200, description = "Test updated", body = EvaluationTest),
        (status = 400, description = "Invalid questions", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Test not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_evaluation_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<EvaluationTestBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let data = EvaluationTestCreate::try_from(payload)?;
    let found = find_test(&state, admin, id).await?;

    let updated = found
        .update(state.pool(), admin, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(EvaluationTest::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/evaluation/{id}",
    description = "Deletes a test together with its results",
    params(
        ("id" = Uuid, Path, description = "ID of the test to delete")
    ),
    responses(
        (status = 200, description = "Test deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Test not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_evaluation_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.require_admin()?;
    let found = find_test(&state, admin, id).await?;

    found
        .delete(state.pool(), admin)
        .await
        .map_err(|e| WebError::resource_fetch_error(EvaluationTest::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
