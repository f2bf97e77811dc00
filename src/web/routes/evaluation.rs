use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::{
    learning::evaluation,
    model::{
        CrudRepository, ResourceTyped,
        entity::{EvaluationResult, EvaluationResultCreate, EvaluationTest},
    },
    web::{
        AppState, ErrorResponse, RequestContext, ValidJson, WebError, WebResult,
        dto::evaluation::{
            EvaluationResultResponse, EvaluationSubmitBody, EvaluationSubmitResponse,
            EvaluationTestResponse,
        },
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/test", get(evaluation_test_handler))
        .route("/submit", post(evaluation_submit_handler))
        .route("/result", get(evaluation_result_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/evaluation/test",
    description = "Active placement test, without answers",
    responses(
        (status = 200, description = "Active test", body = EvaluationTestResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No active test", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "evaluation",
    security(
        ("cookie" = [])
    )
)]
async fn evaluation_test_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rt = EvaluationTest::get_resource_type;

    let test = EvaluationTest::find_active(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))?;
    let questions = test
        .questions()
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?;

    Ok((
        StatusCode::OK,
        Json(EvaluationTestResponse::from_entity(&test, &questions)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/evaluation/submit",
    description = "Grades a placement test and sets the caller's CEFR level",
    request_body = EvaluationSubmitBody,
    responses(
        (status = 200, description = "Test graded", body = EvaluationSubmitResponse),
        (status = 400, description = "Test is not active", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Test not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "evaluation",
    security(
        ("cookie" = [])
    )
)]
async fn evaluation_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<EvaluationSubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rt = EvaluationTest::get_resource_type;

    let test = EvaluationTest::find_by_id(state.pool(), user, payload.test_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))?;

    if !test.is_active() {
        return Err(WebError::bad_request("evaluation test is not active"));
    }

    let questions = test
        .questions()
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?;
    let graded = evaluation::grade(&questions, &payload.answers);

    let answers = serde_json::to_value(&payload.answers)
        .map_err(|e| WebError::resource_fetch_error(rt(), e.into()))?;
    let result = EvaluationResult::record(
        state.pool(),
        user,
        EvaluationResultCreate {
            test_id: test.id(),
            graded: &graded,
            answers,
        },
        Utc::now().date_naive(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(EvaluationResult::get_resource_type(), e))?;

    tracing::info!(
        user_id = %user.user_id(),
        test_id = %test.id(),
        percentage = graded.percentage,
        level = %graded.level,
        "evaluation graded"
    );

    Ok((
        StatusCode::OK,
        Json(EvaluationSubmitResponse::new(&result, graded)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/evaluation/result",
    description = "Caller's latest evaluation result",
    responses(
        (status = 200, description = "Latest result", body = EvaluationResultResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No result yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "evaluation",
    security(
        ("cookie" = [])
    )
)]
async fn evaluation_result_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rt = EvaluationResult::get_resource_type;

    let result = EvaluationResult::find_latest(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))?;

    Ok((StatusCode::OK, Json(EvaluationResultResponse::from(result))))
}
