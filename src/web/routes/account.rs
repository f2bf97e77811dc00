use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};
use uuid::Uuid;

use crate::{
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, ValidJson, WebError,
        WebResult,
        dto::account::{AccountUpdateBody, SigninBody, SignupBody},
        middlewares::{self, AUTH_TOKEN},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(account_me_handler))
        .route("/verify", get(account_verify_handler))
        .route(
            "/{id}",
            put(account_update_handler).delete(account_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(account_signup_handler))
        .route("/signin", post(account_signin_handler))
        .route("/signout", post(account_signout_handler))
        .merge(protected)
        .with_state(state)
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let app = state.config().app();
    Cookie::build((AUTH_TOKEN, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(app.secure_cookies())
        .max_age(Duration::hours(app.token_ttl_hours()))
        .build()
}

fn issue_session(state: &AppState, cookies: &Cookies, user: &UserEntity) -> WebResult<()> {
    let app = state.config().app();
    let claims = UserClaims::for_user(user.id(), app.token_ttl_hours());
    let token = auth::generate_token(claims, app.jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    cookies.add(session_cookie(state, token));
    Ok(())
}

async fn ensure_unique(
    state: &AppState,
    actor: &AuthenticatedUser,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<Uuid>,
) -> WebResult<()> {
    let rt = UserEntity::get_resource_type;

    if let Some(username) = username {
        let found = UserEntity::find_by_username(state.pool(), actor, username)
            .await
            .map_err(|e| WebError::resource_fetch_error(rt(), e))?;
        if found.is_some_and(|u| Some(u.id()) != except) {
            return Err(WebError::registration_conflict());
        }
    }

    if let Some(email) = email {
        let found = UserEntity::find_by_email(state.pool(), actor, email)
            .await
            .map_err(|e| WebError::resource_fetch_error(rt(), e))?;
        if found.is_some_and(|u| Some(u.id()) != except) {
            return Err(WebError::registration_conflict());
        }
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = SignupBody,
    description = "Registers a new learner and signs them in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid username, email or password", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
async fn account_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidJson(payload): ValidJson<SignupBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate()?;

    let system = AuthenticatedUser::admin();
    let email = payload.email.trim().to_string();
    ensure_unique(
        &state,
        &system,
        Some(&payload.username),
        Some(&email),
        None,
    )
    .await?;

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let data = UserEntityCreateUpdate {
        username: payload.username,
        email,
        password_hash: hash,
    };

    // a concurrent signup can still hit the unique index
    let created = UserEntity::create(state.pool(), &system, data)
        .await
        .map_err(|e| match e {
            crate::model::DatabaseError::Conflict(_) => WebError::registration_conflict(),
            e => WebError::resource_fetch_error(UserEntity::get_resource_type(), e),
        })?;

    tracing::info!(user_id = %created.id(), "user registered");
    issue_session(&state, &cookies, &created)?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Signs a user in by username or email",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
async fn account_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidJson(payload): ValidJson<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let system = AuthenticatedUser::admin();
    let found = UserEntity::find_by_login(state.pool(), &system, payload.username.trim())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    issue_session(&state, &cookies, &found)?;
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Drops the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "account",
)]
async fn account_signout_handler(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(Cookie::build((AUTH_TOKEN, "")).path("/").build());
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    description = "Current user",
    responses(
        (status = 200, description = "Signed in user", body = UserEntity),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_required)?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/verify",
    description = "Checks whether the session cookie is valid",
    responses(
        (status = 200, description = "Session is valid"),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_verify_handler(ctx: RequestContext) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    Ok(StatusCode::OK)
}

async fn find_owned_user(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<UserEntity> {
    let rt = UserEntity::get_resource_type;
    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(rt(), e))?
        .ok_or_else(|| WebError::resource_not_found(rt()))?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::resource_error(rt(), e))?;

    Ok(found)
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = AccountUpdateBody,
    params(
        ("id" = Uuid, Path, description = "ID of the user to update")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't have enough permissions to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<AccountUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;

    let found = find_owned_user(&state, user, id).await?;

    let email = payload.email.as_deref().map(str::trim);
    ensure_unique(&state, user, payload.username.as_deref(), email, Some(id)).await?;

    let password_hash = match &payload.password {
        Some(password) => hash_password(password).map_err(WebError::server_crypt_error)?,
        None => found.hash().to_string(),
    };

    let data = UserEntityCreateUpdate {
        username: payload
            .username
            .clone()
            .unwrap_or_else(|| found.username().to_string()),
        email: email
            .map(str::to_string)
            .unwrap_or_else(|| found.email().to_string()),
        password_hash,
    };

    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(|e| match e {
            crate::model::DatabaseError::Conflict(_) => WebError::registration_conflict(),
            e => WebError::resource_fetch_error(UserEntity::get_resource_type(), e),
        })?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user and everything recorded for them",
    params(
        ("id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn account_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_owned_user(&state, user, id).await?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if id == user.user_id() {
        cookies.remove(Cookie::build((AUTH_TOKEN, "")).path("/").build());
    }

    Ok(StatusCode::OK)
}
