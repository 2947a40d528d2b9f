use crate::{
    AppState,
    db::UserExt,
    dtos::{
        CreateUserDto, ListResponseDto, PageQueryDto, PaginationDto, UpdateMeDto, UpdateUserDto,
        UserDto, UserResponseDto, check_username,
    },
    error::{ErrorMessage, HttpError, from_sqlx},
    models::UserRole,
    middleware::JWTAuthMiddleware,
    policy::{self, Action, Resource},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use validator::Validate;

/// Router for user administration and self-service.
///
/// The whole subtree sits behind the auth middleware (applied at the nest in
/// routes.rs); admin-only operations are enforced by the policy table per
/// handler. `/me` is registered before the username capture so the reserved
/// path wins.
pub fn users_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/me", get(get_me).patch(update_me))
        .route(
            "/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Paginated user list (admin only), `?search=` filters by username
/// substring.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_users(
    Query(query): Query<PageQueryDto>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Read, Resource::User, false)?;

    query.validate().map_err(|e| {
        tracing::error!("Invalid get_users input: {}", e);
        HttpError::validation(e)
    })?;

    let (page, limit) = (query.page(), query.limit());

    let users = app_state
        .db_client
        .get_users(query.search.as_deref(), page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting users: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_user_count(query.search.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("get_users successful");
    Ok(Json(ListResponseDto {
        status: "success".to_string(),
        data: UserDto::filter_users(&users),
        pagination: PaginationDto::new(page, limit, total),
    }))
}

/// Create a user with the full field set, role included (admin only).
/// No confirmation flow: an admin-created user obtains a code via signup.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_user(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Create, Resource::User, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid create_user input: {}", e);
        HttpError::validation(e)
    })?;
    check_username(&body.username)?;

    let user = app_state
        .db_client
        .save_user(
            &body.username,
            &body.email,
            body.first_name.as_deref(),
            body.last_name.as_deref(),
            body.bio.as_deref(),
            body.role.unwrap_or(UserRole::User),
        )
        .await
        .map_err(from_sqlx)?;

    tracing::info!(new_user = %user.username, "create_user successful");
    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserDto::filter_user(&user),
        }),
    ))
}

/// Retrieve one user by username (admin only).
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_user(
    Path(username): Path<String>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Read, Resource::User, false)?;

    let user = app_state
        .db_client
        .get_user(None, Some(&username), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserDto::filter_user(&user),
    }))
}

/// Partial update of any user, role included (admin only).
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn update_user(
    Path(username): Path<String>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Update, Resource::User, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user input: {}", e);
        HttpError::validation(e)
    })?;
    if let Some(new_username) = &body.username {
        check_username(new_username)?;
    }

    let user = app_state
        .db_client
        .get_user(None, Some(&username), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    let updated = app_state
        .db_client
        .update_user(
            user.id,
            body.username.as_deref(),
            body.email.as_deref(),
            body.first_name.as_deref(),
            body.last_name.as_deref(),
            body.bio.as_deref(),
            body.role,
        )
        .await
        .map_err(from_sqlx)?;

    tracing::info!(target_user = %updated.username, "update_user successful");
    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserDto::filter_user(&updated),
    }))
}

/// Delete a user by username (admin only); their reviews and comments
/// cascade.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_user(
    Path(username): Path<String>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Delete, Resource::User, false)?;

    app_state
        .db_client
        .delete_user(&username)
        .await
        .map_err(from_sqlx)?;

    tracing::info!(target_user = %username, "delete_user successful");
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own profile, whatever their role.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_me(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    // Re-read the row so the response reflects concurrent admin edits.
    let user = app_state
        .db_client
        .get_user(Some(jwt.user.id), None, None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserDto::filter_user(&user),
    }))
}

/// Self-service partial update. The DTO has no role field, so a role key in
/// the payload is ignored; escalation only happens through admin user CRUD.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn update_me(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateMeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_me input: {}", e);
        HttpError::validation(e)
    })?;
    if let Some(new_username) = &body.username {
        check_username(new_username)?;
    }

    let updated = app_state
        .db_client
        .update_user(
            jwt.user.id,
            body.username.as_deref(),
            body.email.as_deref(),
            body.first_name.as_deref(),
            body.last_name.as_deref(),
            body.bio.as_deref(),
            None,
        )
        .await
        .map_err(from_sqlx)?;

    tracing::info!("update_me successful");
    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserDto::filter_user(&updated),
    }))
}
