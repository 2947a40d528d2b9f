use crate::{
    AppState,
    db::{CommentExt, ReviewExt},
    dtos::{CreateCommentDto, ListResponseDto, PageQueryDto, PaginationDto},
    error::{ErrorMessage, HttpError},
    middleware::{JWTAuthMiddleware, auth},
    policy::{self, Action, Resource},
};
use axum::{
    Extension, Json, Router, middleware,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use tracing::instrument;
use validator::Validate;

/// Router for comments, nested under
/// /titles/{title_id}/reviews/{review_id}/comments. Same access contract as
/// reviews, one level deeper.
pub fn comment_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_comments))
        .route(
            "/",
            post(create_comment)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{comment_id}", get(get_comment))
        .route(
            "/{comment_id}",
            patch(update_comment)
                .delete(delete_comment)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// 404 unless the review exists and belongs to the title in the path.
async fn ensure_review(
    app_state: &AppState,
    title_id: i64,
    review_id: i64,
) -> Result<(), HttpError> {
    app_state
        .db_client
        .get_review(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Review not found"))?;

    Ok(())
}

/// Paginated comments on a review, newest first.
#[instrument(skip(app_state))]
pub async fn get_comments(
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(query): Query<PageQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate().map_err(|e| {
        tracing::error!("Invalid get_comments input: {}", e);
        HttpError::validation(e)
    })?;
    ensure_review(&app_state, title_id, review_id).await?;

    let (page, limit) = (query.page(), query.limit());

    let comments = app_state
        .db_client
        .get_comments(review_id, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comments: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_comment_count(review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto {
        status: "success".to_string(),
        data: comments,
        pagination: PaginationDto::new(page, limit, total),
    }))
}

#[instrument(skip(app_state))]
pub async fn get_comment(
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_review(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .get_comment_dto(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    Ok(Json(comment))
}

/// Create a comment; author is the caller, review comes from the path.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_comment(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Create, Resource::Comment, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid create_comment input: {}", e);
        HttpError::validation(e)
    })?;
    ensure_review(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .save_comment(review_id, jwt.user.id, &body.text)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(comment_id = %comment.id, "create_comment successful");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit: the author, a moderator, or an admin.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn update_comment(
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_comment input: {}", e);
        HttpError::validation(e)
    })?;
    ensure_review(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .get_comment(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    let is_owner = comment.author_id == jwt.user.id;
    policy::require((&jwt.user).into(), Action::Update, Resource::Comment, is_owner)?;

    app_state
        .db_client
        .update_comment(comment_id, &body.text)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let comment = app_state
        .db_client
        .get_comment_dto(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    tracing::info!(comment_id = %comment_id, "update_comment successful");
    Ok(Json(comment))
}

/// Delete: the author, a moderator, or an admin.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_comment(
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_review(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .get_comment(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    let is_owner = comment.author_id == jwt.user.id;
    policy::require((&jwt.user).into(), Action::Delete, Resource::Comment, is_owner)?;

    app_state
        .db_client
        .delete_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(comment_id = %comment_id, "delete_comment successful");
    Ok(StatusCode::NO_CONTENT)
}
