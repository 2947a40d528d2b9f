use crate::{
    AppState,
    db::{ReviewExt, TitleExt},
    dtos::{CreateReviewDto, ListResponseDto, PageQueryDto, PaginationDto, UpdateReviewDto},
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

/// Router for reviews, nested under /titles/{title_id}/reviews. Reads are
/// public; create needs authentication; update/delete go through the policy
/// with ownership.
pub fn review_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_reviews))
        .route(
            "/",
            post(create_review)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{review_id}", get(get_review))
        .route(
            "/{review_id}",
            patch(update_review)
                .delete(delete_review)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// 404 unless the parent title exists; every nested operation starts here.
async fn ensure_title(app_state: &AppState, title_id: i64) -> Result<(), HttpError> {
    app_state
        .db_client
        .get_title_row(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Title not found"))?;

    Ok(())
}

/// Paginated reviews for a title, newest first.
#[instrument(skip(app_state))]
pub async fn get_reviews(
    Path(title_id): Path<i64>,
    Query(query): Query<PageQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate().map_err(|e| {
        tracing::error!("Invalid get_reviews input: {}", e);
        HttpError::validation(e)
    })?;
    ensure_title(&app_state, title_id).await?;

    let (page, limit) = (query.page(), query.limit());

    let reviews = app_state
        .db_client
        .get_reviews(title_id, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting reviews: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_review_count(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto {
        status: "success".to_string(),
        data: reviews,
        pagination: PaginationDto::new(page, limit, total),
    }))
}

#[instrument(skip(app_state))]
pub async fn get_review(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_title(&app_state, title_id).await?;

    let review = app_state
        .db_client
        .get_review_dto(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Review not found"))?;

    Ok(Json(review))
}

/// Create a review on a title. The author is always the caller and the title
/// always comes from the path; the payload cannot override either. One review
/// per (author, title): the unique constraint turns a second attempt into a
/// 409.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_review(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Create, Resource::Review, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid create_review input: {}", e);
        HttpError::validation(e)
    })?;
    ensure_title(&app_state, title_id).await?;

    let review = app_state
        .db_client
        .save_review(title_id, jwt.user.id, &body.text, body.score)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::conflict("You have already reviewed this title")
            }
            _ => {
                tracing::error!("DB error, creating review: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!(review_id = %review.id, "create_review successful");
    Ok((StatusCode::CREATED, Json(review)))
}

/// Partial update: the author, a moderator, or an admin.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn update_review(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_review input: {}", e);
        HttpError::validation(e)
    })?;

    let review = app_state
        .db_client
        .get_review(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Review not found"))?;

    let is_owner = review.author_id == jwt.user.id;
    policy::require((&jwt.user).into(), Action::Update, Resource::Review, is_owner)?;

    app_state
        .db_client
        .update_review(review_id, body.text.as_deref(), body.score)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let review = app_state
        .db_client
        .get_review_dto(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Review not found"))?;

    tracing::info!(review_id = %review_id, "update_review successful");
    Ok(Json(review))
}

/// Delete: the author, a moderator, or an admin. Comments cascade.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_review(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state
        .db_client
        .get_review(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Review not found"))?;

    let is_owner = review.author_id == jwt.user.id;
    policy::require((&jwt.user).into(), Action::Delete, Resource::Review, is_owner)?;

    app_state
        .db_client
        .delete_review(review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(review_id = %review_id, "delete_review successful");
    Ok(StatusCode::NO_CONTENT)
}
