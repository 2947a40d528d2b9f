use crate::{
    AppState,
    db::GenreExt,
    dtos::{CreateSlugDto, GenreDto, ListResponseDto, PageQueryDto, PaginationDto, check_slug},
    error::{ErrorMessage, HttpError, from_sqlx},
    middleware::{JWTAuthMiddleware, auth},
    policy::{self, Action, Resource},
};
use axum::{
    Extension, Json, Router, middleware,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tracing::instrument;
use validator::Validate;

/// Router for the genre reference table; same surface as categories, but a
/// genre delete cascades its join rows instead of nulling a title column.
pub fn genre_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_genres))
        .route(
            "/",
            post(create_genre)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{slug}",
            delete(delete_genre).route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_genres(
    Query(query): Query<PageQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate().map_err(|e| {
        tracing::error!("Invalid get_genres input: {}", e);
        HttpError::validation(e)
    })?;

    let (page, limit) = (query.page(), query.limit());

    let genres = app_state
        .db_client
        .get_genres(query.search.as_deref(), page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting genres: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_genre_count(query.search.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting genre count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto {
        status: "success".to_string(),
        data: genres.into_iter().map(GenreDto::from).collect::<Vec<_>>(),
        pagination: PaginationDto::new(page, limit, total),
    }))
}

#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_genre(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateSlugDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Create, Resource::Genre, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid create_genre input: {}", e);
        HttpError::validation(e)
    })?;
    check_slug(&body.slug)?;

    let genre = app_state
        .db_client
        .save_genre(&body.name, &body.slug)
        .await
        .map_err(from_sqlx)?;

    tracing::info!(slug = %genre.slug, "create_genre successful");
    Ok((StatusCode::CREATED, Json(GenreDto::from(genre))))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_genre(
    Path(slug): Path<String>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Delete, Resource::Genre, false)?;

    app_state
        .db_client
        .delete_genre(&slug)
        .await
        .map_err(from_sqlx)?;

    tracing::info!(slug = %slug, "delete_genre successful");
    Ok(StatusCode::NO_CONTENT)
}
