use crate::{
    AppState,
    db::CategoryExt,
    dtos::{CategoryDto, CreateSlugDto, ListResponseDto, PageQueryDto, PaginationDto, check_slug},
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

/// Router for the category reference table: list (public), create and delete
/// (admin). No update, no individual retrieve.
pub fn category_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_categories))
        .route(
            "/",
            post(create_category)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{slug}",
            delete(delete_category)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Paginated category list, `?search=` filters by name substring.
#[instrument(skip(app_state))]
pub async fn get_categories(
    Query(query): Query<PageQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate().map_err(|e| {
        tracing::error!("Invalid get_categories input: {}", e);
        HttpError::validation(e)
    })?;

    let (page, limit) = (query.page(), query.limit());

    let categories = app_state
        .db_client
        .get_categories(query.search.as_deref(), page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting categories: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_category_count(query.search.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting category count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto {
        status: "success".to_string(),
        data: categories.into_iter().map(CategoryDto::from).collect::<Vec<_>>(),
        pagination: PaginationDto::new(page, limit, total),
    }))
}

/// Create a category (admin only). Duplicate slug is a conflict.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_category(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateSlugDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Create, Resource::Category, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid create_category input: {}", e);
        HttpError::validation(e)
    })?;
    check_slug(&body.slug)?;

    let category = app_state
        .db_client
        .save_category(&body.name, &body.slug)
        .await
        .map_err(from_sqlx)?;

    tracing::info!(slug = %category.slug, "create_category successful");
    Ok((StatusCode::CREATED, Json(CategoryDto::from(category))))
}

/// Delete a category by slug (admin only). Dependent titles keep their rows
/// with the category reference cleared.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_category(
    Path(slug): Path<String>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Delete, Resource::Category, false)?;

    app_state
        .db_client
        .delete_category(&slug)
        .await
        .map_err(from_sqlx)?;

    tracing::info!(slug = %slug, "delete_category successful");
    Ok(StatusCode::NO_CONTENT)
}
