use crate::{
    AppState,
    db::{CategoryExt, GenreExt, TitleExt, TitleFilter},
    dtos::{
        CreateTitleDto, ListResponseDto, PaginationDto, TitleQueryDto, UpdateTitleDto, check_year,
    },
    error::{ErrorMessage, HttpError, from_sqlx},
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

/// Router for titles: read is public, every write is admin.
pub fn title_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_titles))
        .route(
            "/",
            post(create_title)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{title_id}", get(get_title))
        .route(
            "/{title_id}",
            patch(update_title)
                .delete(delete_title)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Resolve a category slug from a payload to its id; unknown slugs are the
/// client's mistake (400), not a missing resource.
async fn resolve_category(
    app_state: &AppState,
    slug: Option<&str>,
) -> Result<Option<i64>, HttpError> {
    let Some(slug) = slug else {
        return Ok(None);
    };

    let category = app_state.db_client.get_category(slug).await.map_err(|e| {
        tracing::error!("DB error, getting category: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    match category {
        Some(category) => Ok(Some(category.id)),
        None => Err(HttpError::bad_request(format!(
            "Unknown category slug: {}",
            slug
        ))),
    }
}

async fn resolve_genres(app_state: &AppState, slugs: &[String]) -> Result<Vec<i64>, HttpError> {
    let mut ids = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let genre = app_state.db_client.get_genre(slug).await.map_err(|e| {
            tracing::error!("DB error, getting genre: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

        match genre {
            Some(genre) => ids.push(genre.id),
            None => {
                return Err(HttpError::bad_request(format!("Unknown genre slug: {}", slug)));
            }
        }
    }
    Ok(ids)
}

/// Paginated title list with combinable filters: category slug, genre slug,
/// name substring, exact year. Each entry carries the read-time rating.
#[instrument(skip(app_state))]
pub async fn get_titles(
    Query(query): Query<TitleQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate().map_err(|e| {
        tracing::error!("Invalid get_titles input: {}", e);
        HttpError::validation(e)
    })?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);

    let filter = TitleFilter {
        category: query.category,
        genre: query.genre,
        name: query.name,
        year: query.year,
    };

    let titles = app_state
        .db_client
        .get_titles(&filter, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting titles: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_title_count(&filter)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto {
        status: "success".to_string(),
        data: titles,
        pagination: PaginationDto::new(page, limit, total),
    }))
}

#[instrument(skip(app_state))]
pub async fn get_title(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let title = app_state
        .db_client
        .get_title(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Title not found"))?;

    Ok(Json(title))
}

/// Create a title (admin only); category/genre arrive as slugs.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_title(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateTitleDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Create, Resource::Title, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid create_title input: {}", e);
        HttpError::validation(e)
    })?;
    check_year(body.year)?;

    let category_id = resolve_category(&app_state, body.category.as_deref()).await?;
    let genre_ids = resolve_genres(&app_state, body.genre.as_deref().unwrap_or(&[])).await?;

    let title_id = app_state
        .db_client
        .save_title(
            &body.name,
            body.year,
            body.description.as_deref(),
            category_id,
            &genre_ids,
        )
        .await
        .map_err(from_sqlx)?;

    let title = app_state
        .db_client
        .get_title(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::server_error(ErrorMessage::ServerError.to_string()))?;

    tracing::info!(title_id = %title_id, "create_title successful");
    Ok((StatusCode::CREATED, Json(title)))
}

/// Partial update (admin only); a genre list in the payload replaces the
/// whole association set.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn update_title(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateTitleDto>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Update, Resource::Title, false)?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid update_title input: {}", e);
        HttpError::validation(e)
    })?;
    if let Some(year) = body.year {
        check_year(year)?;
    }

    let category_id = resolve_category(&app_state, body.category.as_deref()).await?;
    let genre_ids = match &body.genre {
        Some(slugs) => Some(resolve_genres(&app_state, slugs).await?),
        None => None,
    };

    app_state
        .db_client
        .update_title(
            title_id,
            body.name.as_deref(),
            body.year,
            body.description.as_deref(),
            category_id,
            genre_ids.as_deref(),
        )
        .await
        .map_err(from_sqlx)?;

    let title = app_state
        .db_client
        .get_title(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Title not found"))?;

    tracing::info!(title_id = %title_id, "update_title successful");
    Ok(Json(title))
}

/// Delete a title (admin only); its reviews and their comments cascade.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_title(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    policy::require((&jwt.user).into(), Action::Delete, Resource::Title, false)?;

    app_state
        .db_client
        .delete_title(title_id)
        .await
        .map_err(from_sqlx)?;

    tracing::info!(title_id = %title_id, "delete_title successful");
    Ok(StatusCode::NO_CONTENT)
}
