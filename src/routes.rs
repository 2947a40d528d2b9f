use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        auth::auth_handler, category::category_handler, comment::comment_handler,
        genre::genre_handler, review::review_handler, title::title_handler, users::users_handler,
    },
    middleware::auth,
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/categories", category_handler(app_state.clone()))
        .nest("/genres", genre_handler(app_state.clone()))
        .nest("/titles", title_handler(app_state.clone()))
        .nest(
            "/titles/{title_id}/reviews",
            review_handler(app_state.clone()),
        )
        .nest(
            "/titles/{title_id}/reviews/{review_id}/comments",
            comment_handler(app_state.clone()),
        )
        .nest(
            "/users",
            // Every user route needs identity; admin-only checks follow in
            // the handlers via the policy table.
            users_handler().layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api/v1", api_route)
}
