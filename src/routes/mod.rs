//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Auth enforcement lives in the `AuthUser` extractor, so the split between
//! public and protected surface is visible right here: catalogue reads,
//! signup, login, and public profile lookup take no extractor; everything
//! that mutates a user record requires it.

pub mod auth;
pub mod movies;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/login", post(auth::login))
        .route("/users", post(users::signup))
        .route(
            "/users/{username}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/users/{username}/{movie_id}",
            post(users::add_favorite).delete(users::remove_favorite),
        )
        .route("/movies", get(movies::list_movies))
        .route("/movies/{title}", get(movies::movie_by_title))
        .route("/movies/genre/{title}", get(movies::genre_by_title))
        .route("/movies/director/{name}", get(movies::movies_by_director))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
