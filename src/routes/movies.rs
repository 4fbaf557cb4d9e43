//! Public catalogue read routes. No auth: these are the pre-authentication
//! browse surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::services::catalog::{self, CatalogError, Genre, Movie};
use crate::state::AppState;

fn catalog_error_to_status(e: &CatalogError) -> StatusCode {
    match e {
        CatalogError::Database(e) => {
            tracing::error!(error = %e, "catalogue storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /movies` — the whole catalogue.
pub async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, StatusCode> {
    let movies = catalog::list_movies(&state.pool)
        .await
        .map_err(|e| catalog_error_to_status(&e))?;
    Ok(Json(movies))
}

/// `GET /movies/:title` — a single movie by exact title.
pub async fn movie_by_title(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<Movie>, StatusCode> {
    let movie = catalog::find_by_title(&state.pool, &title)
        .await
        .map_err(|e| catalog_error_to_status(&e))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(movie))
}

/// `GET /movies/genre/:title` — the genre of the named movie.
pub async fn genre_by_title(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<Genre>, StatusCode> {
    let genre = catalog::genre_of(&state.pool, &title)
        .await
        .map_err(|e| catalog_error_to_status(&e))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(genre))
}

/// `GET /movies/director/:name` — all movies by the named director.
pub async fn movies_by_director(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Movie>>, StatusCode> {
    let movies = catalog::find_by_director(&state.pool, &name)
        .await
        .map_err(|e| catalog_error_to_status(&e))?;
    Ok(Json(movies))
}

#[cfg(test)]
#[path = "movies_test.rs"]
mod tests;
