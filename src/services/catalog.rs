//! Movie catalogue — read-only queries.
//!
//! The catalogue is external to the favorites core: nothing here mutates,
//! and the only caller outside the public read endpoints is the favorites
//! service's existence check.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    pub name: String,
    pub bio: Option<String>,
    pub birth: Option<String>,
    pub death: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub director: Director,
    pub image_path: Option<String>,
    pub featured: bool,
}

fn movie_from_row(row: &PgRow) -> Movie {
    let genre: Json<Genre> = row.get("genre");
    let director: Json<Director> = row.get("director");
    Movie {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        genre: genre.0,
        director: director.0,
        image_path: row.get("image_path"),
        featured: row.get("featured"),
    }
}

/// List the whole catalogue, ordered by title.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_movies(pool: &PgPool) -> Result<Vec<Movie>, CatalogError> {
    let rows = sqlx::query(
        "SELECT id, title, description, genre, director, image_path, featured
         FROM movies ORDER BY title",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(movie_from_row).collect())
}

/// Look up a single movie by exact title.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_by_title(pool: &PgPool, title: &str) -> Result<Option<Movie>, CatalogError> {
    let row = sqlx::query(
        "SELECT id, title, description, genre, director, image_path, featured
         FROM movies WHERE title = $1",
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(movie_from_row))
}

/// Genre of the movie with the given title.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn genre_of(pool: &PgPool, title: &str) -> Result<Option<Genre>, CatalogError> {
    Ok(find_by_title(pool, title).await?.map(|movie| movie.genre))
}

/// All movies by the named director.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_by_director(pool: &PgPool, name: &str) -> Result<Vec<Movie>, CatalogError> {
    let rows = sqlx::query(
        "SELECT id, title, description, genre, director, image_path, featured
         FROM movies WHERE director ->> 'name' = $1 ORDER BY title",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(movie_from_row).collect())
}

/// Best-effort membership check used when favorites are written.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn movie_exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
