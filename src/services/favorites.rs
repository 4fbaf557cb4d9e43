//! Favorites service — ownership-gated, idempotent membership toggles.
//!
//! DESIGN
//! ======
//! The ownership check runs before anything touches the database: a token
//! for user A aimed at user B's list is rejected without a query, so a
//! forbidden request can never observe or mutate the target record.
//!
//! Adding checks that the movie exists in the catalogue at write time.
//! Removal does not: removing an id that is not in the set (or no longer in
//! the catalogue) already satisfies the postcondition.

use sqlx::PgPool;
use uuid::Uuid;

use crate::services::catalog;
use crate::services::users::{self, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    #[error("principal does not own target user")]
    Forbidden,
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("movie not found: {0}")]
    MovieNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<users::UserError> for FavoriteError {
    fn from(e: users::UserError) -> Self {
        match e {
            users::UserError::NotFound(name) => Self::UserNotFound(name),
            // The favorites statements cannot hit a unique violation.
            users::UserError::Duplicate(name) => Self::UserNotFound(name),
            users::UserError::Database(e) => Self::Database(e),
        }
    }
}

fn check_ownership(principal: &str, username: &str) -> Result<(), FavoriteError> {
    if principal == username {
        Ok(())
    } else {
        Err(FavoriteError::Forbidden)
    }
}

/// Add `movie_id` to `username`'s favorite set. Idempotent: repeating the
/// call returns success and leaves the set unchanged.
///
/// # Errors
///
/// `Forbidden` if `principal` is not `username`, `MovieNotFound` /
/// `UserNotFound` for unknown ids, otherwise a database error.
pub async fn add_favorite(
    pool: &PgPool,
    principal: &str,
    username: &str,
    movie_id: Uuid,
) -> Result<UserRecord, FavoriteError> {
    check_ownership(principal, username)?;

    if !catalog::movie_exists(pool, movie_id).await? {
        return Err(FavoriteError::MovieNotFound(movie_id));
    }

    users::add_favorite(pool, username, movie_id)
        .await?
        .ok_or_else(|| FavoriteError::UserNotFound(username.to_owned()))
}

/// Remove `movie_id` from `username`'s favorite set. Absent-on-remove is a
/// no-op success.
///
/// # Errors
///
/// `Forbidden` if `principal` is not `username`, `UserNotFound` for an
/// unknown user, otherwise a database error.
pub async fn remove_favorite(
    pool: &PgPool,
    principal: &str,
    username: &str,
    movie_id: Uuid,
) -> Result<UserRecord, FavoriteError> {
    check_ownership(principal, username)?;

    users::remove_favorite(pool, username, movie_id)
        .await?
        .ok_or_else(|| FavoriteError::UserNotFound(username.to_owned()))
}

#[cfg(test)]
#[path = "favorites_test.rs"]
mod tests;
