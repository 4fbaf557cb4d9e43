//! User credential store — signup validation, profile CRUD, and the atomic
//! favorite-set primitives.
//!
//! DESIGN
//! ======
//! The username is the primary key and the authorization key; it never
//! changes after signup. Favorite toggles are expressed as single-statement
//! array updates so two concurrent toggles of *different* movies for the
//! same user cannot lose each other's write — there is no fetch/mutate/save
//! cycle to race on.
//!
//! `UserRecord` (internal, carries the password hash) never crosses the HTTP
//! boundary; responses serialize the redacted `UserView` projection.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::Date;
use time::macros::format_description;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("username already exists: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Full user row. Internal only: carries the password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<Date>,
    pub favorites: Vec<Uuid>,
}

/// Redacted projection of a user, safe for response bodies and client-side
/// persistence. Deliberately has no way to carry a password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub birthday: Option<Date>,
    pub favorites: Vec<Uuid>,
}

impl From<UserRecord> for UserView {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            email: record.email,
            birthday: record.birthday,
            favorites: record.favorites,
        }
    }
}

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub birthday: Option<String>,
}

/// Profile update body. The username is immutable: when present it must
/// match the path username. A missing password leaves the stored hash
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: String,
    pub birthday: Option<String>,
}

/// Field-level validation failure, rendered as a 422 body entry.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

// =============================================================================
// VALIDATION
// =============================================================================

const USERNAME_MIN_LEN: usize = 5;

pub(crate) fn valid_username(username: &str) -> bool {
    username.len() >= USERNAME_MIN_LEN && username.chars().all(|c| c.is_ascii_alphanumeric())
}

pub(crate) fn valid_email(email: &str) -> bool {
    let parts = email.split('@').collect::<Vec<_>>();
    parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty()
}

pub(crate) fn parse_birthday(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

fn check_birthday(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<Date> {
    let raw = raw?;
    let parsed = parse_birthday(raw);
    if parsed.is_none() {
        errors.push(FieldError { field: "birthday", message: "Birthday must be YYYY-MM-DD." });
    }
    parsed
}

/// Validate a signup request, returning the parsed birthday.
///
/// # Errors
///
/// Returns one entry per failing field.
pub fn validate_signup(req: &SignupRequest) -> Result<Option<Date>, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !valid_username(&req.username) {
        errors.push(FieldError {
            field: "username",
            message: "Username must be at least 5 alphanumeric characters.",
        });
    }
    if req.password.is_empty() {
        errors.push(FieldError { field: "password", message: "Password is required." });
    }
    if !valid_email(&req.email) {
        errors.push(FieldError { field: "email", message: "Email does not appear to be valid." });
    }
    let birthday = check_birthday(req.birthday.as_deref(), &mut errors);

    if errors.is_empty() { Ok(birthday) } else { Err(errors) }
}

/// Validate a profile update against the path username, returning the
/// parsed birthday.
///
/// # Errors
///
/// Returns one entry per failing field.
pub fn validate_update(
    path_username: &str,
    req: &UpdateRequest,
) -> Result<Option<Date>, Vec<FieldError>> {
    let mut errors = Vec::new();
    if let Some(username) = req.username.as_deref() {
        if username != path_username {
            errors.push(FieldError { field: "username", message: "Username cannot be changed." });
        }
    }
    if let Some(password) = req.password.as_deref() {
        if password.is_empty() {
            errors.push(FieldError { field: "password", message: "Password must not be empty." });
        }
    }
    if !valid_email(&req.email) {
        errors.push(FieldError { field: "email", message: "Email does not appear to be valid." });
    }
    let birthday = check_birthday(req.birthday.as_deref(), &mut errors);

    if errors.is_empty() { Ok(birthday) } else { Err(errors) }
}

// =============================================================================
// CRUD
// =============================================================================

fn record_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        birthday: row.get("birthday"),
        favorites: row.get("favorites"),
    }
}

/// Insert a new user. The hash must already be computed.
///
/// # Errors
///
/// `Duplicate` if the username is taken, otherwise a database error.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    email: &str,
    birthday: Option<Date>,
) -> Result<UserRecord, UserError> {
    let row = sqlx::query(
        "INSERT INTO users (username, password_hash, email, birthday)
         VALUES ($1, $2, $3, $4)
         RETURNING username, password_hash, email, birthday, favorites",
    )
    .bind(username)
    .bind(password_hash)
    .bind(email)
    .bind(birthday)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if e.as_database_error().is_some_and(sqlx::error::DatabaseError::is_unique_violation) {
            UserError::Duplicate(username.to_owned())
        } else {
            UserError::Database(e)
        }
    })?;

    Ok(record_from_row(&row))
}

/// Look up a user by username.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_user(pool: &PgPool, username: &str) -> Result<Option<UserRecord>, UserError> {
    let row = sqlx::query(
        "SELECT username, password_hash, email, birthday, favorites
         FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(record_from_row))
}

/// Update a user's profile. A `None` password hash keeps the stored one.
///
/// # Errors
///
/// `NotFound` if the username does not exist.
pub async fn update_user(
    pool: &PgPool,
    username: &str,
    password_hash: Option<&str>,
    email: &str,
    birthday: Option<Date>,
) -> Result<UserRecord, UserError> {
    let row = sqlx::query(
        "UPDATE users
         SET email = $2,
             birthday = $3,
             password_hash = COALESCE($4, password_hash)
         WHERE username = $1
         RETURNING username, password_hash, email, birthday, favorites",
    )
    .bind(username)
    .bind(email)
    .bind(birthday)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| UserError::NotFound(username.to_owned()))?;

    Ok(record_from_row(&row))
}

/// Delete a user.
///
/// # Errors
///
/// `NotFound` if the username does not exist.
pub async fn delete_user(pool: &PgPool, username: &str) -> Result<(), UserError> {
    let result = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(UserError::NotFound(username.to_owned()));
    }
    Ok(())
}

// =============================================================================
// FAVORITE SET PRIMITIVES
// =============================================================================

/// Insert a movie id into the user's favorite set. Idempotent: an id already
/// in the set leaves the row byte-for-byte unchanged. Single atomic
/// statement; no read-modify-write cycle.
///
/// Returns `None` if the user does not exist.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn add_favorite(
    pool: &PgPool,
    username: &str,
    movie_id: Uuid,
) -> Result<Option<UserRecord>, UserError> {
    let row = sqlx::query(
        "UPDATE users
         SET favorites = CASE
             WHEN $2 = ANY(favorites) THEN favorites
             ELSE array_append(favorites, $2)
         END
         WHERE username = $1
         RETURNING username, password_hash, email, birthday, favorites",
    )
    .bind(username)
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(record_from_row))
}

/// Remove a movie id from the user's favorite set. Removing an absent id is
/// a no-op success: the postcondition already holds.
///
/// Returns `None` if the user does not exist.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn remove_favorite(
    pool: &PgPool,
    username: &str,
    movie_id: Uuid,
) -> Result<Option<UserRecord>, UserError> {
    let row = sqlx::query(
        "UPDATE users
         SET favorites = array_remove(favorites, $2)
         WHERE username = $1
         RETURNING username, password_hash, email, birthday, favorites",
    )
    .bind(username)
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(record_from_row))
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
