//! User routes — signup, profile CRUD, and favorite toggles.
//!
//! ERROR HANDLING
//! ==============
//! Ownership failures map to 403 and are checked before validation or any
//! storage access. Validation failures come back as a 422 with one entry
//! per failing field. Storage failures are logged and surfaced as a bare
//! 500 so internal detail never reaches the client.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::favorites::{self, FavoriteError};
use crate::services::password;
use crate::services::users::{
    self, FieldError, SignupRequest, UpdateRequest, UserError, UserView,
};
use crate::state::AppState;

fn user_error_to_status(e: &UserError) -> StatusCode {
    match e {
        UserError::NotFound(_) => StatusCode::NOT_FOUND,
        UserError::Duplicate(_) => StatusCode::BAD_REQUEST,
        UserError::Database(e) => {
            tracing::error!(error = %e, "user storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn favorite_error_to_status(e: &FavoriteError) -> StatusCode {
    match e {
        FavoriteError::Forbidden => StatusCode::FORBIDDEN,
        FavoriteError::UserNotFound(_) | FavoriteError::MovieNotFound(_) => StatusCode::NOT_FOUND,
        FavoriteError::Database(e) => {
            tracing::error!(error = %e, "favorites storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn validation_response(errors: Vec<FieldError>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "errors": errors })),
    )
        .into_response()
}

// =============================================================================
// SIGNUP / PROFILE
// =============================================================================

/// `POST /users` — register a new account. The password hash is computed
/// here, at creation time, and is the only form the password is ever stored
/// or passed around in.
pub async fn signup(State(state): State<AppState>, Json(body): Json<SignupRequest>) -> Response {
    let birthday = match users::validate_signup(&body) {
        Ok(birthday) => birthday,
        Err(errors) => return validation_response(errors),
    };

    let password_hash = match password::hash(&body.password).await {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "signup hashing failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match users::create_user(&state.pool, &body.username, &password_hash, &body.email, birthday).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "user": UserView::from(user) })),
        )
            .into_response(),
        Err(e) => user_error_to_status(&e).into_response(),
    }
}

/// `GET /users/:username` — public profile lookup.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserView>, StatusCode> {
    let user = users::find_user(&state.pool, &username)
        .await
        .map_err(|e| user_error_to_status(&e))?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(UserView::from(user)))
}

/// `PUT /users/:username` — update email/birthday/password. The username is
/// immutable and the principal must own the record.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
    Json(body): Json<UpdateRequest>,
) -> Response {
    if auth.username != username {
        return StatusCode::FORBIDDEN.into_response();
    }

    let birthday = match users::validate_update(&username, &body) {
        Ok(birthday) => birthday,
        Err(errors) => return validation_response(errors),
    };

    let password_hash = match body.password.as_deref() {
        Some(plaintext) => match password::hash(plaintext).await {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::error!(error = %e, "update hashing failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        None => None,
    };

    match users::update_user(&state.pool, &username, password_hash.as_deref(), &body.email, birthday).await {
        Ok(user) => Json(serde_json::json!({ "user": UserView::from(user) })).into_response(),
        Err(e) => user_error_to_status(&e).into_response(),
    }
}

/// `DELETE /users/:username` — deregister an account. Outstanding tokens
/// stay verifiable until expiry, but every user-scoped operation re-resolves
/// the target record, so a token for a deleted account can no longer mutate
/// anything.
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
) -> Result<StatusCode, StatusCode> {
    if auth.username != username {
        return Err(StatusCode::FORBIDDEN);
    }

    users::delete_user(&state.pool, &username)
        .await
        .map_err(|e| user_error_to_status(&e))?;

    Ok(StatusCode::OK)
}

// =============================================================================
// FAVORITES
// =============================================================================

/// `POST /users/:username/:movie_id` — add a favorite. Idempotent.
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((username, movie_id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let user = favorites::add_favorite(&state.pool, &auth.username, &username, movie_id)
        .await
        .map_err(|e| favorite_error_to_status(&e))?;

    Ok(Json(serde_json::json!({ "user": UserView::from(user) })))
}

/// `DELETE /users/:username/:movie_id` — remove a favorite. Removing an
/// absent id is a success.
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((username, movie_id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let user = favorites::remove_favorite(&state.pool, &auth.username, &username, movie_id)
        .await
        .map_err(|e| favorite_error_to_status(&e))?;

    Ok(Json(serde_json::json!({ "user": UserView::from(user) })))
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
