//! Auth routes — login and the bearer-token extractor.

use axum::extract::{FromRef, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::services::{password, users};
use crate::state::AppState;

/// Login failures share one body whether the username or the password was
/// wrong, so the endpoint cannot be used to enumerate accounts.
const LOGIN_FAILED: &str = "invalid username or password";

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated principal extracted from the `Authorization` header.
/// Use as a handler parameter to require authentication. Verification is
/// pure (signature + expiry); it never touches the database, so a rejected
/// request terminates before any handler or storage logic runs.
pub struct AuthUser {
    pub username: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = AppState::from_ref(state);
        let claims = app_state.keys.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            StatusCode::UNAUTHORIZED
        })?;

        Ok(Self { username: claims.sub })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

fn login_rejection() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": LOGIN_FAILED })),
    )
        .into_response()
}

/// `POST /login` — verify credentials and mint a bearer token.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    let user = match users::find_user(&state.pool, &body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => return login_rejection(),
        Err(e) => {
            tracing::error!(error = %e, "login lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !password::verify(&body.password, &user.password_hash).await {
        return login_rejection();
    }

    let token = match state.keys.issue(&user.username) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Json(serde_json::json!({
        "user": users::UserView::from(user),
        "token": token,
    }))
    .into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
