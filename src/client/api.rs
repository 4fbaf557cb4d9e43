//! REST API port and its reqwest implementation.
//!
//! The trait exists so the session state machine can be exercised against a
//! mock; `HttpApi` is the real thing. Calls carry the bearer token only
//! where the server requires one. No call retries or self-cancels: a failed
//! call surfaces once and retries are the caller's (ultimately the user's)
//! decision.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::catalog::Movie;
use crate::services::users::{SignupRequest, UserView};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("request rejected with status {0}")]
    Status(u16),
    /// The request never completed (connect, timeout, decode).
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl ApiError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status(401))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: UserView,
}

#[async_trait]
pub trait MovieApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;
    async fn signup(&self, req: &SignupRequest) -> Result<UserView, ApiError>;
    async fn fetch_user(&self, username: &str) -> Result<UserView, ApiError>;
    async fn list_movies(&self) -> Result<Vec<Movie>, ApiError>;
    async fn add_favorite(&self, token: &str, username: &str, movie_id: Uuid) -> Result<UserView, ApiError>;
    async fn remove_favorite(&self, token: &str, username: &str, movie_id: Uuid) -> Result<UserView, ApiError>;
}

/// reqwest-backed implementation against a base URL.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

fn check_status(resp: &reqwest::Response) -> Result<(), ApiError> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(ApiError::Status(resp.status().as_u16()))
    }
}

#[async_trait]
impl MovieApi for HttpApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        check_status(&resp)?;
        Ok(resp.json::<LoginResponse>().await?)
    }

    async fn signup(&self, req: &SignupRequest) -> Result<UserView, ApiError> {
        let resp = self.http.post(self.url("/users")).json(req).send().await?;
        check_status(&resp)?;
        Ok(resp.json::<UserEnvelope>().await?.user)
    }

    async fn fetch_user(&self, username: &str) -> Result<UserView, ApiError> {
        let resp = self.http.get(self.url(&format!("/users/{username}"))).send().await?;
        check_status(&resp)?;
        Ok(resp.json::<UserView>().await?)
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, ApiError> {
        let resp = self.http.get(self.url("/movies")).send().await?;
        check_status(&resp)?;
        Ok(resp.json::<Vec<Movie>>().await?)
    }

    async fn add_favorite(&self, token: &str, username: &str, movie_id: Uuid) -> Result<UserView, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/users/{username}/{movie_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(&resp)?;
        Ok(resp.json::<UserEnvelope>().await?.user)
    }

    async fn remove_favorite(&self, token: &str, username: &str, movie_id: Uuid) -> Result<UserView, ApiError> {
        let resp = self
            .http
            .delete(self.url(&format!("/users/{username}/{movie_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(&resp)?;
        Ok(resp.json::<UserEnvelope>().await?.user)
    }
}
