use super::*;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

use crate::services::token::TokenKeys;
use crate::state::test_helpers;

// =============================================================================
// bearer_token
// =============================================================================

fn headers_with(value: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = value {
        headers.insert(AUTHORIZATION, value.parse().unwrap());
    }
    headers
}

#[test]
fn bearer_token_missing_header_is_none() {
    assert_eq!(bearer_token(&headers_with(None)), None);
}

#[test]
fn bearer_token_without_scheme_is_none() {
    assert_eq!(bearer_token(&headers_with(Some("abc.def.ghi"))), None);
}

#[test]
fn bearer_token_wrong_scheme_is_none() {
    assert_eq!(bearer_token(&headers_with(Some("Basic abc"))), None);
}

#[test]
fn bearer_token_empty_value_is_none() {
    assert_eq!(bearer_token(&headers_with(Some("Bearer "))), None);
}

#[test]
fn bearer_token_extracts_and_trims() {
    assert_eq!(bearer_token(&headers_with(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
    assert_eq!(bearer_token(&headers_with(Some("Bearer abc.def.ghi "))), Some("abc.def.ghi"));
}

// =============================================================================
// extractor behavior through the router — all against a never-connected
// pool: token rejection and ownership rejection must not touch the DB.
// =============================================================================

fn test_keys() -> TokenKeys {
    TokenKeys::new(test_helpers::TEST_SECRET)
}

async fn protected_request(auth_header: Option<String>) -> StatusCode {
    let app = crate::routes::app(test_helpers::test_app_state());
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/users/bobby1/{}", uuid::Uuid::nil()));
    if let Some(value) = auth_header {
        builder = builder.header(AUTHORIZATION, value);
    }
    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    assert_eq!(protected_request(None).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_unauthenticated() {
    assert_eq!(
        protected_request(Some("Bearer garbage".into())).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn expired_token_is_unauthenticated() {
    let token = test_keys().issue_with_ttl("bobby1", -120).unwrap();
    assert_eq!(
        protected_request(Some(format!("Bearer {token}"))).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn foreign_key_token_is_unauthenticated() {
    let token = TokenKeys::new(b"not-the-server-secret").issue("bobby1").unwrap();
    assert_eq!(
        protected_request(Some(format!("Bearer {token}"))).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn valid_token_for_other_user_is_forbidden_before_storage() {
    // The extractor accepts the token (so this is not a 401), then the
    // ownership check rejects it without a query (so not a 500 either).
    let token = test_keys().issue("alice1").unwrap();
    assert_eq!(
        protected_request(Some(format!("Bearer {token}"))).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn healthz_is_public() {
    let app = crate::routes::app(test_helpers::test_app_state());
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
