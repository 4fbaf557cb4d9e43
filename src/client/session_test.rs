use super::*;

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::api::{ApiError, LoginResponse};
use crate::client::store::MemoryStore;
use crate::services::catalog::{Director, Genre};
use crate::services::users::SignupRequest;

// =============================================================================
// mock API
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum FailWith {
    Unauthorized,
    ServerError,
}

#[derive(Default)]
struct MockState {
    /// Server-held favorite set.
    favorites: Vec<Uuid>,
    fail_next: Option<FailWith>,
    calls: Vec<&'static str>,
}

#[derive(Default)]
struct MockApi {
    state: Mutex<MockState>,
}

fn view(favorites: &[Uuid]) -> UserView {
    UserView {
        username: "alice1".into(),
        email: "a@x.com".into(),
        birthday: None,
        favorites: favorites.to_vec(),
    }
}

fn sample_movie() -> Movie {
    Movie {
        id: Uuid::new_v4(),
        title: "Pulp Fiction".into(),
        description: "test".into(),
        genre: Genre { name: "Crime".into(), description: None },
        director: Director { name: "Quentin Tarantino".into(), bio: None, birth: None, death: None },
        image_path: None,
        featured: false,
    }
}

impl MockApi {
    fn with_favorites(favorites: &[Uuid]) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().favorites = favorites.to_vec();
        api
    }

    fn fail_next(&self, kind: FailWith) {
        self.state.lock().unwrap().fail_next = Some(kind);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn take_failure(state: &mut MockState) -> Option<ApiError> {
        state.fail_next.take().map(|kind| match kind {
            FailWith::Unauthorized => ApiError::Status(401),
            FailWith::ServerError => ApiError::Status(500),
        })
    }
}

#[async_trait]
impl MovieApi for MockApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("login");
        if let Some(e) = Self::take_failure(&mut state) {
            return Err(e);
        }
        Ok(LoginResponse { user: view(&state.favorites), token: "tok-1".into() })
    }

    async fn signup(&self, req: &SignupRequest) -> Result<UserView, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("signup");
        Ok(UserView {
            username: req.username.clone(),
            email: req.email.clone(),
            birthday: None,
            favorites: Vec::new(),
        })
    }

    async fn fetch_user(&self, _username: &str) -> Result<UserView, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_user");
        if let Some(e) = Self::take_failure(&mut state) {
            return Err(e);
        }
        Ok(view(&state.favorites))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_movies");
        if let Some(e) = Self::take_failure(&mut state) {
            return Err(e);
        }
        Ok(vec![sample_movie()])
    }

    async fn add_favorite(&self, _token: &str, _username: &str, movie_id: Uuid) -> Result<UserView, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("add_favorite");
        if let Some(e) = Self::take_failure(&mut state) {
            return Err(e);
        }
        if !state.favorites.contains(&movie_id) {
            state.favorites.push(movie_id);
        }
        Ok(view(&state.favorites))
    }

    async fn remove_favorite(&self, _token: &str, _username: &str, movie_id: Uuid) -> Result<UserView, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("remove_favorite");
        if let Some(e) = Self::take_failure(&mut state) {
            return Err(e);
        }
        state.favorites.retain(|id| *id != movie_id);
        Ok(view(&state.favorites))
    }
}

fn client_with(api: MockApi) -> SessionClient<MemoryStore, MockApi> {
    SessionClient::new(MemoryStore::new(), api)
}

// =============================================================================
// login / logout / restore
// =============================================================================

#[tokio::test]
async fn login_persists_session_under_both_keys() {
    let mut client = client_with(MockApi::default());
    client.login("alice1", "pw").await.unwrap();

    assert!(client.is_logged_in());
    assert_eq!(client.user().unwrap().username, "alice1");
    assert_eq!(client.store.get(KEY_TOKEN), Some("tok-1".into()));

    let persisted: UserView =
        serde_json::from_str(&client.store.get(KEY_USER).unwrap()).unwrap();
    assert_eq!(persisted.username, "alice1");
}

#[tokio::test]
async fn failed_login_is_uniform_and_leaves_prior_session_untouched() {
    let mut client = client_with(MockApi::default());
    client.login("alice1", "pw").await.unwrap();

    client.api.fail_next(FailWith::Unauthorized);
    let err = client.login("alice1", "wrong").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidCredentials));
    // One message for bad username and bad password alike.
    assert_eq!(err.to_string(), "invalid username or password");

    assert!(client.is_logged_in());
    assert_eq!(client.store.get(KEY_TOKEN), Some("tok-1".into()));
}

#[tokio::test]
async fn login_transport_failure_is_not_a_credentials_error() {
    let mut client = client_with(MockApi::default());
    client.api.fail_next(FailWith::ServerError);
    let err = client.login("alice1", "pw").await.unwrap_err();
    assert!(matches!(err, SessionError::Remote(_)));
}

#[tokio::test]
async fn logout_clears_memory_and_store_and_is_idempotent() {
    let mut client = client_with(MockApi::default());
    client.login("alice1", "pw").await.unwrap();

    client.logout();
    assert!(!client.is_logged_in());
    assert_eq!(client.store.get(KEY_USER), None);
    assert_eq!(client.store.get(KEY_TOKEN), None);

    // Logging out while logged out is fine.
    client.logout();
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn restore_recovers_session_and_refreshes_from_server() {
    let movie = Uuid::new_v4();
    let api = MockApi::with_favorites(&[movie]);
    let store = MemoryStore::new();
    store.set(KEY_TOKEN, "tok-1");
    store.set(KEY_USER, &serde_json::to_string(&view(&[])).unwrap());

    let mut client = SessionClient::new(store, api);
    assert!(client.restore().await);
    assert!(client.is_logged_in());
    // Refresh pulled the server-side favorites and the catalogue.
    assert!(client.is_favorite(movie));
    assert_eq!(client.movies().len(), 1);
    assert_eq!(client.api.calls(), vec!["list_movies", "fetch_user"]);
}

#[tokio::test]
async fn restore_without_token_starts_unauthenticated() {
    let store = MemoryStore::new();
    store.set(KEY_USER, &serde_json::to_string(&view(&[])).unwrap());

    let mut client = SessionClient::new(store, MockApi::default());
    assert!(!client.restore().await);
    assert!(!client.is_logged_in());
    assert!(client.api.calls().is_empty());
}

#[tokio::test]
async fn restore_with_corrupt_user_json_starts_unauthenticated() {
    let store = MemoryStore::new();
    store.set(KEY_TOKEN, "tok-1");
    store.set(KEY_USER, "{not json");

    let mut client = SessionClient::new(store, MockApi::default());
    assert!(!client.restore().await);
}

#[tokio::test]
async fn restore_keeps_persisted_view_when_refresh_fails() {
    let movie = Uuid::new_v4();
    let api = MockApi::default();
    api.fail_next(FailWith::ServerError);
    let store = MemoryStore::new();
    store.set(KEY_TOKEN, "tok-1");
    store.set(KEY_USER, &serde_json::to_string(&view(&[movie])).unwrap());

    let mut client = SessionClient::new(store, api);
    assert!(client.restore().await);
    assert!(client.is_logged_in());
    // Stale but present: the persisted favorites survive a failed refresh.
    assert!(client.is_favorite(movie));
}

// =============================================================================
// favorite toggles
// =============================================================================

#[tokio::test]
async fn toggle_direction_follows_local_state() {
    let movie = Uuid::new_v4();
    let mut client = client_with(MockApi::default());
    client.login("alice1", "pw").await.unwrap();

    client.toggle_favorite(movie).await.unwrap();
    assert!(client.is_favorite(movie));

    client.toggle_favorite(movie).await.unwrap();
    assert!(!client.is_favorite(movie));

    assert_eq!(client.api.calls(), vec!["login", "add_favorite", "remove_favorite"]);
}

#[tokio::test]
async fn toggle_adopts_server_returned_set_and_persists_it() {
    let movie = Uuid::new_v4();
    let preexisting = Uuid::new_v4();
    let api = MockApi::with_favorites(&[preexisting]);
    let mut client = client_with(api);
    client.login("alice1", "pw").await.unwrap();

    client.toggle_favorite(movie).await.unwrap();
    assert!(client.is_favorite(movie));
    assert!(client.is_favorite(preexisting));

    let persisted: UserView =
        serde_json::from_str(&client.store.get(KEY_USER).unwrap()).unwrap();
    assert!(persisted.favorites.contains(&movie));
}

#[tokio::test]
async fn failed_add_rolls_back_the_optimistic_insert() {
    let movie = Uuid::new_v4();
    let mut client = client_with(MockApi::default());
    client.login("alice1", "pw").await.unwrap();

    client.api.fail_next(FailWith::ServerError);
    let err = client.toggle_favorite(movie).await.unwrap_err();
    assert!(matches!(err, SessionError::Remote(_)));
    assert!(!client.is_favorite(movie), "optimistic insert must be compensated");
}

#[tokio::test]
async fn failed_remove_rolls_back_the_optimistic_removal() {
    let movie = Uuid::new_v4();
    let mut client = client_with(MockApi::with_favorites(&[movie]));
    client.login("alice1", "pw").await.unwrap();
    assert!(client.is_favorite(movie));

    client.api.fail_next(FailWith::ServerError);
    client.toggle_favorite(movie).await.unwrap_err();
    assert!(client.is_favorite(movie), "optimistic removal must be compensated");
}

#[tokio::test]
async fn toggle_while_one_is_in_flight_is_dropped() {
    let movie = Uuid::new_v4();
    let mut client = client_with(MockApi::default());
    client.login("alice1", "pw").await.unwrap();

    client.in_flight.insert(movie);
    client.toggle_favorite(movie).await.unwrap();
    assert!(!client.is_favorite(movie));
    assert_eq!(client.api.calls(), vec!["login"]);
}

#[tokio::test]
async fn toggle_when_logged_out_is_rejected() {
    let mut client = client_with(MockApi::default());
    let err = client.toggle_favorite(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SessionError::NotLoggedIn));
}
