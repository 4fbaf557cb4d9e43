//! Session state machine.
//!
//! DESIGN
//! ======
//! The client is the source of truth for "am I logged in": it holds the
//! `{user, token}` pair in memory and mirrors it into the injected store so
//! a restart restores the session without re-login. The server is stateless
//! about sessions; nothing here is ever told a token was revoked, only that
//! a request was rejected.
//!
//! Favorite toggles are optimistic: the local set mutates first, the remote
//! call follows, and a remote failure re-applies the inverse mutation
//! instead of leaving the two copies silently diverged. At most one toggle
//! per movie is in flight at a time; re-triggers while one is outstanding
//! are dropped.

use std::collections::HashSet;

use uuid::Uuid;

use crate::client::api::{ApiError, MovieApi};
use crate::client::store::{KEY_TOKEN, KEY_USER, SessionStore};
use crate::services::catalog::Movie;
use crate::services::users::UserView;

#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Uniform credential failure: deliberately identical for unknown
    /// username and wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("request failed: {0}")]
    Remote(#[from] ApiError),
}

pub struct SessionClient<S: SessionStore, A: MovieApi> {
    store: S,
    api: A,
    session: Option<Session>,
    movies: Vec<Movie>,
    favorites: HashSet<Uuid>,
    /// Movie ids with a toggle currently outstanding.
    in_flight: HashSet<Uuid>,
}

impl<S: SessionStore, A: MovieApi> SessionClient<S, A> {
    /// Start unauthenticated. Call [`restore`](Self::restore) to pick up a
    /// persisted session.
    pub fn new(store: S, api: A) -> Self {
        Self {
            store,
            api,
            session: None,
            movies: Vec::new(),
            favorites: HashSet::new(),
            in_flight: HashSet::new(),
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserView> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    #[must_use]
    pub fn is_favorite(&self, movie_id: Uuid) -> bool {
        self.favorites.contains(&movie_id)
    }

    fn adopt(&mut self, user: UserView, token: String) {
        self.favorites = user.favorites.iter().copied().collect();
        self.session = Some(Session { user, token });
    }

    fn persist_session(&self) {
        if let Some(session) = &self.session {
            self.store.set(KEY_TOKEN, &session.token);
            self.persist_user();
        }
    }

    fn persist_user(&self) {
        let Some(session) = &self.session else { return };
        match serde_json::to_string(&session.user) {
            Ok(json) => self.store.set(KEY_USER, &json),
            Err(e) => tracing::warn!(error = %e, "user view serialization failed"),
        }
    }

    /// Restore a persisted session, if any, then refresh the catalogue and
    /// favorites from the server. Returns whether the client ended up
    /// logged in. A refresh failure downgrades to stale local data, not to
    /// a logout.
    pub async fn restore(&mut self) -> bool {
        let token = self.store.get(KEY_TOKEN);
        let user = self
            .store
            .get(KEY_USER)
            .and_then(|json| serde_json::from_str::<UserView>(&json).ok());

        let (Some(token), Some(user)) = (token, user) else {
            return false;
        };

        self.adopt(user, token);
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "session refresh failed; keeping persisted view");
        }
        true
    }

    /// Re-fetch the catalogue and the user's server-held favorite set.
    ///
    /// # Errors
    ///
    /// Returns the first failing remote call; local state keeps whatever
    /// was already loaded.
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        let username = self.user().ok_or(SessionError::NotLoggedIn)?.username.clone();

        self.movies = self.api.list_movies().await?;
        let user = self.api.fetch_user(&username).await?;
        self.favorites = user.favorites.iter().copied().collect();
        if let Some(session) = &mut self.session {
            session.user = user;
        }
        self.persist_user();
        Ok(())
    }

    /// Authenticate and persist the session. On failure the prior session,
    /// if any, is left untouched.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for any credential rejection (uniform across
    /// unknown username and wrong password), `Remote` for transport or
    /// server failures.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        let response = self.api.login(username, password).await.map_err(|e| {
            if e.is_unauthorized() {
                SessionError::InvalidCredentials
            } else {
                SessionError::Remote(e)
            }
        })?;

        self.adopt(response.user, response.token);
        self.persist_session();
        Ok(())
    }

    /// Drop the in-memory and persisted session. Never fails; clearing an
    /// already-empty session is a no-op.
    pub fn logout(&mut self) {
        self.session = None;
        self.favorites.clear();
        self.in_flight.clear();
        self.store.remove(KEY_USER);
        self.store.remove(KEY_TOKEN);
    }

    /// Toggle membership of `movie_id` in the favorite set: optimistic
    /// local flip, then the matching remote call. On remote failure the
    /// local flip is compensated and the error surfaced. A toggle for a
    /// movie that already has one outstanding is dropped.
    ///
    /// # Errors
    ///
    /// `NotLoggedIn` without a session, `Remote` when the server call
    /// fails (after the local rollback).
    pub async fn toggle_favorite(&mut self, movie_id: Uuid) -> Result<(), SessionError> {
        let Some(session) = &self.session else {
            return Err(SessionError::NotLoggedIn);
        };
        if self.in_flight.contains(&movie_id) {
            return Ok(());
        }

        let token = session.token.clone();
        let username = session.user.username.clone();
        let adding = !self.favorites.contains(&movie_id);

        // Optimistic flip, remote call, compensate on failure.
        if adding {
            self.favorites.insert(movie_id);
        } else {
            self.favorites.remove(&movie_id);
        }
        self.in_flight.insert(movie_id);

        let result = if adding {
            self.api.add_favorite(&token, &username, movie_id).await
        } else {
            self.api.remove_favorite(&token, &username, movie_id).await
        };
        self.in_flight.remove(&movie_id);

        match result {
            Ok(user) => {
                self.favorites = user.favorites.iter().copied().collect();
                if let Some(session) = &mut self.session {
                    session.user = user;
                }
                self.persist_user();
                Ok(())
            }
            Err(e) => {
                if adding {
                    self.favorites.remove(&movie_id);
                } else {
                    self.favorites.insert(movie_id);
                }
                Err(SessionError::Remote(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
