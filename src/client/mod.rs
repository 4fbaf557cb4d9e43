//! Session client — the consumer-side half of the favorites subsystem.
//!
//! ARCHITECTURE
//! ============
//! Three seams, each swappable in tests: a durable key/value store for the
//! persisted session (`store`), an API port over the REST surface (`api`),
//! and the session state machine itself (`session`), which owns login,
//! logout, restore-on-start, and the optimistic favorite toggle.

pub mod api;
pub mod session;
pub mod store;

pub use api::{ApiError, HttpApi, MovieApi};
pub use session::{Session, SessionClient, SessionError};
pub use store::{FileStore, MemoryStore, SessionStore};
