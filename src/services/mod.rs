//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.

pub mod catalog;
pub mod favorites;
pub mod password;
pub mod token;
pub mod users;
