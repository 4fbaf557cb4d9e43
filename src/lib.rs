//! Movie catalogue API with session-authenticated favorites, plus the
//! matching client-side session library.

pub mod client;
pub mod db;
pub mod routes;
pub mod services;
pub mod state;
