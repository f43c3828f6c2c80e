//! Local JSON API over the infinity-todo store.

pub mod api;
pub mod dto;
pub mod error;
pub mod paths;

pub use api::{router, serve, AppState};
pub use error::ApiError;
