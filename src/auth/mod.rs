use axum::Router;

use crate::state::AppState;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
mod validate;

pub use claims::Claims;
pub use extractors::Session;

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "auth_token";

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
