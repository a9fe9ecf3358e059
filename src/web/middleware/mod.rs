//! Middleware and extractors for the Web API.

pub mod auth;
pub mod cors;

pub use auth::{AuthUser, JwtClaims, JwtState};
pub use cors::create_cors_layer;
