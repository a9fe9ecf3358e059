//! HTTP API for filenest.
//!
//! Exposes account, file and backup operations as a JSON API authenticated
//! with bearer tokens, and optionally serves the browser front end.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
