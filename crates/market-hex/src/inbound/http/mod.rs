//! axum adapter: router, session extractors and request handlers.

pub mod auth;
mod handlers;
pub mod server;
mod upload;

pub use auth::{AdminUser, AuthUser, SESSION_COOKIE};
pub use server::{AppState, HttpServer, HttpServerConfig};
