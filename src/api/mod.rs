//! HTTP API: routing, handlers, and wire models.

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{start_http_server, AppState};
