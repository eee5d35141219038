//! HTTP surface of the proxy.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, AppState};
pub use server::{serve, start_api_server};
