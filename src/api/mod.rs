//! HTTP API for the fact checker

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState, CheckRequest, HealthResponse};
pub use routes::build_router;
