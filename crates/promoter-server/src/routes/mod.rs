//! API routes.

pub mod applications;
pub mod health;
pub mod status;

use crate::AppState;
use axum::Router;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_router())
        .merge(health::router())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(status::router())
        .nest("/applications", applications::router())
}
