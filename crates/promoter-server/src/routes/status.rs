//! Fleet status and checkout refresh endpoints.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use promoter_core::FleetStatus;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(fleet_status))
        .route("/status/pending", get(pending_status))
        .route("/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    /// Fetch from `origin` before computing status. Defaults to true.
    refresh: Option<bool>,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    revision: String,
}

async fn fleet_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<FleetStatus>, ApiError> {
    let checkout = state.checkout().await;
    if query.refresh.unwrap_or(true) {
        checkout.repo.refresh().await?;
    }
    let fleet = checkout.workflow.engine().release_status().await?;
    info!(pending = fleet.pending_count(), "Computed fleet status");
    Ok(Json(fleet))
}

async fn pending_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<FleetStatus>, ApiError> {
    let checkout = state.checkout().await;
    if query.refresh.unwrap_or(true) {
        checkout.repo.refresh().await?;
    }
    Ok(Json(checkout.workflow.engine().pending_releases().await?))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let checkout = state.checkout().await;
    let revision = checkout.repo.refresh().await?;
    Ok(Json(RefreshResponse { revision }))
}
