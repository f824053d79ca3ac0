//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use store::CatalogLookup;

use super::{AppState, OrderStore};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of rows in the status table; `None` when the store is unreachable.
    pub order_statuses: Option<usize>,
}

/// GET /health: reports whether the store answers.
pub async fn check<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.order_service.store().list_statuses().await {
        Ok(statuses) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                order_statuses: Some(statuses.len()),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    order_statuses: None,
                }),
            )
        }
    }
}
