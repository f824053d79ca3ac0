//! Order line endpoints. Writes go through the order aggregate.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{MedicineId, OrderId};
use domain::AddLine;
use serde::Deserialize;

use super::orders::OrderDetailResponse;
use super::{AppState, OrderStore};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub order_id: Option<OrderId>,
    pub medicine_id: Option<MedicineId>,
    pub quantity: Option<i64>,
}

/// GET /orderdetails/{order_id}/{medicine_id}: one line by its composite key.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, medicine_id)): Path<(OrderId, MedicineId)>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let line = state.order_service.get_line(order_id, medicine_id).await?;
    Ok(Json(line.into()))
}

/// GET /orderdetails/order/{order_id}
#[tracing::instrument(skip(state))]
pub async fn list_by_order<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Vec<OrderDetailResponse>>, ApiError> {
    let lines = state.order_service.lines_for_order(order_id).await?;
    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

/// GET /orderdetails/medicine/{medicine_id}
#[tracing::instrument(skip(state))]
pub async fn list_by_medicine<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(medicine_id): Path<MedicineId>,
) -> Result<Json<Vec<OrderDetailResponse>>, ApiError> {
    let lines = state.order_service.lines_for_medicine(medicine_id).await?;
    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

/// POST /orderdetails: add a line to an order at the medicine's current price.
///
/// Adding a medicine the order already has returns the existing line.
#[tracing::instrument(skip(state))]
pub async fn create<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddLineRequest>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), ApiError> {
    let (Some(order_id), Some(medicine_id), Some(quantity)) =
        (req.order_id, req.medicine_id, req.quantity)
    else {
        return Err(ApiError::BadRequest(
            "order_id, medicine_id and quantity are required".to_string(),
        ));
    };

    let line = state
        .order_service
        .add_line(AddLine::new(order_id, medicine_id, quantity))
        .await?;
    Ok((StatusCode::CREATED, Json(line.into())))
}

/// DELETE /orderdetails/{order_id}/{medicine_id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, medicine_id)): Path<(OrderId, MedicineId)>,
) -> Result<StatusCode, ApiError> {
    state
        .order_service
        .remove_line(order_id, medicine_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
