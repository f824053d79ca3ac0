//! Order endpoints: create, update, status transitions, delete and queries.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{MedicineId, OrderId, StatusId, UserId};
use domain::{CreateOrder, LineRequest, OrderLineView, OrderView, UpdateOrder};
use serde::{Deserialize, Serialize};

use super::{AppState, OrderStore};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub user_id: Option<UserId>,
    pub status_id: Option<StatusId>,
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub medicine_id: MedicineId,
    pub quantity: i64,
}

impl OrderRequest {
    fn line_requests(&self) -> Vec<LineRequest> {
        self.items
            .iter()
            .map(|item| LineRequest::new(item.medicine_id, item.quantity))
            .collect()
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub status_id: Option<StatusId>,
    pub status_name: Option<String>,
    pub shipping_address: Option<String>,
    pub order_details: Vec<OrderDetailResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub order_id: OrderId,
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        Self {
            order_id: view.order_id,
            user_id: view.user_id,
            user_name: view.user_name,
            total_amount_cents: view.total_amount.cents(),
            created_at: view.created_at,
            status_id: view.status_id,
            status_name: view.status_name,
            shipping_address: view.shipping_address,
            order_details: view
                .lines
                .into_iter()
                .map(OrderDetailResponse::from)
                .collect(),
        }
    }
}

impl From<OrderLineView> for OrderDetailResponse {
    fn from(line: OrderLineView) -> Self {
        Self {
            order_id: line.order_id,
            medicine_id: line.medicine_id,
            medicine_name: line.medicine_name,
            quantity: line.quantity,
            price_cents: line.price.cents(),
        }
    }
}

fn to_responses(views: Vec<OrderView>) -> Vec<OrderResponse> {
    views.into_iter().map(OrderResponse::from).collect()
}

// -- Handlers --

/// GET /orders/all: list every order.
#[tracing::instrument(skip(state))]
pub async fn list_all<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_service.list_all().await?;
    Ok(Json(to_responses(orders)))
}

/// GET /orders/{id}: load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.get(id).await?;
    Ok(Json(order.into()))
}

/// POST /orders/add: create an order with its lines.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cmd = CreateOrder {
        user_id: req.user_id,
        shipping_address: req.shipping_address.clone(),
        status_id: req.status_id,
        items: req.line_requests(),
    };

    let order = state.order_service.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// PUT /orders/update/{id}: replace an order's fields and full line set.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let cmd = UpdateOrder {
        order_id: id,
        user_id: req.user_id,
        shipping_address: req.shipping_address.clone(),
        status_id: req.status_id,
        items: req.line_requests(),
    };

    let order = state.order_service.update(cmd).await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/delete/{id}: remove an order and its lines.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, ApiError> {
    state.order_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /orders/user/{email}: orders owned by a user; empty for an unknown email.
#[tracing::instrument(skip(state))]
pub async fn list_by_user<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_service.list_by_user(&email).await?;
    Ok(Json(to_responses(orders)))
}

/// PUT /orders/confirm/{id}: Pending to Processing.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.confirm(id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/complete/{id}: Processing to Completed.
#[tracing::instrument(skip(state))]
pub async fn complete<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.complete(id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/cancel/{id}: Pending or Processing to Cancelled.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.cancel(id).await?;
    Ok(Json(order.into()))
}
