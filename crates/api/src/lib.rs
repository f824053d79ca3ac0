//! HTTP API server for pharmacy orders.
//!
//! Provides REST endpoints for orders and their lines, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use common::StatusId;
use domain::OrderService;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{AppState, OrderStore, order_details, orders};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders/all", get(orders::list_all::<S>))
        .route("/orders/add", post(orders::create::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/update/{id}", put(orders::update::<S>))
        .route("/orders/delete/{id}", delete(orders::delete::<S>))
        .route("/orders/user/{email}", get(orders::list_by_user::<S>))
        .route("/orders/confirm/{id}", put(orders::confirm::<S>))
        .route("/orders/complete/{id}", put(orders::complete::<S>))
        .route("/orders/cancel/{id}", put(orders::cancel::<S>))
        .route("/orderdetails", post(order_details::create::<S>))
        .route(
            "/orderdetails/{order_id}/{medicine_id}",
            get(order_details::get::<S>).delete(order_details::delete::<S>),
        )
        .route(
            "/orderdetails/order/{order_id}",
            get(order_details::list_by_order::<S>),
        )
        .route(
            "/orderdetails/medicine/{medicine_id}",
            get(order_details::list_by_medicine::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store.
pub fn create_default_state<S: OrderStore>(store: S, default_status: StatusId) -> Arc<AppState<S>> {
    Arc::new(AppState {
        order_service: OrderService::new(store).with_default_status(default_status),
    })
}
