//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod order_details;
pub mod orders;

use domain::OrderService;
use store::{CatalogLookup, OrderRepository};

/// Storage a running server can be backed by.
pub trait OrderStore: OrderRepository + CatalogLookup + 'static {}

impl<T: OrderRepository + CatalogLookup + 'static> OrderStore for T {}

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub order_service: OrderService<S>,
}
