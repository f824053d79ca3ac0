//! Domain layer for pharmacy orders.
//!
//! This crate provides:
//! - The Order aggregate, owning its lines and keeping the total consistent
//! - The order status state machine
//! - The line builder that prices requested lines against the catalog
//! - `OrderService`, the only entry point external callers use

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{
    AddLine, BuiltLines, CreateOrder, DEFAULT_STATUS_ID, LineBuilder, LineRequest, Money, Order,
    OrderError, OrderLine, OrderLineKey, OrderLineView, OrderService, OrderStatus, OrderView,
    StatusRef, Transition, UpdateOrder,
};
