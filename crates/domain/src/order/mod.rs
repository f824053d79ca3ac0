//! Order aggregate and related types.

mod aggregate;
mod commands;
mod line_builder;
mod service;
mod state;
mod value_objects;
mod view;

pub use aggregate::Order;
pub use commands::{AddLine, CreateOrder, UpdateOrder};
pub use line_builder::{BuiltLines, LineBuilder, LineRequest};
pub use service::{DEFAULT_STATUS_ID, OrderService};
pub use state::{OrderStatus, StatusRef, Transition};
pub use value_objects::{MAX_LINE_QUANTITY, Money, OrderLine, OrderLineKey};
pub use view::{OrderLineView, OrderView};

use thiserror::Error;

/// Errors raised by the order aggregate itself.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order's current status forbids the requested transition.
    #[error("Cannot {action} order in status {current}: {rule}")]
    IllegalTransition {
        current: String,
        action: &'static str,
        rule: &'static str,
    },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// An amount does not fit in the fixed-point money range.
    #[error("Order amount exceeds the supported money range")]
    AmountOverflow,

    /// The status row handed to a transition is not the transition's target.
    #[error("Status {name} is not a valid {expected} status")]
    UnexpectedTargetStatus {
        name: String,
        expected: OrderStatus,
    },
}
