use thiserror::Error;

use crate::{OrderId, Version};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was modified by someone else since it was loaded.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// An insert was attempted for an order id that already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order row handed to `save` is internally inconsistent.
    #[error("Invalid order row: {0}")]
    InvalidOrder(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
