//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced order, user, medicine or line does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A foreign id was supplied but does not resolve.
    #[error("Invalid {entity} reference: {id}")]
    InvalidReference { entity: &'static str, id: String },

    /// A well-known status row is missing from the status table.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A mandatory field is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_reference(entity: &'static str, id: impl ToString) -> Self {
        DomainError::InvalidReference {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}
