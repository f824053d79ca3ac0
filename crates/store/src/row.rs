//! Plain row types exchanged between the domain layer and the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MedicineId, OrderId, StatusId, UserId};

/// Version stamp of a persisted order, used for optimistic concurrency control.
///
/// A never-persisted order is at version 0; every successful save bumps it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for an order that has never been saved.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1), held by an order after its first save.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A row of the order status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub id: StatusId,
    pub name: String,
}

impl StatusRow {
    pub fn new(id: impl Into<StatusId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A medicine as seen by order pricing: identity, display name and current price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineRow {
    pub id: MedicineId,
    pub name: String,
    pub price_cents: i64,
}

impl MedicineRow {
    pub fn new(id: impl Into<MedicineId>, name: impl Into<String>, price_cents: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_cents,
        }
    }
}

/// A user who can own orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
}

impl UserRow {
    pub fn new(id: impl Into<UserId>, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            email: email.into(),
        }
    }
}

/// One persisted order line, keyed by `(order_id, medicine_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRow {
    pub order_id: OrderId,
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i32,
    /// Unit price captured when the line was built.
    pub price_cents: i64,
}

/// A persisted order together with its full line set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub status: Option<StatusRow>,
    pub shipping_address: Option<String>,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub version: Version,
    pub lines: Vec<OrderLineRow>,
}
