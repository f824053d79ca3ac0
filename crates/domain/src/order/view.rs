//! Read models handed to callers of the order service.

use chrono::{DateTime, Utc};
use common::{MedicineId, OrderId, StatusId, UserId};
use serde::Serialize;
use store::{OrderLineRow, UserRow};

use super::{Money, Order, OrderLine};

/// A fully hydrated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub status_id: Option<StatusId>,
    pub status_name: Option<String>,
    pub shipping_address: Option<String>,
    pub lines: Vec<OrderLineView>,
}

impl OrderView {
    /// Builds the view of an order. `owner` is the resolved owning user, if any.
    pub fn new(order: &Order, owner: Option<&UserRow>) -> Self {
        Self {
            order_id: order.id(),
            user_id: order.user_id(),
            user_name: owner.map(|u| u.full_name.clone()),
            total_amount: order.total_amount(),
            created_at: order.created_at(),
            status_id: order.status().map(|s| s.id),
            status_name: order.status().map(|s| s.name.clone()),
            shipping_address: order.shipping_address().map(str::to_string),
            lines: order.lines().iter().map(OrderLineView::from).collect(),
        }
    }
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineView {
    pub order_id: OrderId,
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i64,
    pub price: Money,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            order_id: line.order_id(),
            medicine_id: line.medicine_id(),
            medicine_name: line.medicine_name().to_string(),
            quantity: i64::from(line.quantity()),
            price: line.unit_price(),
        }
    }
}

impl From<OrderLineRow> for OrderLineView {
    fn from(row: OrderLineRow) -> Self {
        Self {
            order_id: row.order_id,
            medicine_id: row.medicine_id,
            medicine_name: row.medicine_name,
            quantity: i64::from(row.quantity),
            price: Money::from_cents(row.price_cents),
        }
    }
}
