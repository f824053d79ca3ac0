//! Order commands.

use common::{MedicineId, OrderId, StatusId, UserId};

use super::LineRequest;

/// Command to create a new order.
#[derive(Debug, Clone, Default)]
pub struct CreateOrder {
    /// The user placing the order. Required.
    pub user_id: Option<UserId>,

    pub shipping_address: Option<String>,

    /// Initial status; the service default is used when omitted.
    pub status_id: Option<StatusId>,

    /// Requested lines.
    pub items: Vec<LineRequest>,
}

impl CreateOrder {
    /// Creates a new CreateOrder command for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_shipping_address(mut self, shipping_address: impl Into<String>) -> Self {
        self.shipping_address = Some(shipping_address.into());
        self
    }

    pub fn with_status(mut self, status_id: StatusId) -> Self {
        self.status_id = Some(status_id);
        self
    }

    /// Adds a requested line.
    pub fn with_item(mut self, medicine_id: impl Into<MedicineId>, quantity: i64) -> Self {
        self.items.push(LineRequest::new(medicine_id, quantity));
        self
    }
}

/// Command to replace an order's owner, address, status and full line set.
#[derive(Debug, Clone)]
pub struct UpdateOrder {
    /// The order to update.
    pub order_id: OrderId,

    /// New owner; the current owner is kept when omitted.
    pub user_id: Option<UserId>,

    pub shipping_address: Option<String>,

    /// New status. Required; there is no default on update.
    pub status_id: Option<StatusId>,

    /// Replacement lines. Old lines are discarded, not diffed.
    pub items: Vec<LineRequest>,
}

impl UpdateOrder {
    /// Creates a new UpdateOrder command.
    pub fn new(order_id: OrderId, status_id: StatusId) -> Self {
        Self {
            order_id,
            user_id: None,
            shipping_address: None,
            status_id: Some(status_id),
            items: Vec::new(),
        }
    }

    pub fn with_owner(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_shipping_address(mut self, shipping_address: impl Into<String>) -> Self {
        self.shipping_address = Some(shipping_address.into());
        self
    }

    /// Adds a requested line.
    pub fn with_item(mut self, medicine_id: impl Into<MedicineId>, quantity: i64) -> Self {
        self.items.push(LineRequest::new(medicine_id, quantity));
        self
    }
}

/// Command to add a single line to an existing order.
#[derive(Debug, Clone, Copy)]
pub struct AddLine {
    /// The order to add the line to.
    pub order_id: OrderId,

    pub medicine_id: MedicineId,

    pub quantity: i64,
}

impl AddLine {
    /// Creates a new AddLine command.
    pub fn new(order_id: OrderId, medicine_id: MedicineId, quantity: i64) -> Self {
        Self {
            order_id,
            medicine_id,
            quantity,
        }
    }
}
