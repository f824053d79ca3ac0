use std::collections::HashSet;

use async_trait::async_trait;

use crate::{
    MedicineId, MedicineRow, OrderId, OrderLineRow, OrderRow, Result, StatusId, StatusRow,
    StoreError, UserId, UserRow, Version,
};

/// Read-only access to the rows an order refers to.
///
/// Every lookup is a snapshot; nothing returned here is kept live by the caller.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Finds a medicine by id.
    async fn find_medicine_by_id(&self, id: MedicineId) -> Result<Option<MedicineRow>>;

    /// Finds a user by id.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRow>>;

    /// Finds a user by email address (exact match).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>>;

    /// Finds a status row by id.
    async fn find_status_by_id(&self, id: StatusId) -> Result<Option<StatusRow>>;

    /// Finds a status row by name, ignoring ASCII case.
    async fn find_status_by_name(&self, name: &str) -> Result<Option<StatusRow>>;

    /// Returns every status row, ordered by id.
    async fn list_statuses(&self) -> Result<Vec<StatusRow>>;
}

/// Durable storage of orders and their lines.
///
/// An order and its lines are always written together: `save` either commits
/// the order row, the complete replacement line set and the new total, or
/// nothing at all.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Reserves a fresh order identity.
    async fn next_order_id(&self) -> Result<OrderId>;

    /// Persists the order and replaces all of its lines atomically.
    ///
    /// `expected` is the version the caller loaded. `Version::initial()` means
    /// the order is new and is inserted. Otherwise the stored version must
    /// match or `ConcurrencyConflict` is returned and nothing is written.
    ///
    /// Returns the order's new version.
    async fn save(&self, order: &OrderRow, expected: Version) -> Result<Version>;

    /// Loads an order with its lines.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderRow>>;

    /// Loads every order, ordered by id.
    async fn find_all(&self) -> Result<Vec<OrderRow>>;

    /// Loads every order owned by a user, ordered by id.
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OrderRow>>;

    /// Loads one line by its composite key.
    async fn find_line(
        &self,
        order_id: OrderId,
        medicine_id: MedicineId,
    ) -> Result<Option<OrderLineRow>>;

    /// Loads the lines of an order.
    async fn find_lines_by_order(&self, order_id: OrderId) -> Result<Vec<OrderLineRow>>;

    /// Loads every line, across all orders, that references a medicine.
    async fn find_lines_by_medicine(&self, medicine_id: MedicineId) -> Result<Vec<OrderLineRow>>;

    /// Deletes an order together with its lines.
    ///
    /// Returns false if the order did not exist.
    async fn delete(&self, id: OrderId) -> Result<bool>;
}

/// Validates an order row before it is saved.
///
/// Every line must belong to the order and no two lines may share a medicine.
pub fn validate_order_for_save(order: &OrderRow) -> Result<()> {
    let mut seen = HashSet::with_capacity(order.lines.len());

    for line in &order.lines {
        if line.order_id != order.id {
            return Err(StoreError::InvalidOrder(format!(
                "line for medicine {} belongs to order {}, not {}",
                line.medicine_id, line.order_id, order.id
            )));
        }
        if line.quantity <= 0 {
            return Err(StoreError::InvalidOrder(format!(
                "line for medicine {} has non-positive quantity {}",
                line.medicine_id, line.quantity
            )));
        }
        if !seen.insert(line.medicine_id) {
            return Err(StoreError::InvalidOrder(format!(
                "duplicate line for medicine {} in order {}",
                line.medicine_id, order.id
            )));
        }
    }

    Ok(())
}
