use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    MedicineId, MedicineRow, OrderId, OrderLineRow, OrderRow, Result, StatusId, StatusRow,
    StoreError, UserId, UserRow, Version,
    store::{CatalogLookup, OrderRepository, validate_order_for_save},
};

#[derive(Debug, Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, OrderRow>,
    last_order_id: i64,
    medicines: HashMap<MedicineId, MedicineRow>,
    users: HashMap<UserId, UserRow>,
    statuses: BTreeMap<StatusId, StatusRow>,
}

/// In-memory store implementation for testing and local runs.
///
/// Provides the same interface as the PostgreSQL implementation. A save holds
/// the write lock for its whole duration, so an order and its lines are
/// replaced together.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose status table holds the standard vocabulary:
    /// 1 Pending, 2 Processing, 3 Completed, 4 Cancelled.
    pub fn with_default_statuses() -> Self {
        let statuses = [
            (1, "Pending"),
            (2, "Processing"),
            (3, "Completed"),
            (4, "Cancelled"),
        ]
        .into_iter()
        .map(|(id, name)| (StatusId::new(id), StatusRow::new(id, name)))
        .collect();

        Self {
            state: Arc::new(RwLock::new(MemoryState {
                statuses,
                ..MemoryState::default()
            })),
        }
    }

    /// Adds or replaces a medicine.
    pub async fn insert_medicine(&self, medicine: MedicineRow) {
        self.state
            .write()
            .await
            .medicines
            .insert(medicine.id, medicine);
    }

    /// Changes a medicine's catalog price. Returns false if the medicine is unknown.
    pub async fn set_medicine_price(&self, id: MedicineId, price_cents: i64) -> bool {
        match self.state.write().await.medicines.get_mut(&id) {
            Some(medicine) => {
                medicine.price_cents = price_cents;
                true
            }
            None => false,
        }
    }

    /// Adds or replaces a user.
    pub async fn insert_user(&self, user: UserRow) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Adds or replaces a status row.
    pub async fn insert_status(&self, status: StatusRow) {
        self.state.write().await.statuses.insert(status.id, status);
    }

    /// Removes a status row. Returns false if it did not exist.
    pub async fn remove_status(&self, id: StatusId) -> bool {
        self.state.write().await.statuses.remove(&id).is_some()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored lines across all orders.
    pub async fn line_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .values()
            .map(|o| o.lines.len())
            .sum()
    }
}

#[async_trait]
impl CatalogLookup for InMemoryStore {
    async fn find_medicine_by_id(&self, id: MedicineId) -> Result<Option<MedicineRow>> {
        Ok(self.state.read().await.medicines.get(&id).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_status_by_id(&self, id: StatusId) -> Result<Option<StatusRow>> {
        Ok(self.state.read().await.statuses.get(&id).cloned())
    }

    async fn find_status_by_name(&self, name: &str) -> Result<Option<StatusRow>> {
        Ok(self
            .state
            .read()
            .await
            .statuses
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_statuses(&self) -> Result<Vec<StatusRow>> {
        Ok(self.state.read().await.statuses.values().cloned().collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn next_order_id(&self) -> Result<OrderId> {
        let mut state = self.state.write().await;
        state.last_order_id += 1;
        Ok(OrderId::new(state.last_order_id))
    }

    async fn save(&self, order: &OrderRow, expected: Version) -> Result<Version> {
        validate_order_for_save(order)?;

        let mut state = self.state.write().await;

        let current = state.orders.get(&order.id).map(|o| o.version);
        match current {
            Some(_) if expected == Version::initial() => {
                return Err(StoreError::DuplicateOrder(order.id));
            }
            Some(actual) if actual != expected => {
                return Err(StoreError::ConcurrencyConflict {
                    order_id: order.id,
                    expected,
                    actual,
                });
            }
            None if expected != Version::initial() => {
                return Err(StoreError::ConcurrencyConflict {
                    order_id: order.id,
                    expected,
                    actual: Version::initial(),
                });
            }
            _ => {}
        }

        let new_version = expected.next();
        let mut stored = order.clone();
        stored.version = new_version;
        // Status name comes from the status table, as a join would.
        stored.status = order
            .status
            .as_ref()
            .and_then(|s| state.statuses.get(&s.id).cloned());

        state.last_order_id = state.last_order_id.max(order.id.get());
        state.orders.insert(order.id, stored);

        Ok(new_version)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderRow>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<OrderRow>> {
        Ok(self.state.read().await.orders.values().cloned().collect())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OrderRow>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn find_line(
        &self,
        order_id: OrderId,
        medicine_id: MedicineId,
    ) -> Result<Option<OrderLineRow>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .get(&order_id)
            .and_then(|o| o.lines.iter().find(|l| l.medicine_id == medicine_id))
            .cloned())
    }

    async fn find_lines_by_order(&self, order_id: OrderId) -> Result<Vec<OrderLineRow>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .get(&order_id)
            .map(|o| o.lines.clone())
            .unwrap_or_default())
    }

    async fn find_lines_by_medicine(&self, medicine_id: MedicineId) -> Result<Vec<OrderLineRow>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .flat_map(|o| o.lines.iter())
            .filter(|l| l.medicine_id == medicine_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: OrderId) -> Result<bool> {
        Ok(self.state.write().await.orders.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn order_row(id: OrderId, user: i64, lines: &[(i64, i32, i64)]) -> OrderRow {
        let lines: Vec<OrderLineRow> = lines
            .iter()
            .map(|&(medicine, quantity, price_cents)| OrderLineRow {
                order_id: id,
                medicine_id: MedicineId::new(medicine),
                medicine_name: format!("Medicine {medicine}"),
                quantity,
                price_cents,
            })
            .collect();
        let total = lines
            .iter()
            .map(|l| l.price_cents * i64::from(l.quantity))
            .sum();

        OrderRow {
            id,
            user_id: Some(UserId::new(user)),
            status: Some(StatusRow::new(1, "Pending")),
            shipping_address: Some("12 Main St".to_string()),
            total_amount_cents: total,
            created_at: Utc::now(),
            version: Version::initial(),
            lines,
        }
    }

    #[tokio::test]
    async fn next_order_id_is_monotonic() {
        let store = InMemoryStore::new();
        let a = store.next_order_id().await.unwrap();
        let b = store.next_order_id().await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn save_and_load_order() {
        let store = InMemoryStore::with_default_statuses();
        let id = store.next_order_id().await.unwrap();
        let row = order_row(id, 1, &[(7, 2, 1000), (9, 1, 500)]);

        let version = store.save(&row, Version::initial()).await.unwrap();
        assert_eq!(version, Version::first());

        let loaded = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 2);
        assert_eq!(loaded.total_amount_cents, 2500);
        assert_eq!(loaded.version, Version::first());
        assert_eq!(loaded.status.unwrap().name, "Pending");
    }

    #[tokio::test]
    async fn save_with_stale_version_conflicts() {
        let store = InMemoryStore::with_default_statuses();
        let id = store.next_order_id().await.unwrap();
        let row = order_row(id, 1, &[(7, 2, 1000)]);
        store.save(&row, Version::initial()).await.unwrap();
        store.save(&row, Version::first()).await.unwrap();

        let result = store.save(&row, Version::first()).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn insert_twice_is_duplicate() {
        let store = InMemoryStore::new();
        let id = store.next_order_id().await.unwrap();
        let row = order_row(id, 1, &[]);
        store.save(&row, Version::initial()).await.unwrap();

        let result = store.save(&row, Version::initial()).await;
        assert!(matches!(result, Err(StoreError::DuplicateOrder(_))));
    }

    #[tokio::test]
    async fn invalid_row_writes_nothing() {
        let store = InMemoryStore::new();
        let id = store.next_order_id().await.unwrap();
        let row = order_row(id, 1, &[(7, 2, 1000), (7, 1, 1000)]);

        assert!(store.save(&row, Version::initial()).await.is_err());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn delete_removes_lines() {
        let store = InMemoryStore::new();
        let id = store.next_order_id().await.unwrap();
        store
            .save(&order_row(id, 1, &[(7, 2, 1000)]), Version::initial())
            .await
            .unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert_eq!(store.line_count().await, 0);
        assert!(store.find_line(id, MedicineId::new(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lines_by_medicine_span_orders() {
        let store = InMemoryStore::new();
        for user in [1, 2] {
            let id = store.next_order_id().await.unwrap();
            store
                .save(&order_row(id, user, &[(7, 1, 1000), (8, 1, 200)]), Version::initial())
                .await
                .unwrap();
        }

        let lines = store
            .find_lines_by_medicine(MedicineId::new(7))
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);

        let owned = store.find_by_user(UserId::new(2)).await.unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn status_lookup_ignores_case() {
        let store = InMemoryStore::with_default_statuses();

        let status = store.find_status_by_name("processing").await.unwrap();
        assert_eq!(status.unwrap().id, StatusId::new(2));

        let status = store.find_status_by_name("CANCELLED").await.unwrap();
        assert_eq!(status.unwrap().id, StatusId::new(4));

        assert!(store.find_status_by_name("Shipped").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn medicine_price_can_change() {
        let store = InMemoryStore::new();
        store.insert_medicine(MedicineRow::new(7, "Ibuprofen", 1000)).await;

        assert!(store.set_medicine_price(MedicineId::new(7), 1500).await);
        assert!(!store.set_medicine_price(MedicineId::new(99), 1500).await);

        let medicine = store.find_medicine_by_id(MedicineId::new(7)).await.unwrap();
        assert_eq!(medicine.unwrap().price_cents, 1500);
    }

    #[tokio::test]
    async fn user_lookup_by_email() {
        let store = InMemoryStore::new();
        store
            .insert_user(UserRow::new(3, "Lan Nguyen", "lan@example.com"))
            .await;

        let user = store.find_user_by_email("lan@example.com").await.unwrap();
        assert_eq!(user.unwrap().id, UserId::new(3));
        assert!(store.find_user_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
