//! Persistence seam for the order aggregate.
//!
//! The domain layer talks to two traits: [`OrderRepository`] for durable
//! orders and their lines, and [`CatalogLookup`] for the read-only rows an
//! order references (medicines, users, statuses). Both are implemented by
//! [`InMemoryStore`] and [`PostgresStore`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod row;
pub mod store;

pub use common::{MedicineId, OrderId, StatusId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use row::{MedicineRow, OrderLineRow, OrderRow, StatusRow, UserRow, Version};
pub use store::{CatalogLookup, OrderRepository, validate_order_for_save};
