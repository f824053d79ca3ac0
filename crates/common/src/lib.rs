//! Shared types used across the pharmacy order crates.

pub mod types;

pub use types::{MedicineId, OrderId, StatusId, UserId};
