use serde::{Deserialize, Serialize};

/// Declares a surrogate-key newtype over a database integer.
///
/// Each identifier is its own type so an order id can never be passed where
/// a medicine id is expected, even though both are `BIGINT` columns.
macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident($raw:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($raw);

        impl $name {
            /// Wraps a raw key value.
            pub const fn new(value: $raw) -> Self {
                Self(value)
            }

            /// Returns the raw key value.
            pub const fn get(&self) -> $raw {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$raw> for $name {
            fn from(value: $raw) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $raw {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

surrogate_id!(
    /// Identifier of an order, assigned by the store when the order is first created.
    OrderId(i64)
);

surrogate_id!(
    /// Identifier of a medicine in the catalog.
    MedicineId(i64)
);

surrogate_id!(
    /// Identifier of a user (order owner).
    UserId(i64)
);

surrogate_id!(
    /// Identifier of a row in the order status table.
    StatusId(i32)
);
