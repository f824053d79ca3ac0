//! Order status state machine.

use common::StatusId;
use serde::{Deserialize, Serialize};
use store::StatusRow;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──confirm──► Processing ──complete──► Completed
///    │                     │
///    └──────cancel─────────┴──────────────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting confirmation.
    #[default]
    Pending,

    /// Order confirmed and being prepared or shipped.
    Processing,

    /// Order delivered (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Maps a status table name onto the vocabulary, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Returns true if the order can be confirmed in this status.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be completed in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Processing)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored in the status table.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    Confirm,
    Complete,
    Cancel,
}

impl Transition {
    /// The status an order ends up in after this transition.
    pub fn target(&self) -> OrderStatus {
        match self {
            Transition::Confirm => OrderStatus::Processing,
            Transition::Complete => OrderStatus::Completed,
            Transition::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Returns true if the transition may start from `current`.
    ///
    /// An order whose status is outside the vocabulary (`None`) allows nothing.
    pub fn is_allowed_from(&self, current: Option<OrderStatus>) -> bool {
        match (self, current) {
            (Transition::Confirm, Some(status)) => status.can_confirm(),
            (Transition::Complete, Some(status)) => status.can_complete(),
            (Transition::Cancel, Some(status)) => status.can_cancel(),
            (_, None) => false,
        }
    }

    /// The rule reported when the transition is rejected.
    pub fn rule(&self) -> &'static str {
        match self {
            Transition::Confirm => "only Pending orders can be confirmed",
            Transition::Complete => "only Processing orders can be completed",
            Transition::Cancel => "only Pending or Processing orders can be cancelled",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status row an order points at.
///
/// Rows are runtime data, so a row may carry a name outside [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub id: StatusId,
    pub name: String,
}

impl StatusRef {
    pub fn new(id: impl Into<StatusId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Maps the row onto the state machine vocabulary.
    pub fn state(&self) -> Option<OrderStatus> {
        OrderStatus::from_name(&self.name)
    }
}

impl From<StatusRow> for StatusRef {
    fn from(row: StatusRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<StatusRef> for StatusRow {
    fn from(status: StatusRef) -> Self {
        StatusRow {
            id: status.id,
            name: status.name,
        }
    }
}
