//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{MedicineId, OrderId, UserId};
use store::{OrderLineRow, OrderRow, Version};

use super::{
    Money, OrderError, OrderLine, OrderLineKey, OrderStatus, StatusRef, Transition,
};

/// Order aggregate root.
///
/// Owns its lines by value. Every method that changes the line set recomputes
/// the total before returning, so `total_amount()` always equals the sum of
/// `line_total()` over `lines()` and no two lines share a medicine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Identity assigned by the store; never changes.
    id: OrderId,

    /// Version the order was loaded at, for optimistic concurrency.
    version: Version,

    /// User who owns the order.
    user_id: Option<UserId>,

    /// Set once when the order is created.
    created_at: DateTime<Utc>,

    shipping_address: Option<String>,

    /// Current status row.
    status: Option<StatusRef>,

    /// Lines in insertion order.
    lines: Vec<OrderLine>,

    /// Sum of all line totals.
    total_amount: Money,
}

// Construction and persistence mapping
impl Order {
    /// Creates a new, never-persisted order with no lines and a zero total.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        status: StatusRef,
        shipping_address: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version: Version::initial(),
            user_id: Some(user_id),
            created_at,
            shipping_address,
            status: Some(status),
            lines: Vec::new(),
            total_amount: Money::zero(),
        }
    }

    /// Rebuilds an order from its persisted row.
    ///
    /// The stored total is taken as is.
    pub fn from_row(row: OrderRow) -> Result<Self, OrderError> {
        let lines = row
            .lines
            .into_iter()
            .map(line_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: row.id,
            version: row.version,
            user_id: row.user_id,
            created_at: row.created_at,
            shipping_address: row.shipping_address,
            status: row.status.map(StatusRef::from),
            lines,
            total_amount: Money::from_cents(row.total_amount_cents),
        })
    }

    /// Produces the row the store persists for this order.
    pub fn to_row(&self) -> OrderRow {
        OrderRow {
            id: self.id,
            user_id: self.user_id,
            status: self.status.clone().map(Into::into),
            shipping_address: self.shipping_address.clone(),
            total_amount_cents: self.total_amount.cents(),
            created_at: self.created_at,
            version: self.version,
            lines: self.lines.iter().map(line_to_row).collect(),
        }
    }

    /// Records the version the store assigned on a successful save.
    pub(crate) fn mark_saved(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn shipping_address(&self) -> Option<&str> {
        self.shipping_address.as_deref()
    }

    /// Returns the status row the order points at.
    pub fn status(&self) -> Option<&StatusRef> {
        self.status.as_ref()
    }

    /// Returns the status mapped onto the state machine, if the row's name is known.
    pub fn state(&self) -> Option<OrderStatus> {
        self.status.as_ref().and_then(StatusRef::state)
    }

    /// Returns all lines in insertion order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the line for a medicine.
    pub fn line(&self, medicine_id: MedicineId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.medicine_id() == medicine_id)
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total amount.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.state().is_some_and(|s| s.is_terminal())
    }
}

// Mutation methods
impl Order {
    pub fn set_owner(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    pub fn set_shipping_address(&mut self, shipping_address: Option<String>) {
        self.shipping_address = shipping_address;
    }

    /// Points the order at a status row directly, bypassing the state machine.
    ///
    /// Used by full-order updates, which carry an explicit status id.
    pub fn set_status(&mut self, status: StatusRef) {
        self.status = Some(status);
    }

    /// Replaces the entire line set.
    ///
    /// Lines are re-parented to this order. A medicine given more than once is
    /// stored once, with the last occurrence winning at the first position.
    /// If the new total overflows, the order is left unchanged.
    pub fn set_lines(
        &mut self,
        new_lines: impl IntoIterator<Item = OrderLine>,
    ) -> Result<(), OrderError> {
        let mut lines: Vec<OrderLine> = Vec::new();

        for mut line in new_lines {
            line.reparent(self.id);
            match lines.iter_mut().find(|l| l.key() == line.key()) {
                Some(existing) => *existing = line,
                None => lines.push(line),
            }
        }

        self.total_amount = total_of(&lines)?;
        self.lines = lines;
        Ok(())
    }

    /// Adds a line unless one with the same key already exists.
    ///
    /// Returns true if the line was added.
    pub fn add_line(&mut self, mut line: OrderLine) -> Result<bool, OrderError> {
        line.reparent(self.id);

        if self.lines.iter().any(|l| l.key() == line.key()) {
            return Ok(false);
        }

        self.total_amount = self
            .total_amount
            .checked_add(line.line_total())
            .ok_or(OrderError::AmountOverflow)?;
        self.lines.push(line);
        Ok(true)
    }

    /// Removes the line with the given key.
    ///
    /// Returns true if a line was removed.
    pub fn remove_line(&mut self, key: &OrderLineKey) -> Result<bool, OrderError> {
        let Some(index) = self.lines.iter().position(|l| l.key() == *key) else {
            return Ok(false);
        };

        let remaining: Vec<OrderLine> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, l)| l.clone())
            .collect();

        self.total_amount = total_of(&remaining)?;
        self.lines = remaining;
        Ok(true)
    }

    /// Checks whether a transition is allowed from the current status.
    pub fn ensure_transition(&self, transition: Transition) -> Result<(), OrderError> {
        if transition.is_allowed_from(self.state()) {
            Ok(())
        } else {
            Err(OrderError::IllegalTransition {
                current: self
                    .status
                    .as_ref()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "none".to_string()),
                action: transition.as_str(),
                rule: transition.rule(),
            })
        }
    }

    /// Moves the order to `target` via `transition`.
    ///
    /// `target` is the status row resolved for the transition's target status.
    pub fn apply_transition(
        &mut self,
        transition: Transition,
        target: StatusRef,
    ) -> Result<(), OrderError> {
        self.ensure_transition(transition)?;

        if target.state() != Some(transition.target()) {
            return Err(OrderError::UnexpectedTargetStatus {
                name: target.name,
                expected: transition.target(),
            });
        }

        self.status = Some(target);
        Ok(())
    }

    /// Confirms a Pending order.
    pub fn confirm(&mut self, processing: StatusRef) -> Result<(), OrderError> {
        self.apply_transition(Transition::Confirm, processing)
    }

    /// Completes a Processing order.
    pub fn complete(&mut self, completed: StatusRef) -> Result<(), OrderError> {
        self.apply_transition(Transition::Complete, completed)
    }

    /// Cancels a Pending or Processing order.
    pub fn cancel(&mut self, cancelled: StatusRef) -> Result<(), OrderError> {
        self.apply_transition(Transition::Cancel, cancelled)
    }
}

fn total_of(lines: &[OrderLine]) -> Result<Money, OrderError> {
    Money::checked_sum(lines.iter().map(OrderLine::line_total)).ok_or(OrderError::AmountOverflow)
}

fn line_from_row(row: OrderLineRow) -> Result<OrderLine, OrderError> {
    let quantity = u32::try_from(row.quantity).map_err(|_| OrderError::InvalidQuantity {
        quantity: i64::from(row.quantity),
    })?;

    OrderLine::new(
        OrderLineKey::new(row.order_id, row.medicine_id),
        row.medicine_name,
        quantity,
        Money::from_cents(row.price_cents),
    )
}

fn line_to_row(line: &OrderLine) -> OrderLineRow {
    OrderLineRow {
        order_id: line.order_id(),
        medicine_id: line.medicine_id(),
        medicine_name: line.medicine_name().to_string(),
        // bounded by MAX_LINE_QUANTITY
        quantity: line.quantity() as i32,
        price_cents: line.unit_price().cents(),
    }
}
