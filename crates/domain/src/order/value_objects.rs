//! Value objects for the order domain.

use common::{MedicineId, OrderId};
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Largest quantity a single line may carry (the column is a 32-bit integer).
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Money amount represented in cents to avoid floating point issues.
///
/// All order arithmetic is done on this 2-decimal fixed-point value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        (self.cents % 100).abs()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Sums amounts, returning `None` if any partial sum overflows.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().unsigned_abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

/// Composite identity of an order line.
///
/// Two lines with the same key are the same line, whatever their quantity or price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderLineKey {
    pub order_id: OrderId,
    pub medicine_id: MedicineId,
}

impl OrderLineKey {
    pub fn new(order_id: OrderId, medicine_id: MedicineId) -> Self {
        Self {
            order_id,
            medicine_id,
        }
    }
}

impl std::fmt::Display for OrderLineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.order_id, self.medicine_id)
    }
}

/// One line of an order: a medicine, how many, and the unit price it was sold at.
///
/// The unit price is a copy taken when the line was built; later catalog price
/// changes do not reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    key: OrderLineKey,
    medicine_name: String,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
}

impl OrderLine {
    /// Creates a new line. The quantity must be between 1 and [`MAX_LINE_QUANTITY`]
    /// and `unit_price * quantity` must fit in a [`Money`].
    pub fn new(
        key: OrderLineKey,
        medicine_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        if quantity == 0 || quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity {
                quantity: i64::from(quantity),
            });
        }

        let line_total = unit_price
            .checked_mul(quantity)
            .ok_or(OrderError::AmountOverflow)?;

        Ok(Self {
            key,
            medicine_name: medicine_name.into(),
            quantity,
            unit_price,
            line_total,
        })
    }

    pub fn key(&self) -> OrderLineKey {
        self.key
    }

    pub fn order_id(&self) -> OrderId {
        self.key.order_id
    }

    pub fn medicine_id(&self) -> MedicineId {
        self.key.medicine_id
    }

    pub fn medicine_name(&self) -> &str {
        &self.medicine_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    /// Moves the line under another order, keeping its medicine.
    pub(crate) fn reparent(&mut self, order_id: OrderId) {
        self.key.order_id = order_id;
    }
}
