//! Turns requested (medicine, quantity) pairs into priced order lines.

use common::{MedicineId, OrderId};
use serde::{Deserialize, Serialize};
use store::CatalogLookup;

use crate::error::DomainError;

use super::{MAX_LINE_QUANTITY, Money, OrderError, OrderLine, OrderLineKey};

/// A requested line: which medicine and how many.
///
/// The quantity is signed so that zero and negative requests reach validation
/// instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub medicine_id: MedicineId,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(medicine_id: impl Into<MedicineId>, quantity: i64) -> Self {
        Self {
            medicine_id: medicine_id.into(),
            quantity,
        }
    }
}

/// Output of [`LineBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct BuiltLines {
    /// Lines for every medicine that resolved, in request order.
    pub lines: Vec<OrderLine>,

    /// Sum of the built lines' totals.
    pub total: Money,

    /// Medicines that did not resolve and were left out.
    pub skipped: Vec<MedicineId>,
}

/// Resolves and prices requested lines against the catalog.
pub struct LineBuilder<'a, C: ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogLookup + ?Sized> LineBuilder<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Checks every requested quantity without touching the catalog.
    pub fn validate(requests: &[LineRequest]) -> Result<(), OrderError> {
        requests.iter().try_for_each(|r| checked_quantity(r.quantity).map(drop))
    }

    /// Builds lines for `order_id`, pricing each at the medicine's current price.
    ///
    /// Medicines that do not exist are skipped rather than failing the whole
    /// request; they are reported in [`BuiltLines::skipped`].
    #[tracing::instrument(skip(self, requests), fields(requested = requests.len()))]
    pub async fn build(
        &self,
        order_id: OrderId,
        requests: &[LineRequest],
    ) -> Result<BuiltLines, DomainError> {
        Self::validate(requests)?;

        let mut built = BuiltLines::default();

        for request in requests {
            let Some(medicine) = self.catalog.find_medicine_by_id(request.medicine_id).await?
            else {
                tracing::warn!(
                    order_id = %order_id,
                    medicine_id = %request.medicine_id,
                    "Skipping line for unknown medicine"
                );
                metrics::counter!("order_lines_skipped_total").increment(1);
                built.skipped.push(request.medicine_id);
                continue;
            };

            let line = OrderLine::new(
                OrderLineKey::new(order_id, medicine.id),
                medicine.name,
                checked_quantity(request.quantity)?,
                Money::from_cents(medicine.price_cents),
            )?;

            built.total = built
                .total
                .checked_add(line.line_total())
                .ok_or(OrderError::AmountOverflow)?;
            built.lines.push(line);
        }

        Ok(built)
    }
}

fn checked_quantity(quantity: i64) -> Result<u32, OrderError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0 && *q <= MAX_LINE_QUANTITY)
        .ok_or(OrderError::InvalidQuantity { quantity })
}

#[cfg(test)]
mod tests {
    use store::{InMemoryStore, MedicineRow};

    use super::*;

    async fn catalog() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_medicine(MedicineRow::new(7, "Paracetamol 500mg", 1000))
            .await;
        store.insert_medicine(MedicineRow::new(9, "Vitamin C", 500)).await;
        store
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        assert!(LineBuilder::<InMemoryStore>::validate(&[LineRequest::new(7, 1)]).is_ok());

        for quantity in [0, -3, i64::from(MAX_LINE_QUANTITY) + 1] {
            let result = LineBuilder::<InMemoryStore>::validate(&[LineRequest::new(7, quantity)]);
            assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
        }
    }

    #[tokio::test]
    async fn test_build_prices_at_current_price() {
        let store = catalog().await;
        let builder = LineBuilder::new(&store);

        let built = builder
            .build(
                OrderId::new(1),
                &[LineRequest::new(7, 2), LineRequest::new(9, 1)],
            )
            .await
            .unwrap();

        assert_eq!(built.lines.len(), 2);
        assert_eq!(built.total, Money::from_cents(2500));
        assert_eq!(built.lines[0].medicine_name(), "Paracetamol 500mg");
        assert_eq!(built.lines[1].order_id(), OrderId::new(1));
        assert!(built.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_build_skips_unknown_medicine() {
        let store = catalog().await;
        let builder = LineBuilder::new(&store);

        let built = builder
            .build(
                OrderId::new(1),
                &[LineRequest::new(7, 1), LineRequest::new(404, 5)],
            )
            .await
            .unwrap();

        assert_eq!(built.lines.len(), 1);
        assert_eq!(built.total, Money::from_cents(1000));
        assert_eq!(built.skipped, vec![MedicineId::new(404)]);
    }

    #[tokio::test]
    async fn test_build_rejects_before_lookup() {
        let store = catalog().await;
        let builder = LineBuilder::new(&store);

        let result = builder
            .build(
                OrderId::new(1),
                &[LineRequest::new(7, 1), LineRequest::new(9, 0)],
            )
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidQuantity { quantity: 0 }))
        ));
    }
}
