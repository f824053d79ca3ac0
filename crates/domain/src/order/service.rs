//! Order service coordinating the catalog, the line builder and the aggregate.

use chrono::Utc;
use common::{MedicineId, OrderId, StatusId};
use store::{CatalogLookup, OrderRepository, Version};

use crate::error::DomainError;

use super::{
    AddLine, CreateOrder, LineBuilder, LineRequest, Order, OrderLineKey, OrderLineView,
    OrderView, StatusRef, Transition, UpdateOrder,
};

/// Status id given to new orders when the caller does not name one.
pub const DEFAULT_STATUS_ID: StatusId = StatusId::new(1);

/// Service for managing orders.
///
/// Every mutating operation loads the aggregate, changes it through its own
/// methods and writes it back with a single `save`, so a failure at any step
/// leaves the stored order untouched.
pub struct OrderService<S> {
    store: S,
    default_status: StatusId,
}

impl<S: OrderRepository + CatalogLookup> OrderService<S> {
    /// Creates a new order service backed by the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_status: DEFAULT_STATUS_ID,
        }
    }

    /// Overrides the status id used when a create request names none.
    pub fn with_default_status(mut self, status_id: StatusId) -> Self {
        self.default_status = status_id;
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn default_status(&self) -> StatusId {
        self.default_status
    }

    /// Creates an order with its initial lines.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, cmd: CreateOrder) -> Result<OrderView, DomainError> {
        let user_id = cmd
            .user_id
            .ok_or_else(|| DomainError::Validation("User ID is required".to_string()))?;
        LineBuilder::<S>::validate(&cmd.items)?;

        let owner = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))?;

        let status_id = cmd.status_id.unwrap_or(self.default_status);
        let status = self
            .store
            .find_status_by_id(status_id)
            .await?
            .ok_or_else(|| {
                DomainError::Configuration(format!(
                    "status {status_id} is missing from the status table"
                ))
            })?;

        let order_id = self.store.next_order_id().await?;
        let mut order = Order::new(
            order_id,
            owner.id,
            status.into(),
            cmd.shipping_address,
            Utc::now(),
        );

        let built = LineBuilder::new(&self.store)
            .build(order_id, &cmd.items)
            .await?;
        order.set_lines(built.lines)?;

        let version = self.store.save(&order.to_row(), Version::initial()).await?;
        order.mark_saved(version);

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order_id,
            lines = order.line_count(),
            total = %order.total_amount(),
            "Order created"
        );

        Ok(OrderView::new(&order, Some(&owner)))
    }

    /// Replaces an order's owner, address, status and full line set.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, cmd: UpdateOrder) -> Result<OrderView, DomainError> {
        let mut order = self.load(cmd.order_id).await?;

        let status_id = cmd
            .status_id
            .ok_or_else(|| DomainError::Validation("Status ID is required".to_string()))?;
        LineBuilder::<S>::validate(&cmd.items)?;

        let status = self
            .store
            .find_status_by_id(status_id)
            .await?
            .ok_or_else(|| DomainError::invalid_reference("status", status_id))?;

        if let Some(user_id) = cmd.user_id {
            let owner = self
                .store
                .find_user_by_id(user_id)
                .await?
                .ok_or_else(|| DomainError::invalid_reference("user", user_id))?;
            order.set_owner(owner.id);
        }

        let built = LineBuilder::new(&self.store)
            .build(order.id(), &cmd.items)
            .await?;

        order.set_status(status.into());
        order.set_shipping_address(cmd.shipping_address);
        order.set_lines(built.lines)?;

        self.persist(&mut order).await?;

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            lines = order.line_count(),
            total = %order.total_amount(),
            "Order updated"
        );

        self.view(&order).await
    }

    /// Moves an order through the status state machine.
    #[tracing::instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        transition: Transition,
    ) -> Result<OrderView, DomainError> {
        let mut order = self.load(order_id).await?;

        if let Err(e) = order.ensure_transition(transition) {
            metrics::counter!("order_transition_rejected_total", "kind" => transition.as_str())
                .increment(1);
            return Err(e.into());
        }

        let target = transition.target();
        let status = self
            .store
            .find_status_by_name(target.as_str())
            .await?
            .ok_or_else(|| {
                DomainError::Configuration(format!(
                    "status {target} is missing from the status table"
                ))
            })?;

        order.apply_transition(transition, StatusRef::from(status))?;
        self.persist(&mut order).await?;

        metrics::counter!("order_transitions_total", "kind" => transition.as_str()).increment(1);
        tracing::info!(order_id = %order_id, %transition, status = %target, "Order transitioned");

        self.view(&order).await
    }

    /// Confirms a Pending order.
    pub async fn confirm(&self, order_id: OrderId) -> Result<OrderView, DomainError> {
        self.transition(order_id, Transition::Confirm).await
    }

    /// Completes a Processing order.
    pub async fn complete(&self, order_id: OrderId) -> Result<OrderView, DomainError> {
        self.transition(order_id, Transition::Complete).await
    }

    /// Cancels a Pending or Processing order.
    pub async fn cancel(&self, order_id: OrderId) -> Result<OrderView, DomainError> {
        self.transition(order_id, Transition::Cancel).await
    }

    /// Deletes an order and all of its lines.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.store.delete(order_id).await? {
            return Err(DomainError::not_found("Order", order_id));
        }

        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    /// Gets an order by id.
    pub async fn get(&self, order_id: OrderId) -> Result<OrderView, DomainError> {
        let order = self.load(order_id).await?;
        self.view(&order).await
    }

    /// Lists every order.
    pub async fn list_all(&self) -> Result<Vec<OrderView>, DomainError> {
        let rows = self.store.find_all().await?;
        self.views(rows).await
    }

    /// Lists the orders of the user with the given email.
    ///
    /// An unknown email yields an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_user(&self, email: &str) -> Result<Vec<OrderView>, DomainError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Ok(Vec::new());
        };

        let rows = self.store.find_by_user(user.id).await?;
        self.views(rows).await
    }

    /// Adds one line to an existing order, priced at the medicine's current price.
    ///
    /// If the order already has a line for the medicine, that line is returned
    /// unchanged and nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn add_line(&self, cmd: AddLine) -> Result<OrderLineView, DomainError> {
        let request = LineRequest::new(cmd.medicine_id, cmd.quantity);
        LineBuilder::<S>::validate(&[request])?;

        let mut order = self.load(cmd.order_id).await?;

        if let Some(existing) = order.line(cmd.medicine_id) {
            tracing::debug!(order_id = %cmd.order_id, medicine_id = %cmd.medicine_id, "Line already present");
            return Ok(OrderLineView::from(existing));
        }

        let built = LineBuilder::new(&self.store)
            .build(order.id(), &[request])
            .await?;
        let Some(line) = built.lines.into_iter().next() else {
            return Err(DomainError::invalid_reference("medicine", cmd.medicine_id));
        };

        let view = OrderLineView::from(&line);
        order.add_line(line)?;
        self.persist(&mut order).await?;

        tracing::info!(
            order_id = %cmd.order_id,
            medicine_id = %cmd.medicine_id,
            total = %order.total_amount(),
            "Line added"
        );

        Ok(view)
    }

    /// Removes one line from an order.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(
        &self,
        order_id: OrderId,
        medicine_id: MedicineId,
    ) -> Result<(), DomainError> {
        let mut order = self.load(order_id).await?;
        let key = OrderLineKey::new(order_id, medicine_id);

        if !order.remove_line(&key)? {
            return Err(DomainError::not_found("Order line", key));
        }

        self.persist(&mut order).await?;

        tracing::info!(
            order_id = %order_id,
            medicine_id = %medicine_id,
            total = %order.total_amount(),
            "Line removed"
        );
        Ok(())
    }

    /// Gets one line by its composite key.
    pub async fn get_line(
        &self,
        order_id: OrderId,
        medicine_id: MedicineId,
    ) -> Result<OrderLineView, DomainError> {
        self.store
            .find_line(order_id, medicine_id)
            .await?
            .map(OrderLineView::from)
            .ok_or_else(|| {
                DomainError::not_found("Order line", OrderLineKey::new(order_id, medicine_id))
            })
    }

    /// Lists the lines of an order.
    pub async fn lines_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLineView>, DomainError> {
        let rows = self.store.find_lines_by_order(order_id).await?;
        Ok(rows.into_iter().map(OrderLineView::from).collect())
    }

    /// Lists every line, across all orders, for a medicine.
    pub async fn lines_for_medicine(
        &self,
        medicine_id: MedicineId,
    ) -> Result<Vec<OrderLineView>, DomainError> {
        let rows = self.store.find_lines_by_medicine(medicine_id).await?;
        Ok(rows.into_iter().map(OrderLineView::from).collect())
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let row = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;

        Ok(Order::from_row(row)?)
    }

    async fn persist(&self, order: &mut Order) -> Result<(), DomainError> {
        let version = self.store.save(&order.to_row(), order.version()).await?;
        order.mark_saved(version);
        Ok(())
    }

    async fn view(&self, order: &Order) -> Result<OrderView, DomainError> {
        let owner = match order.user_id() {
            Some(user_id) => self.store.find_user_by_id(user_id).await?,
            None => None,
        };

        Ok(OrderView::new(order, owner.as_ref()))
    }

    async fn views(&self, rows: Vec<store::OrderRow>) -> Result<Vec<OrderView>, DomainError> {
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let order = Order::from_row(row)?;
            views.push(self.view(&order).await?);
        }
        Ok(views)
    }
}
