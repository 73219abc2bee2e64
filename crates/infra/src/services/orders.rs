//! Order Engine: checkout and the order status machine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use storefront_core::{DomainError, OrderId, UserId};
use storefront_delivery::{Delivery, DeliveryStatus};
use storefront_orders::{Order, OrderDraft, OrderStatus};

use crate::clock::Clock;
use crate::error::CommerceResult;
use crate::services::catalog::available_product;
use crate::storage::{Storage, UnitOfWork};

/// Checkpoint reached after the order and its items are written.
pub const CHECKPOINT_ORDER_WRITTEN: &str = "checkout.order_written";
/// Checkpoint reached after the delivery row is written, before the cart is cleared.
pub const CHECKPOINT_DELIVERY_WRITTEN: &str = "checkout.delivery_written";

/// Move an order along one lifecycle edge inside an open transaction.
///
/// Payment settlement and delivery tracking call this so their own write and
/// the order change commit together. Entering `delivering` or `delivered`
/// also brings the delivery record to the matching stage.
pub(crate) fn transition_order(
    tx: &mut dyn UnitOfWork,
    order_id: OrderId,
    next: OrderStatus,
    at: DateTime<Utc>,
) -> CommerceResult<Order> {
    let mut order = tx.order(order_id).ok_or(DomainError::not_found("order"))?;
    let from = order.status();
    if let Err(err) = order.transition_to(next) {
        tracing::warn!(
            order_id = %order_id,
            from = %from,
            to = %next,
            "order transition rejected"
        );
        return Err(err.into());
    }
    tx.update_order(order.clone())?;
    sync_delivery(tx, order_id, next, at)?;
    Ok(order)
}

fn sync_delivery(
    tx: &mut dyn UnitOfWork,
    order_id: OrderId,
    next: OrderStatus,
    at: DateTime<Utc>,
) -> CommerceResult<()> {
    let Some(stage) = DeliveryStatus::for_order_status(next) else {
        return Ok(());
    };
    let mut delivery = tx
        .delivery(order_id)
        .ok_or(DomainError::not_found("delivery"))?;
    if delivery.status() == stage {
        return Ok(());
    }
    delivery.advance(stage, at)?;
    tx.update_delivery(delivery)?;
    Ok(())
}

pub struct OrderService<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> OrderService<S>
where
    S: Storage,
{
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Convert the user's cart into a pending order.
    ///
    /// Order, items, delivery row and cart clearing commit together or not at
    /// all. Prices are re-read from the catalog here; whatever the cart showed
    /// earlier does not matter.
    #[instrument(skip(self, comment))]
    pub fn checkout(
        &self,
        user_id: UserId,
        delivery_address: &str,
        comment: Option<&str>,
    ) -> CommerceResult<Order> {
        let now = self.clock.now();

        let order = self.storage.transaction(|tx| -> CommerceResult<Order> {
            let cart_items = tx.cart_items(user_id);
            if cart_items.is_empty() {
                return Err(DomainError::EmptyCart.into());
            }

            let mut draft = OrderDraft::new(user_id, delivery_address, comment)?;

            match tx.user(user_id) {
                Some(user) if user.is_active() => {}
                _ => return Err(DomainError::not_found("user").into()),
            }

            for item in &cart_items {
                let product = available_product(&*tx, item.product_id())
                    .ok_or(DomainError::ProductUnavailable(item.product_id()))?;
                draft.add_line(&product, item.quantity());
            }

            let order = draft.place(OrderId::new(), now)?;
            tx.insert_order(order.clone())?;
            tx.checkpoint(CHECKPOINT_ORDER_WRITTEN)?;

            tx.insert_delivery(Delivery::for_order(order.id_typed()))?;
            tx.checkpoint(CHECKPOINT_DELIVERY_WRITTEN)?;

            tx.clear_cart(user_id);
            Ok(order)
        })?;

        tracing::info!(
            order_id = %order.id_typed(),
            user_id = %user_id,
            items = order.items().len(),
            total = order.total_price(),
            "order placed"
        );
        Ok(order)
    }

    /// `pending → paid`. The payment ledger calls the same transition on settlement.
    #[instrument(skip(self))]
    pub fn mark_paid(&self, order_id: OrderId) -> CommerceResult<Order> {
        self.advance(order_id, OrderStatus::Paid)
    }

    /// Move an order along one edge of its lifecycle. The delivery record
    /// follows when the order enters `delivering` or `delivered`.
    #[instrument(skip(self))]
    pub fn advance(&self, order_id: OrderId, next: OrderStatus) -> CommerceResult<Order> {
        let now = self.clock.now();
        let order = self
            .storage
            .transaction(|tx| transition_order(tx, order_id, next, now))?;
        tracing::info!(order_id = %order_id, status = %order.status(), "order status changed");
        Ok(order)
    }

    /// `pending|paid → canceled`.
    #[instrument(skip(self))]
    pub fn cancel(&self, order_id: OrderId) -> CommerceResult<Order> {
        self.advance(order_id, OrderStatus::Canceled)
    }

    pub fn get_order(&self, order_id: OrderId) -> CommerceResult<Order> {
        let order = self.storage.read(|view| view.order(order_id))?;
        Ok(order.ok_or(DomainError::not_found("order"))?)
    }

    /// The user's orders, newest first.
    pub fn list_orders(&self, user_id: UserId) -> CommerceResult<Vec<Order>> {
        let mut orders = self.storage.read(|view| view.orders_for_user(user_id))?;
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(orders)
    }
}
