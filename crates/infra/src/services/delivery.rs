//! Delivery Tracker: courier assignment and delivery progress.

use std::sync::Arc;

use tracing::instrument;

use storefront_core::{DomainError, OrderId};
use storefront_delivery::{Delivery, DeliveryStatus};
use storefront_orders::OrderStatus;

use crate::clock::Clock;
use crate::error::CommerceResult;
use crate::services::orders::transition_order;
use crate::storage::Storage;

pub struct DeliveryTracker<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> DeliveryTracker<S>
where
    S: Storage,
{
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Set or replace the courier. Closed once delivered or once the order is
    /// canceled.
    #[instrument(skip(self, phone))]
    pub fn assign_courier(
        &self,
        order_id: OrderId,
        name: &str,
        phone: Option<&str>,
    ) -> CommerceResult<Delivery> {
        let delivery = self.storage.transaction(|tx| -> CommerceResult<Delivery> {
            let mut delivery = tx
                .delivery(order_id)
                .ok_or(DomainError::not_found("delivery"))?;
            let order = tx.order(order_id).ok_or(DomainError::not_found("order"))?;
            if order.status() == OrderStatus::Canceled {
                return Err(DomainError::invalid_state(
                    "cannot assign a courier to a canceled order",
                )
                .into());
            }
            delivery.assign_courier(name, phone)?;
            tx.update_delivery(delivery.clone())?;
            Ok(delivery)
        })?;

        tracing::info!(
            order_id = %order_id,
            courier = delivery.courier_name().unwrap_or_default(),
            "courier assigned"
        );
        Ok(delivery)
    }

    /// Step the delivery forward and move the order with it.
    ///
    /// `on_the_way` takes a paid order to `delivering`; `delivered` takes it to
    /// `delivered`. If the order cannot follow, nothing is written.
    #[instrument(skip(self))]
    pub fn advance(&self, order_id: OrderId, next: DeliveryStatus) -> CommerceResult<Delivery> {
        let now = self.clock.now();
        let delivery = self.storage.transaction(|tx| -> CommerceResult<Delivery> {
            let mut delivery = tx
                .delivery(order_id)
                .ok_or(DomainError::not_found("delivery"))?;
            delivery.advance(next, now)?;
            tx.update_delivery(delivery.clone())?;

            if let Some(order_status) = next.order_status() {
                transition_order(tx, order_id, order_status, now)?;
            }
            Ok(delivery)
        })?;

        tracing::info!(
            order_id = %order_id,
            status = %delivery.status(),
            "delivery advanced"
        );
        Ok(delivery)
    }

    pub fn get_delivery(&self, order_id: OrderId) -> CommerceResult<Delivery> {
        let delivery = self.storage.read(|view| view.delivery(order_id))?;
        Ok(delivery.ok_or(DomainError::not_found("delivery"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use chrono::{Duration, Utc};
    use storefront_cart::QuantityPolicy;
    use storefront_catalog::NewProduct;
    use storefront_core::UserId;
    use storefront_customers::UserProfile;
    use storefront_orders::Order;

    use crate::clock::ManualClock;
    use crate::error::CommerceError;
    use crate::services::{CartService, CatalogService, CustomerDirectory, OrderService};
    use crate::storage::InMemoryStorage;

    struct Fixture {
        clock: Arc<ManualClock>,
        orders: OrderService<InMemoryStorage>,
        tracker: DeliveryTracker<InMemoryStorage>,
        order: Order,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let catalog = CatalogService::new(storage.clone());
        let cart = CartService::new(storage.clone(), QuantityPolicy::default());
        let customers = CustomerDirectory::new(storage.clone(), clock.clone());
        let orders = OrderService::new(storage.clone(), clock.clone());
        let tracker = DeliveryTracker::new(storage, clock.clone());

        let user = UserId::new(3);
        customers
            .register(UserProfile {
                id: user,
                username: None,
                first_name: "Ann".to_string(),
                last_name: None,
                phone: None,
            })
            .unwrap();
        let menu = catalog.create_category("Menu").unwrap();
        let tea = catalog
            .create_product(NewProduct {
                category_id: menu.id_typed(),
                name: "Tea".to_string(),
                description: None,
                price: 200,
                image: None,
                ingredient_ids: BTreeSet::new(),
            })
            .unwrap();
        cart.add_item(user, tea.id_typed(), 1).unwrap();
        let order = orders.checkout(user, "1 Main St", None).unwrap();

        Fixture {
            clock,
            orders,
            tracker,
            order,
        }
    }

    #[test]
    fn checkout_creates_a_preparing_delivery() {
        let f = fixture();
        let delivery = f.tracker.get_delivery(f.order.id_typed()).unwrap();
        assert_eq!(delivery.status(), DeliveryStatus::Preparing);
        assert_eq!(delivery.order_id(), f.order.id_typed());
    }

    #[test]
    fn dispatch_requires_a_paid_order() {
        let f = fixture();
        let id = f.order.id_typed();
        assert_eq!(
            f.tracker.advance(id, DeliveryStatus::OnTheWay),
            Err(CommerceError::Domain(DomainError::transition(
                "pending",
                "delivering"
            )))
        );
        assert_eq!(
            f.tracker.get_delivery(id).unwrap().status(),
            DeliveryStatus::Preparing
        );
    }

    #[test]
    fn full_delivery_moves_the_order_along() {
        let f = fixture();
        let id = f.order.id_typed();
        f.orders.mark_paid(id).unwrap();

        f.tracker.assign_courier(id, "Bob", Some("+1 555")).unwrap();
        f.tracker.advance(id, DeliveryStatus::OnTheWay).unwrap();
        assert_eq!(f.orders.get_order(id).unwrap().status(), OrderStatus::Delivering);

        f.clock.advance(Duration::minutes(30));
        let delivered = f.tracker.advance(id, DeliveryStatus::Delivered).unwrap();
        assert_eq!(delivered.delivered_at(), Some(f.clock.now()));
        assert_eq!(delivered.courier_name(), Some("Bob"));
        assert_eq!(f.orders.get_order(id).unwrap().status(), OrderStatus::Delivered);

        assert!(matches!(
            f.tracker.assign_courier(id, "Eve", None),
            Err(CommerceError::Domain(DomainError::InvalidState(_)))
        ));
    }

    #[test]
    fn skipping_a_stage_fails() {
        let f = fixture();
        let id = f.order.id_typed();
        f.orders.mark_paid(id).unwrap();
        assert_eq!(
            f.tracker.advance(id, DeliveryStatus::Delivered),
            Err(CommerceError::Domain(DomainError::transition(
                "preparing",
                "delivered"
            )))
        );
        assert_eq!(f.orders.get_order(id).unwrap().status(), OrderStatus::Paid);
    }

    #[test]
    fn canceled_order_cannot_be_dispatched() {
        let f = fixture();
        let id = f.order.id_typed();
        f.orders.cancel(id).unwrap();
        assert!(f.tracker.advance(id, DeliveryStatus::OnTheWay).is_err());
        assert_eq!(
            f.tracker.get_delivery(id).unwrap().status(),
            DeliveryStatus::Preparing
        );
    }

    #[test]
    fn unknown_order_has_no_delivery() {
        let f = fixture();
        assert_eq!(
            f.tracker.get_delivery(OrderId::new()),
            Err(CommerceError::Domain(DomainError::NotFound("delivery")))
        );
    }

    #[test]
    fn order_engine_advance_keeps_delivery_in_step() {
        let f = fixture();
        let id = f.order.id_typed();
        f.orders.mark_paid(id).unwrap();

        f.orders.advance(id, OrderStatus::Delivering).unwrap();
        assert_eq!(
            f.tracker.get_delivery(id).unwrap().status(),
            DeliveryStatus::OnTheWay
        );

        f.clock.advance(Duration::minutes(10));
        let delivered = f.tracker.advance(id, DeliveryStatus::Delivered).unwrap();
        assert_eq!(delivered.delivered_at(), Some(f.clock.now()));
        assert_eq!(f.orders.get_order(id).unwrap().status(), OrderStatus::Delivered);
    }

    #[test]
    fn order_engine_can_finish_the_delivery_itself() {
        let f = fixture();
        let id = f.order.id_typed();
        f.orders.mark_paid(id).unwrap();
        f.tracker.advance(id, DeliveryStatus::OnTheWay).unwrap();

        f.orders.advance(id, OrderStatus::Delivered).unwrap();
        let delivery = f.tracker.get_delivery(id).unwrap();
        assert_eq!(delivery.status(), DeliveryStatus::Delivered);
        assert_eq!(delivery.delivered_at(), Some(f.clock.now()));
        assert!(f.tracker.advance(id, DeliveryStatus::Delivered).is_err());
    }

    #[test]
    fn canceled_order_gets_no_courier() {
        let f = fixture();
        let id = f.order.id_typed();
        f.orders.cancel(id).unwrap();
        assert!(matches!(
            f.tracker.assign_courier(id, "Bob", None),
            Err(CommerceError::Domain(DomainError::InvalidState(_)))
        ));
        assert_eq!(f.tracker.get_delivery(id).unwrap().courier_name(), None);
    }
}
