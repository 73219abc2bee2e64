use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, OrderId};
use storefront_orders::OrderStatus;

/// Delivery status lifecycle: `preparing → on_the_way → delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Preparing,
    OnTheWay,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Preparing => "preparing",
            DeliveryStatus::OnTheWay => "on_the_way",
            DeliveryStatus::Delivered => "delivered",
        }
    }

    /// The only status reachable from `self`, if any.
    pub fn next(self) -> Option<DeliveryStatus> {
        match self {
            DeliveryStatus::Preparing => Some(DeliveryStatus::OnTheWay),
            DeliveryStatus::OnTheWay => Some(DeliveryStatus::Delivered),
            DeliveryStatus::Delivered => None,
        }
    }

    /// Order status that entering `self` implies.
    pub fn order_status(self) -> Option<OrderStatus> {
        match self {
            DeliveryStatus::Preparing => None,
            DeliveryStatus::OnTheWay => Some(OrderStatus::Delivering),
            DeliveryStatus::Delivered => Some(OrderStatus::Delivered),
        }
    }

    /// Stage a delivery must have reached once its order is in `status`.
    pub fn for_order_status(status: OrderStatus) -> Option<DeliveryStatus> {
        match status {
            OrderStatus::Delivering => Some(DeliveryStatus::OnTheWay),
            OrderStatus::Delivered => Some(DeliveryStatus::Delivered),
            _ => None,
        }
    }
}

impl core::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery record for exactly one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    order_id: OrderId,
    courier_name: Option<String>,
    courier_phone: Option<String>,
    status: DeliveryStatus,
    delivered_at: Option<DateTime<Utc>>,
}

impl Delivery {
    /// Fresh record for a just-placed order.
    pub fn for_order(order_id: OrderId) -> Self {
        Self {
            order_id,
            courier_name: None,
            courier_phone: None,
            status: DeliveryStatus::Preparing,
            delivered_at: None,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn courier_name(&self) -> Option<&str> {
        self.courier_name.as_deref()
    }

    pub fn courier_phone(&self) -> Option<&str> {
        self.courier_phone.as_deref()
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Set or replace the courier. Not allowed once delivered.
    pub fn assign_courier(&mut self, name: &str, phone: Option<&str>) -> DomainResult<()> {
        if self.status == DeliveryStatus::Delivered {
            return Err(DomainError::invalid_state(
                "cannot assign a courier to a delivered order",
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("courier name must not be empty"));
        }

        self.courier_name = Some(name.to_string());
        self.courier_phone = phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Ok(())
    }

    /// Step forward to `next`; skipping or going back fails. State is unchanged on error.
    pub fn advance(&mut self, next: DeliveryStatus, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status.next() != Some(next) {
            return Err(DomainError::transition(self.status.as_str(), next.as_str()));
        }

        self.status = next;
        if next == DeliveryStatus::Delivered {
            self.delivered_at = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn starts_preparing_without_courier() {
        let d = Delivery::for_order(OrderId::new());
        assert_eq!(d.status(), DeliveryStatus::Preparing);
        assert_eq!(d.courier_name(), None);
        assert_eq!(d.delivered_at(), None);
    }

    #[test]
    fn skipping_a_stage_fails() {
        let mut d = Delivery::for_order(OrderId::new());
        assert_eq!(
            d.advance(DeliveryStatus::Delivered, test_time()),
            Err(DomainError::transition("preparing", "delivered"))
        );
        assert_eq!(d.status(), DeliveryStatus::Preparing);
        assert_eq!(d.delivered_at(), None);
    }

    #[test]
    fn delivered_at_is_set_only_on_delivery() {
        let mut d = Delivery::for_order(OrderId::new());
        d.advance(DeliveryStatus::OnTheWay, test_time()).unwrap();
        assert_eq!(d.delivered_at(), None);

        let at = test_time();
        d.advance(DeliveryStatus::Delivered, at).unwrap();
        assert_eq!(d.delivered_at(), Some(at));

        assert!(d.advance(DeliveryStatus::OnTheWay, test_time()).is_err());
    }

    #[test]
    fn courier_assignment_closes_on_delivery() {
        let mut d = Delivery::for_order(OrderId::new());
        d.assign_courier("Bob", Some("+1 555")).unwrap();
        d.advance(DeliveryStatus::OnTheWay, test_time()).unwrap();
        d.assign_courier("Eve", None).unwrap();
        assert_eq!(d.courier_name(), Some("Eve"));
        assert_eq!(d.courier_phone(), None);

        d.advance(DeliveryStatus::Delivered, test_time()).unwrap();
        assert!(matches!(
            d.assign_courier("Mallory", None),
            Err(DomainError::InvalidState(_))
        ));
        assert_eq!(d.courier_name(), Some("Eve"));
    }

    #[test]
    fn blank_courier_name_is_rejected() {
        let mut d = Delivery::for_order(OrderId::new());
        assert!(matches!(
            d.assign_courier("  ", None),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn on_the_way_serializes_with_underscores() {
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::OnTheWay).unwrap(),
            "\"on_the_way\""
        );
        assert_eq!(
            DeliveryStatus::OnTheWay.order_status(),
            Some(OrderStatus::Delivering)
        );
    }

    #[test]
    fn order_statuses_map_back_to_stages() {
        for stage in [DeliveryStatus::OnTheWay, DeliveryStatus::Delivered] {
            let implied = stage.order_status().unwrap();
            assert_eq!(DeliveryStatus::for_order_status(implied), Some(stage));
        }
        assert_eq!(DeliveryStatus::for_order_status(OrderStatus::Paid), None);
        assert_eq!(DeliveryStatus::for_order_status(OrderStatus::Canceled), None);
    }
}
