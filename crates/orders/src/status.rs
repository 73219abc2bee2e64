use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// Order status lifecycle.
///
/// ```text
/// pending ──▶ paid ──▶ delivering ──▶ delivered
///    │          │
///    └──────────┴──▶ canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivering,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Paid, Delivering)
                | (Delivering, Delivered)
                | (Pending, Canceled)
                | (Paid, Canceled)
        )
    }

    pub fn ensure_transition(self, next: OrderStatus) -> DomainResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::transition(self.as_str(), next.as_str()))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::OrderStatus::*;

    const ALL: [OrderStatus; 5] = [Pending, Paid, Delivering, Delivered, Canceled];

    #[test]
    fn only_listed_edges_are_legal() {
        let legal = [
            (Pending, Paid),
            (Paid, Delivering),
            (Delivering, Delivered),
            (Pending, Canceled),
            (Paid, Canceled),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [Delivered, Canceled] {
            assert!(from.is_terminal());
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn illegal_edge_reports_both_ends() {
        assert_eq!(
            Pending.ensure_transition(Delivering),
            Err(DomainError::transition("pending", "delivering"))
        );
    }

    #[test]
    fn serializes_in_snake_case() {
        assert_eq!(serde_json::to_string(&Delivering).unwrap(), "\"delivering\"");
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"canceled\"").unwrap(),
            Canceled
        );
    }
}
