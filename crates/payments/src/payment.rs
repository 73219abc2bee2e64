use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, OrderId, PaymentId, UserId};
use storefront_orders::{Order, OrderStatus};

/// Payment status lifecycle: `pending` then exactly one terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Terminal result reported for a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success,
    Failed,
}

impl From<PaymentOutcome> for PaymentStatus {
    fn from(value: PaymentOutcome) -> Self {
        match value {
            PaymentOutcome::Success => PaymentStatus::Success,
            PaymentOutcome::Failed => PaymentStatus::Failed,
        }
    }
}

/// One payment attempt against an order.
///
/// # Invariants
/// - `amount` equals the order total at creation.
/// - Once `success` or `failed`, the status never changes again.
/// - At most one payment per order reaches `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    user_id: UserId,
    /// Price in smallest currency unit (e.g., cents).
    amount: u64,
    created_at: DateTime<Utc>,
    status: PaymentStatus,
    method: Option<String>,
    settled_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Open a pending payment for `order`.
    pub fn start(
        id: PaymentId,
        order: &Order,
        amount: u64,
        method: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount != order.total_price() {
            return Err(DomainError::AmountMismatch {
                expected: order.total_price(),
                actual: amount,
            });
        }
        if order.status() != OrderStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "cannot take payment for order in status {}",
                order.status()
            )));
        }

        Ok(Self {
            id,
            order_id: order.id_typed(),
            user_id: order.user_id(),
            amount,
            created_at,
            status: PaymentStatus::Pending,
            method: method
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            settled_at: None,
        })
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    /// Resolve this payment.
    ///
    /// `order_payments` are all payments recorded for the same order (this one
    /// may be among them). State is unchanged on error.
    pub fn settle(
        &mut self,
        outcome: PaymentOutcome,
        order_payments: &[Payment],
        settled_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::AlreadySettled);
        }

        if outcome == PaymentOutcome::Success {
            let already_paid = order_payments.iter().any(|p| {
                p.id != self.id && p.order_id == self.order_id && p.status == PaymentStatus::Success
            });
            if already_paid {
                return Err(DomainError::DuplicateSuccess);
            }
        }

        self.status = outcome.into();
        self.settled_at = Some(settled_at);
        Ok(())
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
