//! Payment Ledger: payment attempts and their settlement.

use std::sync::Arc;

use tracing::instrument;

use storefront_core::{DomainError, OrderId, PaymentId};
use storefront_orders::OrderStatus;
use storefront_payments::{Payment, PaymentOutcome};

use crate::clock::Clock;
use crate::error::CommerceResult;
use crate::services::orders::transition_order;
use crate::storage::Storage;

pub struct PaymentLedger<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> PaymentLedger<S>
where
    S: Storage,
{
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Open a pending payment for the full order total.
    #[instrument(skip(self))]
    pub fn create_payment(
        &self,
        order_id: OrderId,
        amount: u64,
        method: Option<&str>,
    ) -> CommerceResult<Payment> {
        let now = self.clock.now();
        let payment = self.storage.transaction(|tx| -> CommerceResult<Payment> {
            let order = tx.order(order_id).ok_or(DomainError::not_found("order"))?;
            let payment = Payment::start(PaymentId::new(), &order, amount, method, now)?;
            tx.insert_payment(payment.clone())?;
            Ok(payment)
        })?;

        tracing::info!(
            payment_id = %payment.id_typed(),
            order_id = %order_id,
            amount,
            "payment opened"
        );
        Ok(payment)
    }

    /// Resolve a pending payment.
    ///
    /// On success the order moves to `paid` in the same transaction; if that
    /// transition is not allowed the payment stays pending. The duplicate check
    /// runs under the same transaction, so two racing successes for one order
    /// cannot both commit.
    #[instrument(skip(self))]
    pub fn settle_payment(
        &self,
        payment_id: PaymentId,
        outcome: PaymentOutcome,
    ) -> CommerceResult<Payment> {
        let now = self.clock.now();
        let payment = self.storage.transaction(|tx| -> CommerceResult<Payment> {
            let mut payment = tx
                .payment(payment_id)
                .ok_or(DomainError::not_found("payment"))?;
            let siblings = tx.payments_for_order(payment.order_id());

            payment.settle(outcome, &siblings, now)?;
            tx.update_payment(payment.clone())?;

            if outcome == PaymentOutcome::Success {
                transition_order(tx, payment.order_id(), OrderStatus::Paid, now)?;
            }
            Ok(payment)
        })?;

        tracing::info!(
            payment_id = %payment_id,
            order_id = %payment.order_id(),
            status = payment.status().as_str(),
            "payment settled"
        );
        Ok(payment)
    }

    pub fn get_payment(&self, payment_id: PaymentId) -> CommerceResult<Payment> {
        let payment = self.storage.read(|view| view.payment(payment_id))?;
        Ok(payment.ok_or(DomainError::not_found("payment"))?)
    }

    /// Payments recorded for an order, oldest first.
    pub fn payments_for_order(&self, order_id: OrderId) -> CommerceResult<Vec<Payment>> {
        let payments = self.storage.read(|view| {
            view.order(order_id)
                .map(|_| view.payments_for_order(order_id))
        })?;
        Ok(payments.ok_or(DomainError::not_found("order"))?)
    }
}
