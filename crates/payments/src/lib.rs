//! Payment ledger domain module.
//!
//! Payment attempts against an order and the rules for settling them. Moving
//! the order to `paid` is the caller's job, inside the same transaction.

pub mod payment;

pub use payment::{Payment, PaymentOutcome, PaymentStatus};
