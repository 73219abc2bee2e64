//! Orders domain module.
//!
//! An order is the frozen result of a checkout: line items carry their own
//! price snapshot and only the status moves afterwards. Deterministic domain
//! logic only (no IO, no storage).

pub mod order;
pub mod status;

pub use order::{Order, OrderDraft, OrderItem};
pub use status::OrderStatus;
