//! Delivery tracking domain module.
//!
//! One delivery record per order, created together with the order and moved
//! forward as courier events arrive.

pub mod delivery;

pub use delivery::{Delivery, DeliveryStatus};
