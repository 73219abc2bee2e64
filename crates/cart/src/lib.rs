//! Cart domain module.
//!
//! A cart is the mutable, per-user list of products and quantities that
//! checkout later freezes into an order. This crate holds the quantity rules;
//! storage and per-user serialization live in the infra crate.

pub mod cart;
pub mod policy;

pub use cart::{Cart, CartItem, CartLine};
pub use policy::{QuantityPolicy, DEFAULT_MAX_ITEM_QUANTITY};
