//! `storefront-core`: shared building blocks for the storefront domain crates.
//!
//! This crate contains **pure domain** primitives (no storage, no clock, no IO).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, IngredientId, OrderId, PaymentId, ProductId, UserId};
pub use money::{checked_line_total, checked_sum};
pub use value_object::Quantity;
