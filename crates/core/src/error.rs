//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure the storefront reports to its callers is one of these kinds.
/// Storage and locking failures are infrastructure concerns and live in the
/// infra crate; unique-key clashes are translated into these variants there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The referenced entity does not exist (or is not usable from here).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A quantity was below 1 (or below 0 for updates) or above the cart maximum.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Checkout was attempted with no cart items.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout was attempted without a delivery address.
    #[error("delivery address is required")]
    InvalidAddress,

    /// A cart line references a product that is inactive or gone.
    #[error("product {0} is unavailable")]
    ProductUnavailable(ProductId),

    /// A status change is not an edge of the state machine.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Payment amount differs from the order total.
    #[error("amount mismatch (expected: {expected}, actual: {actual})")]
    AmountMismatch { expected: u64, actual: u64 },

    /// The payment already reached a terminal status.
    #[error("payment already settled")]
    AlreadySettled,

    /// Another payment for the same order already succeeded.
    #[error("order already has a successful payment")]
    DuplicateSuccess,

    /// The operation is not allowed in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A value failed validation (e.g. blank name, duplicate name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated (e.g. arithmetic overflow).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound(entity)
    }

    pub fn transition(from: &'static str, to: &'static str) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
