//! Storage errors and the error type returned by the storefront services.

use thiserror::Error;

use storefront_core::DomainError;

/// Persistence backend failure.
///
/// These are **infrastructure errors** (constraints, aborted transactions) as
/// opposed to domain errors (validation, state machine).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: &'static str },

    /// A row references a parent row that does not exist.
    #[error("foreign key violated: {constraint}")]
    ForeignKeyViolation { constraint: &'static str },

    /// An update targeted a row that does not exist.
    #[error("no such row in {table}")]
    MissingRow { table: &'static str },

    /// An update tried to change a column that is write-once.
    #[error("immutable column changed: {0}")]
    Immutable(&'static str),

    /// The transaction was aborted before commit.
    #[error("transaction aborted at {0}")]
    Aborted(&'static str),
}

/// Result type returned by the storefront services.
pub type CommerceResult<T> = Result<T, CommerceError>;

/// Error returned by every storefront operation.
///
/// Constraint violations coming from storage are translated into the domain
/// error they stand for on the way in (see `From<StoreError>`), so callers
/// only ever see `Store` for genuine backend trouble.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommerceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl CommerceError {
    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            CommerceError::Domain(e) => Some(e),
            CommerceError::Store(_) => None,
        }
    }
}

impl From<StoreError> for CommerceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation { constraint } => match constraint {
                "categories.name" => {
                    DomainError::validation("category name already exists").into()
                }
                "ingredients.name" => {
                    DomainError::validation("ingredient name already exists").into()
                }
                "deliveries.order_id" => {
                    DomainError::invalid_state("order already has a delivery").into()
                }
                "payments.success_per_order" => DomainError::DuplicateSuccess.into(),
                _ => CommerceError::Store(value),
            },
            StoreError::ForeignKeyViolation { constraint } => match constraint {
                "products.category_id" => DomainError::not_found("category").into(),
                "products.ingredient_ids" => DomainError::not_found("ingredient").into(),
                "cart_items.product_id" => DomainError::not_found("product").into(),
                "orders.user_id" => DomainError::not_found("user").into(),
                "payments.order_id" | "deliveries.order_id" => {
                    DomainError::not_found("order").into()
                }
                _ => CommerceError::Store(value),
            },
            other => CommerceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_clashes_become_domain_errors() {
        let err: CommerceError = StoreError::UniqueViolation {
            constraint: "payments.success_per_order",
        }
        .into();
        assert_eq!(err, CommerceError::Domain(DomainError::DuplicateSuccess));

        let err: CommerceError = StoreError::ForeignKeyViolation {
            constraint: "deliveries.order_id",
        }
        .into();
        assert_eq!(err.domain(), Some(&DomainError::NotFound("order")));
    }

    #[test]
    fn backend_failures_stay_storage_errors() {
        let err: CommerceError = StoreError::Aborted("checkout").into();
        assert_eq!(err, CommerceError::Store(StoreError::Aborted("checkout")));
        assert_eq!(err.domain(), None);
    }
}
