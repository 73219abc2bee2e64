use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Quantity};

/// Largest quantity a single cart line may hold unless configured otherwise.
pub const DEFAULT_MAX_ITEM_QUANTITY: u32 = 999;

/// Quantity bounds for cart lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityPolicy {
    max_item_quantity: u32,
}

impl QuantityPolicy {
    pub fn new(max_item_quantity: u32) -> DomainResult<Self> {
        if max_item_quantity == 0 {
            return Err(DomainError::validation(
                "max_item_quantity must be positive",
            ));
        }
        Ok(Self { max_item_quantity })
    }

    pub fn max_item_quantity(&self) -> u32 {
        self.max_item_quantity
    }

    /// Quantity for an add-to-cart request: at least 1, at most the maximum.
    pub fn for_add(&self, requested: i64) -> DomainResult<Quantity> {
        Quantity::new(requested)?.ensure_at_most(self.max_item_quantity)
    }

    /// Quantity for an explicit update: `None` means "remove the line".
    pub fn for_update(&self, requested: i64) -> DomainResult<Option<Quantity>> {
        match requested {
            0 => Ok(None),
            n if n < 0 => Err(DomainError::InvalidQuantity(n)),
            n => Ok(Some(self.for_add(n)?)),
        }
    }

    /// Combine an existing line with an added quantity (no saturation).
    pub fn merge(&self, existing: Quantity, added: Quantity) -> DomainResult<Quantity> {
        existing.checked_add(added, self.max_item_quantity)
    }
}

impl Default for QuantityPolicy {
    fn default() -> Self {
        Self {
            max_item_quantity: DEFAULT_MAX_ITEM_QUANTITY,
        }
    }
}
