use serde::{Deserialize, Serialize};

use storefront_catalog::Product;
use storefront_core::{DomainResult, ProductId, Quantity, UserId, checked_line_total, checked_sum};

use crate::policy::QuantityPolicy;

/// One stored cart row. At most one exists per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    user_id: UserId,
    product_id: ProductId,
    quantity: Quantity,
}

impl CartItem {
    pub fn new(user_id: UserId, product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Add to the existing quantity. Leaves the row untouched on error.
    pub fn increase(&mut self, added: Quantity, policy: &QuantityPolicy) -> DomainResult<()> {
        self.quantity = policy.merge(self.quantity, added)?;
        Ok(())
    }

    pub fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }
}

/// A cart row joined with the live product it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: Quantity,
}

impl CartLine {
    /// Line total at the product's current price.
    pub fn line_total(&self) -> DomainResult<u64> {
        checked_line_total(self.product.price(), self.quantity)
    }
}

/// A user's cart as shown to them: live names and prices, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    user_id: UserId,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(user_id: UserId, mut lines: Vec<CartLine>) -> Self {
        lines.sort_by(|a, b| {
            a.product
                .name()
                .cmp(b.product.name())
                .then_with(|| a.product.id_typed().cmp(&b.product.id_typed()))
        });
        Self { user_id, lines }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|l| u64::from(l.quantity.get()))
            .sum()
    }

    /// Cart total at current prices. Checkout re-reads prices regardless.
    pub fn total(&self) -> DomainResult<u64> {
        let totals = self
            .lines
            .iter()
            .map(CartLine::line_total)
            .collect::<DomainResult<Vec<_>>>()?;
        checked_sum(totals)
    }
}
