use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::Product;
use storefront_core::{
    DomainError, DomainResult, Entity, OrderId, ProductId, Quantity, UserId, checked_line_total,
    checked_sum,
};

use crate::status::OrderStatus;

/// Order line: product, quantity, unit price frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    order_id: OrderId,
    line_no: u32,
    product_id: ProductId,
    product_name: String,
    quantity: Quantity,
    /// Price in smallest currency unit (e.g., cents), copied from the product.
    unit_price: u64,
}

impl OrderItem {
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Product name as it read at checkout.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn line_total(&self) -> DomainResult<u64> {
        checked_line_total(self.unit_price, self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DraftLine {
    product_id: ProductId,
    product_name: String,
    unit_price: u64,
    quantity: Quantity,
}

/// An order being assembled from a cart, before it gets an identity.
///
/// Prices are copied from the products handed to `add_line`; nothing in the
/// resulting order refers back to the live catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    user_id: UserId,
    delivery_address: String,
    comment: Option<String>,
    lines: Vec<DraftLine>,
}

impl OrderDraft {
    /// Start a draft. The address is trimmed and must not end up empty.
    pub fn new(
        user_id: UserId,
        delivery_address: &str,
        comment: Option<&str>,
    ) -> DomainResult<Self> {
        let delivery_address = delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(DomainError::InvalidAddress);
        }
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            user_id,
            delivery_address: delivery_address.to_string(),
            comment,
            lines: Vec::new(),
        })
    }

    /// Snapshot one product at its current price.
    pub fn add_line(&mut self, product: &Product, quantity: Quantity) {
        self.lines.push(DraftLine {
            product_id: product.id_typed(),
            product_name: product.name().to_string(),
            unit_price: product.price(),
            quantity,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Turn the draft into a pending order with numbered, priced items.
    pub fn place(self, order_id: OrderId, created_at: DateTime<Utc>) -> DomainResult<Order> {
        if self.lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let items = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let line_no = u32::try_from(idx + 1)
                    .map_err(|_| DomainError::invariant("too many order lines"))?;
                Ok(OrderItem {
                    order_id,
                    line_no,
                    product_id: line.product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let total_price = sum_items(&items)?;

        let order = Order {
            id: order_id,
            user_id: self.user_id,
            created_at,
            status: OrderStatus::Pending,
            total_price,
            delivery_address: self.delivery_address,
            comment: self.comment,
            items,
        };
        order.verify_total()?;
        Ok(order)
    }
}

/// A placed order.
///
/// # Invariants
/// - `total_price` equals the sum of item line totals, fixed at creation.
/// - Items never change after creation.
/// - Only `status` changes, and only along `OrderStatus` edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    /// Price in smallest currency unit (e.g., cents).
    total_price: u64,
    delivery_address: String,
    comment: Option<String>,
    items: Vec<OrderItem>,
}

impl Order {
    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_price(&self) -> u64 {
        self.total_price
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Re-check the stored total against the items.
    pub fn verify_total(&self) -> DomainResult<()> {
        let sum = sum_items(&self.items)?;
        if sum != self.total_price {
            return Err(DomainError::invariant(format!(
                "order total {} does not match items sum {}",
                self.total_price, sum
            )));
        }
        Ok(())
    }

    /// Move to `next` if the lifecycle allows it. State is unchanged on error.
    pub fn transition_to(&mut self, next: OrderStatus) -> DomainResult<()> {
        self.status.ensure_transition(next)?;
        self.status = next;
        Ok(())
    }

    pub fn mark_paid(&mut self) -> DomainResult<()> {
        self.transition_to(OrderStatus::Paid)
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition_to(OrderStatus::Canceled)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn sum_items(items: &[OrderItem]) -> DomainResult<u64> {
    let totals = items
        .iter()
        .map(OrderItem::line_total)
        .collect::<DomainResult<Vec<_>>>()?;
    checked_sum(totals)
}
