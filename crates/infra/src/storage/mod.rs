//! Persistence boundary.
//!
//! Services never touch tables directly. They run closures against a
//! `ReadView` (shared, read-only) or a `UnitOfWork` (one all-or-nothing
//! transaction). A backend must provide:
//!
//! - atomic multi-row commits: a closure returning `Err` leaves no trace
//! - serializable isolation between concurrent transactions
//! - the unique/foreign-key constraints named in `StoreError` messages
//!   (`cart_items` keyed by (user, product), one delivery per order, unique
//!   category and ingredient names, one successful payment per order)

pub mod in_memory;

pub use in_memory::{InMemoryStorage, RowCounts};

use std::sync::Arc;

use storefront_cart::CartItem;
use storefront_catalog::{Category, Ingredient, Product};
use storefront_core::{CategoryId, IngredientId, OrderId, PaymentId, ProductId, UserId};
use storefront_customers::User;
use storefront_delivery::Delivery;
use storefront_orders::Order;
use storefront_payments::Payment;

use crate::error::StoreError;

/// Row lookups. Every method returns owned copies.
pub trait ReadView {
    fn user(&self, id: UserId) -> Option<User>;

    fn category(&self, id: CategoryId) -> Option<Category>;
    fn categories(&self) -> Vec<Category>;
    fn ingredient(&self, id: IngredientId) -> Option<Ingredient>;
    fn product(&self, id: ProductId) -> Option<Product>;
    fn products_in_category(&self, id: CategoryId) -> Vec<Product>;

    fn cart_item(&self, user_id: UserId, product_id: ProductId) -> Option<CartItem>;
    /// Cart rows for a user, ordered by product id.
    fn cart_items(&self, user_id: UserId) -> Vec<CartItem>;

    fn order(&self, id: OrderId) -> Option<Order>;
    fn orders_for_user(&self, user_id: UserId) -> Vec<Order>;
    fn payment(&self, id: PaymentId) -> Option<Payment>;
    /// Payments of an order, oldest first.
    fn payments_for_order(&self, order_id: OrderId) -> Vec<Payment>;
    fn delivery(&self, order_id: OrderId) -> Option<Delivery>;
}

/// Writes inside one transaction.
pub trait UnitOfWork: ReadView {
    /// Insert or replace.
    fn put_user(&mut self, user: User);

    fn insert_category(&mut self, category: Category) -> Result<(), StoreError>;
    fn update_category(&mut self, category: Category) -> Result<(), StoreError>;
    fn insert_ingredient(&mut self, ingredient: Ingredient) -> Result<(), StoreError>;
    /// Insert or replace; category and ingredients must exist.
    fn put_product(&mut self, product: Product) -> Result<(), StoreError>;

    /// Insert or replace the row for (user, product).
    fn put_cart_item(&mut self, item: CartItem) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    fn delete_cart_item(&mut self, user_id: UserId, product_id: ProductId) -> bool;
    /// Returns the number of rows removed.
    fn clear_cart(&mut self, user_id: UserId) -> usize;

    fn insert_order(&mut self, order: Order) -> Result<(), StoreError>;
    /// Replace an order. Only the status may differ from the stored row.
    fn update_order(&mut self, order: Order) -> Result<(), StoreError>;

    fn insert_payment(&mut self, payment: Payment) -> Result<(), StoreError>;
    fn update_payment(&mut self, payment: Payment) -> Result<(), StoreError>;

    fn insert_delivery(&mut self, delivery: Delivery) -> Result<(), StoreError>;
    fn update_delivery(&mut self, delivery: Delivery) -> Result<(), StoreError>;

    /// Named point inside a multi-step write. Backends may abort here.
    fn checkpoint(&mut self, _label: &'static str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A persistence backend.
pub trait Storage: Send + Sync {
    /// Run `f` against a consistent read-only view.
    fn read<T>(&self, f: impl FnOnce(&dyn ReadView) -> T) -> Result<T, StoreError>;

    /// Run `f` as one transaction. Commits only if `f` returns `Ok`.
    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;
}

impl<S> Storage for Arc<S>
where
    S: Storage,
{
    fn read<T>(&self, f: impl FnOnce(&dyn ReadView) -> T) -> Result<T, StoreError> {
        (**self).read(f)
    }

    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        (**self).transaction(f)
    }
}
