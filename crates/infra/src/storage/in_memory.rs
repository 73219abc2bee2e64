use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};

use storefront_cart::CartItem;
use storefront_catalog::{Category, Ingredient, Product};
use storefront_core::{CategoryId, Entity, IngredientId, OrderId, PaymentId, ProductId, UserId};
use storefront_customers::User;
use storefront_delivery::Delivery;
use storefront_orders::Order;
use storefront_payments::{Payment, PaymentStatus};

use super::{ReadView, Storage, UnitOfWork};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    ingredients: HashMap<IngredientId, Ingredient>,
    products: HashMap<ProductId, Product>,
    cart_items: BTreeMap<(UserId, ProductId), CartItem>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentId, Payment>,
    deliveries: HashMap<OrderId, Delivery>,
}

/// Row counts per table, for diagnostics and tests.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub users: usize,
    pub products: usize,
    pub cart_items: usize,
    pub orders: usize,
    pub order_items: usize,
    pub payments: usize,
    pub deliveries: usize,
}

/// In-memory transactional storage.
///
/// Intended for tests/dev. Not optimized for performance: every transaction
/// works on a full copy of the tables and swaps it in on commit, holding the
/// write lock throughout. That makes transactions serializable and rollback
/// free of bookkeeping.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
    abort_at: Mutex<Option<&'static str>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next transaction that reaches checkpoint `label` abort there.
    ///
    /// Used to exercise rollback of multi-step writes.
    pub fn abort_at_checkpoint(&self, label: &'static str) {
        let mut armed = self.abort_at.lock().unwrap_or_else(|e| e.into_inner());
        *armed = Some(label);
    }

    pub fn row_counts(&self) -> RowCounts {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        RowCounts {
            users: tables.users.len(),
            products: tables.products.len(),
            cart_items: tables.cart_items.len(),
            orders: tables.orders.len(),
            order_items: tables.orders.values().map(|o| o.items().len()).sum(),
            payments: tables.payments.len(),
            deliveries: tables.deliveries.len(),
        }
    }
}

impl Storage for InMemoryStorage {
    fn read<T>(&self, f: impl FnOnce(&dyn ReadView) -> T) -> Result<T, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&*tables))
    }

    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        // A panicking closure only ever touched its staged copy, so the
        // committed tables behind a poisoned lock are still consistent.
        let mut committed = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        let mut staged = Staged {
            tables: committed.clone(),
            abort_at: &self.abort_at,
        };
        let out = f(&mut staged)?;

        *committed = staged.tables;
        Ok(out)
    }
}

impl ReadView for Tables {
    fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn category(&self, id: CategoryId) -> Option<Category> {
        self.categories.get(&id).cloned()
    }

    fn categories(&self) -> Vec<Category> {
        self.categories.values().cloned().collect()
    }

    fn ingredient(&self, id: IngredientId) -> Option<Ingredient> {
        self.ingredients.get(&id).cloned()
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    fn products_in_category(&self, id: CategoryId) -> Vec<Product> {
        self.products
            .values()
            .filter(|p| p.category_id() == id)
            .cloned()
            .collect()
    }

    fn cart_item(&self, user_id: UserId, product_id: ProductId) -> Option<CartItem> {
        self.cart_items.get(&(user_id, product_id)).cloned()
    }

    fn cart_items(&self, user_id: UserId) -> Vec<CartItem> {
        self.cart_items
            .iter()
            .filter(|((u, _), _)| *u == user_id)
            .map(|(_, item)| item.clone())
            .collect()
    }

    fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).cloned()
    }

    fn orders_for_user(&self, user_id: UserId) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect()
    }

    fn payment(&self, id: PaymentId) -> Option<Payment> {
        self.payments.get(&id).cloned()
    }

    fn payments_for_order(&self, order_id: OrderId) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .payments
            .values()
            .filter(|p| p.order_id() == order_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.created_at(), p.id_typed()));
        payments
    }

    fn delivery(&self, order_id: OrderId) -> Option<Delivery> {
        self.deliveries.get(&order_id).cloned()
    }
}

/// Working copy of the tables for one transaction.
struct Staged<'a> {
    tables: Tables,
    abort_at: &'a Mutex<Option<&'static str>>,
}

impl Staged<'_> {
    fn other_success_exists(&self, payment: &Payment) -> bool {
        self.tables.payments.values().any(|p| {
            p.id_typed() != payment.id_typed()
                && p.order_id() == payment.order_id()
                && p.status() == PaymentStatus::Success
        })
    }

    fn category_name_taken(&self, category: &Category) -> bool {
        let name = category.normalized_name();
        self.tables
            .categories
            .values()
            .any(|c| c.id_typed() != category.id_typed() && c.normalized_name() == name)
    }
}

impl ReadView for Staged<'_> {
    fn user(&self, id: UserId) -> Option<User> {
        self.tables.user(id)
    }

    fn category(&self, id: CategoryId) -> Option<Category> {
        self.tables.category(id)
    }

    fn categories(&self) -> Vec<Category> {
        self.tables.categories()
    }

    fn ingredient(&self, id: IngredientId) -> Option<Ingredient> {
        self.tables.ingredient(id)
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        self.tables.product(id)
    }

    fn products_in_category(&self, id: CategoryId) -> Vec<Product> {
        self.tables.products_in_category(id)
    }

    fn cart_item(&self, user_id: UserId, product_id: ProductId) -> Option<CartItem> {
        self.tables.cart_item(user_id, product_id)
    }

    fn cart_items(&self, user_id: UserId) -> Vec<CartItem> {
        self.tables.cart_items(user_id)
    }

    fn order(&self, id: OrderId) -> Option<Order> {
        self.tables.order(id)
    }

    fn orders_for_user(&self, user_id: UserId) -> Vec<Order> {
        self.tables.orders_for_user(user_id)
    }

    fn payment(&self, id: PaymentId) -> Option<Payment> {
        self.tables.payment(id)
    }

    fn payments_for_order(&self, order_id: OrderId) -> Vec<Payment> {
        self.tables.payments_for_order(order_id)
    }

    fn delivery(&self, order_id: OrderId) -> Option<Delivery> {
        self.tables.delivery(order_id)
    }
}

impl UnitOfWork for Staged<'_> {
    fn put_user(&mut self, user: User) {
        upsert(&mut self.tables.users, user);
    }

    fn insert_category(&mut self, category: Category) -> Result<(), StoreError> {
        if self.category_name_taken(&category) {
            return Err(StoreError::UniqueViolation {
                constraint: "categories.name",
            });
        }
        insert_new(&mut self.tables.categories, category, "categories.id")
    }

    fn update_category(&mut self, category: Category) -> Result<(), StoreError> {
        if !self.tables.categories.contains_key(&category.id_typed()) {
            return Err(StoreError::MissingRow {
                table: "categories",
            });
        }
        if self.category_name_taken(&category) {
            return Err(StoreError::UniqueViolation {
                constraint: "categories.name",
            });
        }
        upsert(&mut self.tables.categories, category);
        Ok(())
    }

    fn insert_ingredient(&mut self, ingredient: Ingredient) -> Result<(), StoreError> {
        let name = ingredient.normalized_name();
        if self
            .tables
            .ingredients
            .values()
            .any(|i| i.normalized_name() == name)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "ingredients.name",
            });
        }
        insert_new(&mut self.tables.ingredients, ingredient, "ingredients.id")
    }

    fn put_product(&mut self, product: Product) -> Result<(), StoreError> {
        if !self.tables.categories.contains_key(&product.category_id()) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "products.category_id",
            });
        }
        if !product
            .ingredient_ids()
            .iter()
            .all(|id| self.tables.ingredients.contains_key(id))
        {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "products.ingredient_ids",
            });
        }
        upsert(&mut self.tables.products, product);
        Ok(())
    }

    fn put_cart_item(&mut self, item: CartItem) -> Result<(), StoreError> {
        if !self.tables.products.contains_key(&item.product_id()) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "cart_items.product_id",
            });
        }
        self.tables
            .cart_items
            .insert((item.user_id(), item.product_id()), item);
        Ok(())
    }

    fn delete_cart_item(&mut self, user_id: UserId, product_id: ProductId) -> bool {
        self.tables
            .cart_items
            .remove(&(user_id, product_id))
            .is_some()
    }

    fn clear_cart(&mut self, user_id: UserId) -> usize {
        let before = self.tables.cart_items.len();
        self.tables.cart_items.retain(|(u, _), _| *u != user_id);
        before - self.tables.cart_items.len()
    }

    fn insert_order(&mut self, order: Order) -> Result<(), StoreError> {
        if !self.tables.users.contains_key(&order.user_id()) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "orders.user_id",
            });
        }
        insert_new(&mut self.tables.orders, order, "orders.id")
    }

    fn update_order(&mut self, order: Order) -> Result<(), StoreError> {
        let existing = self
            .tables
            .orders
            .get(&order.id_typed())
            .ok_or(StoreError::MissingRow { table: "orders" })?;
        if !same_snapshot(existing, &order) {
            return Err(StoreError::Immutable("orders"));
        }
        upsert(&mut self.tables.orders, order);
        Ok(())
    }

    fn insert_payment(&mut self, payment: Payment) -> Result<(), StoreError> {
        if !self.tables.orders.contains_key(&payment.order_id()) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "payments.order_id",
            });
        }
        if payment.status() == PaymentStatus::Success && self.other_success_exists(&payment) {
            return Err(StoreError::UniqueViolation {
                constraint: "payments.success_per_order",
            });
        }
        insert_new(&mut self.tables.payments, payment, "payments.id")
    }

    fn update_payment(&mut self, payment: Payment) -> Result<(), StoreError> {
        let existing = self
            .tables
            .payments
            .get(&payment.id_typed())
            .ok_or(StoreError::MissingRow { table: "payments" })?;
        if existing.order_id() != payment.order_id() || existing.amount() != payment.amount() {
            return Err(StoreError::Immutable("payments"));
        }
        if payment.status() == PaymentStatus::Success && self.other_success_exists(&payment) {
            return Err(StoreError::UniqueViolation {
                constraint: "payments.success_per_order",
            });
        }
        upsert(&mut self.tables.payments, payment);
        Ok(())
    }

    fn insert_delivery(&mut self, delivery: Delivery) -> Result<(), StoreError> {
        if !self.tables.orders.contains_key(&delivery.order_id()) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "deliveries.order_id",
            });
        }
        if self.tables.deliveries.contains_key(&delivery.order_id()) {
            return Err(StoreError::UniqueViolation {
                constraint: "deliveries.order_id",
            });
        }
        self.tables.deliveries.insert(delivery.order_id(), delivery);
        Ok(())
    }

    fn update_delivery(&mut self, delivery: Delivery) -> Result<(), StoreError> {
        if !self.tables.deliveries.contains_key(&delivery.order_id()) {
            return Err(StoreError::MissingRow {
                table: "deliveries",
            });
        }
        self.tables.deliveries.insert(delivery.order_id(), delivery);
        Ok(())
    }

    fn checkpoint(&mut self, label: &'static str) -> Result<(), StoreError> {
        let mut armed = self.abort_at.lock().unwrap_or_else(|e| e.into_inner());
        if *armed == Some(label) {
            *armed = None;
            return Err(StoreError::Aborted(label));
        }
        Ok(())
    }
}

type Table<E> = HashMap<<E as Entity>::Id, E>;

/// Insert a row whose id must not be taken yet.
fn insert_new<E: Entity>(
    table: &mut Table<E>,
    row: E,
    constraint: &'static str,
) -> Result<(), StoreError> {
    match table.entry(row.id().clone()) {
        Entry::Occupied(_) => Err(StoreError::UniqueViolation { constraint }),
        Entry::Vacant(slot) => {
            slot.insert(row);
            Ok(())
        }
    }
}

fn upsert<E: Entity>(table: &mut Table<E>, row: E) {
    table.insert(row.id().clone(), row);
}

/// Everything but the status must match.
fn same_snapshot(a: &Order, b: &Order) -> bool {
    a.id_typed() == b.id_typed()
        && a.user_id() == b.user_id()
        && a.created_at() == b.created_at()
        && a.total_price() == b.total_price()
        && a.delivery_address() == b.delivery_address()
        && a.comment() == b.comment()
        && a.items() == b.items()
}
