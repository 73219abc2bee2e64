//! Cart Manager: per-user cart rows.
//!
//! Every mutation runs in its own storage transaction, so concurrent calls for
//! the same user serialize and no increment is lost.

use std::sync::Arc;

use tracing::instrument;

use storefront_cart::{Cart, CartItem, CartLine, QuantityPolicy};
use storefront_core::{DomainError, ProductId, UserId};

use crate::error::CommerceResult;
use crate::services::catalog::available_product;
use crate::storage::Storage;

pub struct CartService<S> {
    storage: Arc<S>,
    policy: QuantityPolicy,
}

impl<S> CartService<S>
where
    S: Storage,
{
    pub fn new(storage: Arc<S>, policy: QuantityPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> QuantityPolicy {
        self.policy
    }

    /// Add `quantity` units of a product, merging with an existing row.
    #[instrument(skip(self))]
    pub fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> CommerceResult<CartItem> {
        let added = self.policy.for_add(quantity)?;

        let item = self.storage.transaction(|tx| -> CommerceResult<CartItem> {
            if available_product(&*tx, product_id).is_none() {
                return Err(DomainError::not_found("product").into());
            }

            let item = match tx.cart_item(user_id, product_id) {
                Some(mut existing) => {
                    existing.increase(added, &self.policy)?;
                    existing
                }
                None => CartItem::new(user_id, product_id, added),
            };
            tx.put_cart_item(item.clone())?;
            Ok(item)
        })?;

        tracing::debug!(
            user_id = %user_id,
            product_id = %product_id,
            quantity = item.quantity().get(),
            "cart item added"
        );
        Ok(item)
    }

    /// Set a row's quantity. Zero removes the row; `None` is returned then.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> CommerceResult<Option<CartItem>> {
        let target = self.policy.for_update(quantity)?;

        self.storage
            .transaction(|tx| -> CommerceResult<Option<CartItem>> {
                match target {
                    None => {
                        tx.delete_cart_item(user_id, product_id);
                        Ok(None)
                    }
                    Some(quantity) => {
                        let mut item = tx
                            .cart_item(user_id, product_id)
                            .ok_or(DomainError::not_found("cart item"))?;
                        item.set_quantity(quantity);
                        tx.put_cart_item(item.clone())?;
                        Ok(Some(item))
                    }
                }
            })
    }

    /// Remove a row. Removing an absent row is not an error.
    #[instrument(skip(self))]
    pub fn remove_item(&self, user_id: UserId, product_id: ProductId) -> CommerceResult<()> {
        let removed = self
            .storage
            .transaction(|tx| -> CommerceResult<bool> {
                Ok(tx.delete_cart_item(user_id, product_id))
            })?;
        if removed {
            tracing::debug!(user_id = %user_id, product_id = %product_id, "cart item removed");
        }
        Ok(())
    }

    /// The cart joined with live product data.
    pub fn get_cart(&self, user_id: UserId) -> CommerceResult<Cart> {
        let lines = self.storage.read(|view| {
            view.cart_items(user_id)
                .into_iter()
                .filter_map(|item| {
                    let product = view.product(item.product_id());
                    if product.is_none() {
                        tracing::warn!(
                            user_id = %user_id,
                            product_id = %item.product_id(),
                            "cart references a missing product"
                        );
                    }
                    product.map(|product| CartLine {
                        product,
                        quantity: item.quantity(),
                    })
                })
                .collect::<Vec<_>>()
        })?;
        Ok(Cart::new(user_id, lines))
    }

    /// Delete every row of the user's cart. Returns how many were removed.
    #[instrument(skip(self))]
    pub fn clear_cart(&self, user_id: UserId) -> CommerceResult<usize> {
        self.storage
            .transaction(|tx| -> CommerceResult<usize> { Ok(tx.clear_cart(user_id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use storefront_catalog::NewProduct;

    use crate::error::CommerceError;
    use crate::services::catalog::CatalogService;
    use crate::storage::InMemoryStorage;

    struct Fixture {
        catalog: CatalogService<InMemoryStorage>,
        cart: CartService<InMemoryStorage>,
        tea: ProductId,
        soup: ProductId,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let catalog = CatalogService::new(storage.clone());
        let cart = CartService::new(storage, QuantityPolicy::default());

        let menu = catalog.create_category("Menu").unwrap();
        let product = |name: &str, price: u64| {
            catalog
                .create_product(NewProduct {
                    category_id: menu.id_typed(),
                    name: name.to_string(),
                    description: None,
                    price,
                    image: None,
                    ingredient_ids: BTreeSet::new(),
                })
                .unwrap()
                .id_typed()
        };
        let tea = product("Tea", 200);
        let soup = product("Soup", 450);

        Fixture {
            catalog,
            cart,
            tea,
            soup,
        }
    }

    fn user() -> UserId {
        UserId::new(42)
    }

    #[test]
    fn adding_same_product_twice_merges_rows() {
        let f = fixture();
        f.cart.add_item(user(), f.tea, 2).unwrap();
        let item = f.cart.add_item(user(), f.tea, 3).unwrap();
        assert_eq!(item.quantity().get(), 5);

        let cart = f.cart.get_cart(user()).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity.get(), 5);
    }

    #[test]
    fn add_rejects_bad_quantity_and_unavailable_products() {
        let f = fixture();
        assert_eq!(
            f.cart.add_item(user(), f.tea, 0),
            Err(CommerceError::Domain(DomainError::InvalidQuantity(0)))
        );
        assert_eq!(
            f.cart.add_item(user(), ProductId::new(), 1),
            Err(CommerceError::Domain(DomainError::NotFound("product")))
        );

        f.catalog.set_product_active(f.soup, false).unwrap();
        assert_eq!(
            f.cart.add_item(user(), f.soup, 1),
            Err(CommerceError::Domain(DomainError::NotFound("product")))
        );
    }

    #[test]
    fn overflowing_the_maximum_fails_and_keeps_the_row() {
        let f = fixture();
        f.cart.add_item(user(), f.tea, 998).unwrap();
        assert_eq!(
            f.cart.add_item(user(), f.tea, 2),
            Err(CommerceError::Domain(DomainError::InvalidQuantity(1000)))
        );
        assert_eq!(f.cart.get_cart(user()).unwrap().item_count(), 998);
    }

    #[test]
    fn update_to_zero_deletes_and_negative_fails() {
        let f = fixture();
        f.cart.add_item(user(), f.tea, 2).unwrap();

        let updated = f.cart.update_quantity(user(), f.tea, 7).unwrap();
        assert_eq!(updated.map(|i| i.quantity().get()), Some(7));

        assert_eq!(
            f.cart.update_quantity(user(), f.tea, -1),
            Err(CommerceError::Domain(DomainError::InvalidQuantity(-1)))
        );
        assert_eq!(f.cart.update_quantity(user(), f.tea, 0).unwrap(), None);
        assert!(f.cart.get_cart(user()).unwrap().is_empty());
    }

    #[test]
    fn update_of_absent_row_to_positive_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.cart.update_quantity(user(), f.tea, 3),
            Err(CommerceError::Domain(DomainError::NotFound("cart item")))
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let f = fixture();
        f.cart.add_item(user(), f.soup, 1).unwrap();
        f.cart.remove_item(user(), f.soup).unwrap();
        let before = f.cart.get_cart(user()).unwrap();

        f.cart.remove_item(user(), f.soup).unwrap();
        assert_eq!(f.cart.get_cart(user()).unwrap(), before);
        assert!(before.is_empty());
    }

    #[test]
    fn cart_reflects_live_prices() {
        let f = fixture();
        f.cart.add_item(user(), f.soup, 2).unwrap();
        assert_eq!(f.cart.get_cart(user()).unwrap().total().unwrap(), 900);

        f.catalog.update_price(f.soup, 500).unwrap();
        assert_eq!(f.cart.get_cart(user()).unwrap().total().unwrap(), 1000);
    }

    #[test]
    fn clear_only_touches_one_user() {
        let f = fixture();
        let other = UserId::new(7);
        f.cart.add_item(user(), f.tea, 1).unwrap();
        f.cart.add_item(user(), f.soup, 1).unwrap();
        f.cart.add_item(other, f.tea, 1).unwrap();

        assert_eq!(f.cart.clear_cart(user()).unwrap(), 2);
        assert!(f.cart.get_cart(user()).unwrap().is_empty());
        assert_eq!(f.cart.get_cart(other).unwrap().item_count(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn row_quantity_is_the_sum_of_accepted_adds(adds in proptest::collection::vec(1i64..400, 1..8)) {
                let f = fixture();
                let mut expected = 0i64;
                for n in adds {
                    let accepted = f.cart.add_item(user(), f.tea, n).is_ok();
                    prop_assert_eq!(accepted, expected + n <= 999);
                    if accepted {
                        expected += n;
                    }
                }
                prop_assert_eq!(f.cart.get_cart(user()).unwrap().item_count(), expected as u64);
            }
        }
    }
}
