//! Catalog Store: read-mostly product data plus admin seeding.

use std::sync::Arc;

use tracing::instrument;

use storefront_catalog::{Category, Ingredient, NewProduct, Product};
use storefront_core::{CategoryId, DomainError, IngredientId, ProductId};

use crate::error::CommerceResult;
use crate::storage::{ReadView, Storage};

/// A product that can be put in a cart or ordered right now.
///
/// Both the product and its category must be active.
pub(crate) fn available_product<V>(view: &V, id: ProductId) -> Option<Product>
where
    V: ReadView + ?Sized,
{
    let product = view.product(id)?;
    let category = view.category(product.category_id())?;
    product.is_available_in(&category).then_some(product)
}

fn by_name(a: &Product, b: &Product) -> std::cmp::Ordering {
    a.name()
        .cmp(b.name())
        .then_with(|| a.id_typed().cmp(&b.id_typed()))
}

pub struct CatalogService<S> {
    storage: Arc<S>,
}

impl<S> CatalogService<S>
where
    S: Storage,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn get_product(&self, id: ProductId) -> CommerceResult<Product> {
        let product = self.storage.read(|view| view.product(id))?;
        Ok(product.ok_or(DomainError::not_found("product"))?)
    }

    /// Active products of an active category, ordered by name.
    pub fn list_active_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> CommerceResult<Vec<Product>> {
        let found = self.storage.read(|view| {
            let category = view.category(category_id)?;
            let mut products: Vec<Product> = if category.is_active() {
                view.products_in_category(category_id)
                    .into_iter()
                    .filter(Product::is_active)
                    .collect()
            } else {
                Vec::new()
            };
            products.sort_by(by_name);
            Some(products)
        })?;
        Ok(found.ok_or(DomainError::not_found("category"))?)
    }

    pub fn get_category(&self, id: CategoryId) -> CommerceResult<Category> {
        let category = self.storage.read(|view| view.category(id))?;
        Ok(category.ok_or(DomainError::not_found("category"))?)
    }

    /// Active categories, ordered by name.
    pub fn list_active_categories(&self) -> CommerceResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .storage
            .read(|view| view.categories())?
            .into_iter()
            .filter(Category::is_active)
            .collect();
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    pub fn get_ingredient(&self, id: IngredientId) -> CommerceResult<Ingredient> {
        let ingredient = self.storage.read(|view| view.ingredient(id))?;
        Ok(ingredient.ok_or(DomainError::not_found("ingredient"))?)
    }

    /// Ingredients of a product, resolved by id and ordered by name.
    pub fn product_ingredients(&self, product_id: ProductId) -> CommerceResult<Vec<Ingredient>> {
        let found = self.storage.read(|view| {
            let product = view.product(product_id)?;
            let mut ingredients: Vec<Ingredient> = product
                .ingredient_ids()
                .iter()
                .filter_map(|id| view.ingredient(*id))
                .collect();
            ingredients.sort_by(|a, b| a.name().cmp(b.name()));
            Some(ingredients)
        })?;
        Ok(found.ok_or(DomainError::not_found("product"))?)
    }

    #[instrument(skip(self))]
    pub fn create_category(&self, name: &str) -> CommerceResult<Category> {
        let category = Category::new(CategoryId::new(), name)?;
        self.storage.transaction(|tx| -> CommerceResult<()> {
            tx.insert_category(category.clone())?;
            Ok(())
        })?;
        tracing::info!(
            category_id = %category.id_typed(),
            name = category.name(),
            "category created"
        );
        Ok(category)
    }

    #[instrument(skip(self))]
    pub fn set_category_active(&self, id: CategoryId, active: bool) -> CommerceResult<Category> {
        self.storage.transaction(|tx| -> CommerceResult<Category> {
            let mut category = tx.category(id).ok_or(DomainError::not_found("category"))?;
            category.set_active(active);
            tx.update_category(category.clone())?;
            Ok(category)
        })
    }

    #[instrument(skip(self))]
    pub fn create_ingredient(&self, name: &str) -> CommerceResult<Ingredient> {
        let ingredient = Ingredient::new(IngredientId::new(), name)?;
        self.storage.transaction(|tx| -> CommerceResult<()> {
            tx.insert_ingredient(ingredient.clone())?;
            Ok(())
        })?;
        Ok(ingredient)
    }

    #[instrument(skip(self, input), fields(name = %input.name, price = input.price))]
    pub fn create_product(&self, input: NewProduct) -> CommerceResult<Product> {
        let product = Product::create(ProductId::new(), input)?;
        self.storage.transaction(|tx| -> CommerceResult<()> {
            tx.put_product(product.clone())?;
            Ok(())
        })?;
        tracing::info!(
            product_id = %product.id_typed(),
            name = product.name(),
            price = product.price(),
            "product created"
        );
        Ok(product)
    }

    /// Change the live price. Carts see it immediately; placed orders never do.
    #[instrument(skip(self))]
    pub fn update_price(&self, id: ProductId, price: u64) -> CommerceResult<Product> {
        self.storage.transaction(|tx| -> CommerceResult<Product> {
            let mut product = tx.product(id).ok_or(DomainError::not_found("product"))?;
            product.set_price(price);
            tx.put_product(product.clone())?;
            Ok(product)
        })
    }

    #[instrument(skip(self))]
    pub fn set_product_active(&self, id: ProductId, active: bool) -> CommerceResult<Product> {
        self.storage.transaction(|tx| -> CommerceResult<Product> {
            let mut product = tx.product(id).ok_or(DomainError::not_found("product"))?;
            product.set_active(active);
            tx.put_product(product.clone())?;
            Ok(product)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::error::CommerceError;
    use crate::storage::InMemoryStorage;

    fn service() -> CatalogService<InMemoryStorage> {
        CatalogService::new(Arc::new(InMemoryStorage::new()))
    }

    fn new_product(category_id: CategoryId, name: &str, price: u64) -> NewProduct {
        NewProduct {
            category_id,
            name: name.to_string(),
            description: None,
            price,
            image: None,
            ingredient_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn lists_only_active_products_sorted_by_name() {
        let catalog = service();
        let drinks = catalog.create_category("Drinks").unwrap();
        let tea = catalog
            .create_product(new_product(drinks.id_typed(), "Tea", 200))
            .unwrap();
        catalog
            .create_product(new_product(drinks.id_typed(), "Coffee", 250))
            .unwrap();
        let juice = catalog
            .create_product(new_product(drinks.id_typed(), "Juice", 300))
            .unwrap();
        catalog.set_product_active(juice.id_typed(), false).unwrap();

        let names: Vec<String> = catalog
            .list_active_products_by_category(drinks.id_typed())
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["Coffee", "Tea"]);

        // Inactive products are still readable by id.
        assert_eq!(catalog.get_product(juice.id_typed()).unwrap().name(), "Juice");
        assert_eq!(catalog.get_product(tea.id_typed()).unwrap().price(), 200);
    }

    #[test]
    fn inactive_category_hides_its_products() {
        let catalog = service();
        let food = catalog.create_category("Food").unwrap();
        catalog
            .create_product(new_product(food.id_typed(), "Soup", 300))
            .unwrap();
        catalog.set_category_active(food.id_typed(), false).unwrap();

        assert!(catalog.list_active_categories().unwrap().is_empty());
        assert!(catalog
            .list_active_products_by_category(food.id_typed())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let catalog = service();
        assert_eq!(
            catalog.get_product(ProductId::new()),
            Err(CommerceError::Domain(DomainError::NotFound("product")))
        );
        assert_eq!(
            catalog.list_active_products_by_category(CategoryId::new()),
            Err(CommerceError::Domain(DomainError::NotFound("category")))
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let catalog = service();
        catalog.create_category("Drinks").unwrap();
        assert!(matches!(
            catalog.create_category("DRINKS"),
            Err(CommerceError::Domain(DomainError::Validation(_)))
        ));

        catalog.create_ingredient("Basil").unwrap();
        assert!(matches!(
            catalog.create_ingredient("basil"),
            Err(CommerceError::Domain(DomainError::Validation(_)))
        ));
    }

    #[test]
    fn product_ingredients_resolve_by_id() {
        let catalog = service();
        let pizza = catalog.create_category("Pizza").unwrap();
        let basil = catalog.create_ingredient("Basil").unwrap();
        let cheese = catalog.create_ingredient("Cheese").unwrap();

        let mut input = new_product(pizza.id_typed(), "Margherita", 750);
        input.ingredient_ids = [cheese.id_typed(), basil.id_typed()].into_iter().collect();
        let margherita = catalog.create_product(input).unwrap();

        let names: Vec<String> = catalog
            .product_ingredients(margherita.id_typed())
            .unwrap()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, ["Basil", "Cheese"]);
    }

    #[test]
    fn product_needs_existing_category_and_ingredients() {
        let catalog = service();
        assert_eq!(
            catalog.create_product(new_product(CategoryId::new(), "Ghost", 1)),
            Err(CommerceError::Domain(DomainError::NotFound("category")))
        );

        let pizza = catalog.create_category("Pizza").unwrap();
        let mut input = new_product(pizza.id_typed(), "Mystery", 1);
        input.ingredient_ids.insert(IngredientId::new());
        assert_eq!(
            catalog.create_product(input),
            Err(CommerceError::Domain(DomainError::NotFound("ingredient")))
        );
    }
}
