use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainResult, Entity, IngredientId, ProductId};

use crate::category::Category;

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub image: Option<String>,
    pub ingredient_ids: BTreeSet<IngredientId>,
}

/// A sellable catalog item.
///
/// Ingredients are referenced by id only; resolving them is a lookup against
/// the catalog, never an object-graph walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    category_id: CategoryId,
    name: String,
    description: Option<String>,
    price: u64,
    image: Option<String>,
    active: bool,
    ingredient_ids: BTreeSet<IngredientId>,
}

impl Product {
    /// New products start active.
    pub fn create(id: ProductId, input: NewProduct) -> DomainResult<Self> {
        Ok(Self {
            id,
            category_id: input.category_id,
            name: crate::required_name("product", &input.name)?,
            description: non_blank(input.description),
            price: input.price,
            image: non_blank(input.image),
            active: true,
            ingredient_ids: input.ingredient_ids,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Current price in minor units. Orders never read this after checkout.
    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ingredient_ids(&self) -> &BTreeSet<IngredientId> {
        &self.ingredient_ids
    }

    pub fn set_price(&mut self, price: u64) {
        self.price = price;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Check if the product can be put in a cart or ordered.
    ///
    /// Both the product and the category it belongs to must be active.
    pub fn is_available_in(&self, category: &Category) -> bool {
        self.active && category.is_active() && category.id_typed() == self.category_id
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
