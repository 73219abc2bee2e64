use serde::{Deserialize, Serialize};

use storefront_core::{DomainResult, Entity, IngredientId};

/// An ingredient shared by any number of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    id: IngredientId,
    name: String,
}

impl Ingredient {
    pub fn new(id: IngredientId, name: &str) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: crate::required_name("ingredient", name)?,
        })
    }

    pub fn id_typed(&self) -> IngredientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> String {
        crate::normalize_name(&self.name)
    }
}

impl Entity for Ingredient {
    type Id = IngredientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
