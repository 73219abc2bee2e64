use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainResult, Entity};

/// A product category (menu section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    active: bool,
}

impl Category {
    /// New categories start active.
    pub fn new(id: CategoryId, name: &str) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: crate::required_name("category", name)?,
            active: true,
        })
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> String {
        crate::normalize_name(&self.name)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::DomainError;

    #[test]
    fn name_is_trimmed_and_required() {
        let c = Category::new(CategoryId::new(), "  Pizza ").unwrap();
        assert_eq!(c.name(), "Pizza");
        assert_eq!(c.normalized_name(), "pizza");
        assert!(c.is_active());

        assert!(matches!(
            Category::new(CategoryId::new(), "   "),
            Err(DomainError::Validation(_))
        ));
    }
}
