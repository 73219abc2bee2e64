//! Catalog domain module.
//!
//! Categories, ingredients and products: read-mostly reference data the cart
//! and order engines look prices and availability up in. Pure logic only.

pub mod category;
pub mod ingredient;
pub mod product;

pub use category::Category;
pub use ingredient::Ingredient;
pub use product::{NewProduct, Product};

/// Canonical form used for unique-name comparisons.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn required_name(kind: &str, name: &str) -> storefront_core::DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(storefront_core::DomainError::validation(format!(
            "{kind} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}
