//! Product catalog record.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// A product as the reservation engine sees it.
///
/// The catalog owns the authoritative stock counter; the engine only reads
/// `stock` and `name`, and `stock` is mutated exclusively by Confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier (SKU).
    pub id: ProductId,

    /// Human-readable product name.
    pub name: String,

    /// Physical stock on hand, never negative.
    pub stock: u32,
}

impl Product {
    /// Creates a new product record.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product() {
        let product = Product::new("SKU-001", "Widget", 10);
        assert_eq!(product.id.as_str(), "SKU-001");
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let product = Product::new("SKU-001", "Widget", 10);
        let json = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, deserialized);
    }
}
