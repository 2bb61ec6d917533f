use serde::{Deserialize, Serialize};

use crate::suppliers::Supplier;

/// A product in the catalog
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product id
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub status: ProductStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    pub supplier: Option<crate::suppliers::Supplier>,
    #[serde(skip)]
    pub cache_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    InStock,
    Discontinued,
}

#[allow(dead_code)]
fn suppliers_of(products: &[Product]) -> Vec<&Supplier> {
    products.iter().filter_map(|p| p.supplier.as_ref()).collect()
}
