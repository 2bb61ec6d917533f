use serde::{Deserialize, Serialize};

use crate::models::Product;

/// A company that ships products
#[derive(Debug, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    /// Products currently supplied
    pub products: Vec<Product>,
}
