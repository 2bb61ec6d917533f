use crate::models::Product;
use crate::suppliers::Supplier;

/// List every product
pub async fn list_products(page: Option<i32>) -> Vec<Product> {
    let _ = page;
    Vec::new()
}

/// Fetch one product
///
/// Returns 404 when the product does not exist.
pub async fn get_product(id: i64) -> Option<Product> {
    let _ = id;
    None
}

pub async fn create_supplier(supplier: Supplier) {
    let _ = supplier;
}
