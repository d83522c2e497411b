//! Popular-products response body.

use serde::Deserialize;
use serde_json::Value;

/// Body of `GET /api/products/search`.
///
/// Products stay as raw JSON; the cache normalizes them one by one so a
/// single odd entry does not sink the batch.
#[derive(Debug, Clone, Deserialize)]
pub struct PopularProductsResponse {
    pub success: bool,
    #[serde(default)]
    pub products: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_default_to_empty() {
        let body: PopularProductsResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(body.success);
        assert!(body.products.is_empty());
    }

    #[test]
    fn test_keeps_heterogeneous_products() {
        let body: PopularProductsResponse =
            serde_json::from_str(r#"{"success": true, "products": [{"id": "a"}, 7, null]}"#).unwrap();
        assert_eq!(body.products.len(), 3);
    }

    #[test]
    fn test_success_is_required() {
        assert!(serde_json::from_str::<PopularProductsResponse>(r#"{"products": []}"#).is_err());
    }
}
