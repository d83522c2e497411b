//! Popular-products request parameters.

use serde::Serialize;

/// Query the server treats as "most popular".
pub const POPULAR_QUERY: &str = "popular";

/// Query string for `GET /api/products/search`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PopularRequest {
    pub q: &'static str,
    pub limit: usize,
}

impl PopularRequest {
    pub fn new(limit: usize) -> Self {
        Self { q: POPULAR_QUERY, limit }
    }
}
