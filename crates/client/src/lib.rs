//! Network side of the pantry product cache.
//!
//! This crate provides the HTTP [`ProductSource`](pantry_core::ProductSource)
//! that warms the offline cache with popular products.

pub mod sync;

pub use sync::{HttpProductSource, PopularProductsResponse, SyncError};
