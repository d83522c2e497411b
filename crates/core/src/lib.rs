//! Core of the pantry offline product cache.
//!
//! This crate provides:
//! - [`ProductCache`], the facade applications hold
//! - SQLite-backed storage with versioned migrations
//! - Payload normalization, search ranking and access-based eviction
//! - Layered configuration and the unified error type
//!
//! The HTTP implementation of [`ProductSource`] lives in `pantry-client`.

pub mod cache;
pub mod config;
pub mod error;
pub mod eviction;
pub mod normalize;
pub mod outcome;
pub mod record;
pub mod search;
pub mod source;
pub mod store;
pub mod usage;

pub use cache::{CacheStats, ProductCache};
pub use config::{CacheConfig, ConfigError, SyncConfig};
pub use error::Error;
pub use normalize::Normalizer;
pub use outcome::{Diagnostic, Outcome};
pub use record::ProductRecord;
pub use source::{ProductSource, StaticSource};
pub use store::ProductDb;
