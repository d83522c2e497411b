//! SQLite-backed product store.
//!
//! A persistent, versioned record store with async access via
//! tokio-rusqlite. It provides:
//!
//! - One `products` table keyed by `id` with upsert semantics
//! - Secondary indexes on name, brand, category, upstream id, barcode and
//!   last access time
//! - Ordered schema migrations
//! - WAL mode for concurrent readers

pub mod connection;
pub mod migrations;
pub mod products;

pub use connection::ProductDb;
pub use products::{BatchWrite, StorageEstimate};
