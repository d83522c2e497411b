//! The offline product cache.
//!
//! [`ProductCache`] ties the store, normalizer, ranking and access tracking
//! together behind operations that always produce a value. Construct one at
//! the application's composition root and share it by reference.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::eviction::retention_cutoff;
use crate::normalize::Normalizer;
use crate::outcome::Outcome;
use crate::record::{ProductRecord, now_millis};
use crate::search;
use crate::source::ProductSource;
use crate::store::ProductDb;
use crate::usage;
use crate::Error;

/// Summary of what the cache holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_products: u64,
    pub usage_bytes: u64,
    pub quota_bytes: u64,
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

#[derive(Debug)]
enum StoreState {
    Closed,
    Open(ProductDb),
    Unavailable(String),
}

/// Offline product cache backed by a local SQLite store.
///
/// Operations that touch storage open it on first use. If opening fails the
/// cache remembers the store as unavailable and every operation returns its
/// sentinel until [`initialize`](Self::initialize) is called again.
#[derive(Debug)]
pub struct ProductCache {
    location: Location,
    config: CacheConfig,
    normalizer: Normalizer,
    state: RwLock<StoreState>,
}

impl ProductCache {
    /// Cache persisted at `config.db_path`.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_location(Location::File(config.db_path.clone()), config)
    }

    /// Cache held in memory for the lifetime of the handle.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::with_location(Location::Memory, config)
    }

    fn with_location(location: Location, config: CacheConfig) -> Self {
        let normalizer = Normalizer::new(config.default_source.clone());
        Self { location, config, normalizer, state: RwLock::new(StoreState::Closed) }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Open the store, creating or upgrading its schema.
    ///
    /// A no-op returning `true` when already open. After a failed open the
    /// next call tries again.
    pub async fn initialize(&self) -> Outcome<bool> {
        let mut state = self.state.write().await;
        match self.open_locked(&mut state).await {
            Ok(_) => Outcome::ok(true),
            Err(e) => Outcome::degraded(false, "initialize", e),
        }
    }

    /// Drop the connection. The next operation reopens it; an in-memory
    /// cache starts empty again.
    pub async fn close(&self) {
        *self.state.write().await = StoreState::Closed;
    }

    async fn open_locked(&self, state: &mut StoreState) -> Result<ProductDb, Error> {
        if let StoreState::Open(db) = state {
            return Ok(db.clone());
        }

        let opened = match &self.location {
            Location::File(path) => ProductDb::open(path).await,
            Location::Memory => ProductDb::open_in_memory().await,
        };

        match opened {
            Ok(db) => {
                tracing::debug!(location = ?self.location, "product cache opened");
                *state = StoreState::Open(db.clone());
                Ok(db)
            }
            Err(e) => {
                *state = StoreState::Unavailable(e.to_string());
                Err(e)
            }
        }
    }

    async fn store(&self) -> Result<ProductDb, Error> {
        {
            let state = self.state.read().await;
            match &*state {
                StoreState::Open(db) => return Ok(db.clone()),
                StoreState::Unavailable(reason) => return Err(Error::StorageUnavailable(reason.clone())),
                StoreState::Closed => {}
            }
        }

        let mut state = self.state.write().await;
        if let StoreState::Unavailable(reason) = &*state {
            return Err(Error::StorageUnavailable(reason.clone()));
        }
        self.open_locked(&mut state).await
    }

    /// Count a read of `records` at `now`, in memory and in the store.
    async fn track_access(&self, db: &ProductDb, records: &mut [ProductRecord], now: i64) -> Result<(), Error> {
        for record in records.iter_mut() {
            usage::touch(record, now);
        }
        let ids = records.iter().map(|r| r.id.clone()).collect();
        db.record_access(ids, now).await.map(|_| ())
    }

    /// Normalize and store one payload.
    ///
    /// Returns the record as stored, or `None` if the payload was malformed
    /// or the write failed.
    pub async fn cache_product(&self, payload: &Value) -> Outcome<Option<ProductRecord>> {
        let record = match self.normalizer.normalize(payload, now_millis()) {
            Ok(record) => record,
            Err(e) => return Outcome::degraded(None, "cache_product", e),
        };

        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => return Outcome::degraded(None, "cache_product", e),
        };

        if let Err(e) = db.upsert_product(&record).await {
            return Outcome::degraded(None, record.id, e);
        }

        match db.get_product(&record.id).await {
            Ok(Some(stored)) => Outcome::ok(Some(stored)),
            Ok(None) => Outcome::ok(Some(record)),
            Err(e) => {
                let id = record.id.clone();
                Outcome::degraded(Some(record), id, e)
            }
        }
    }

    /// Normalize and store a batch of payloads.
    ///
    /// Malformed payloads and records the store rejects are skipped; the value
    /// is the number of records written.
    pub async fn cache_products(&self, payloads: &[Value]) -> Outcome<usize> {
        let now = now_millis();
        let mut outcome = Outcome::ok(0);

        let mut records = Vec::with_capacity(payloads.len());
        for (index, payload) in payloads.iter().enumerate() {
            match self.normalizer.normalize(payload, now) {
                Ok(record) => records.push(record),
                Err(e) => outcome.push(format!("cache_products[{index}]"), e),
            }
        }

        if records.is_empty() {
            return outcome;
        }

        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => {
                outcome.push("cache_products", e);
                return outcome;
            }
        };

        match db.upsert_products(records).await {
            Ok(batch) => {
                outcome.value = batch.written;
                for (id, e) in batch.rejected {
                    outcome.push(id, e);
                }
            }
            Err(e) => outcome.push("cache_products", e),
        }

        tracing::debug!(written = outcome.value, submitted = payloads.len(), "cached product batch");
        outcome
    }

    /// Store records that are already canonical, such as a previous export.
    ///
    /// Their bookkeeping is taken as given for new ids, with negative access
    /// counts raised to zero; existing ids keep their own `cached_at` and
    /// `access_count`.
    pub async fn import_records(&self, records: Vec<ProductRecord>) -> Outcome<usize> {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.access_count = record.access_count.max(0);
                record
            })
            .collect();

        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => return Outcome::degraded(0, "import_records", e),
        };

        match db.upsert_products(records).await {
            Ok(batch) => {
                let mut outcome = Outcome::ok(batch.written);
                for (id, e) in batch.rejected {
                    outcome.push(id, e);
                }
                outcome
            }
            Err(e) => Outcome::degraded(0, "import_records", e),
        }
    }

    /// Rank cached products for `query`, best first.
    ///
    /// `limit` defaults to the configured search limit. Every returned record
    /// counts as viewed.
    pub async fn search_products(&self, query: &str, limit: Option<usize>) -> Outcome<Vec<ProductRecord>> {
        let limit = limit.unwrap_or(self.config.search_limit);

        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => return Outcome::degraded(Vec::new(), "search_products", e),
        };

        let records = match db.all_products().await {
            Ok(records) => records,
            Err(e) => return Outcome::degraded(Vec::new(), "search_products", e),
        };

        let now = now_millis();
        let mut results: Vec<ProductRecord> = search::rank(records, query, limit, now)
            .into_iter()
            .map(|scored| scored.record)
            .collect();

        tracing::debug!(query, hits = results.len(), "searched product cache");

        match self.track_access(&db, &mut results, now).await {
            Ok(()) => Outcome::ok(results),
            Err(e) => Outcome::degraded(results, "search_products", e),
        }
    }

    /// Get one product by id, counting the read.
    pub async fn get_product(&self, id: &str) -> Outcome<Option<ProductRecord>> {
        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => return Outcome::degraded(None, id, e),
        };

        let mut record = match db.get_product(id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Outcome::ok(None),
            Err(e) => return Outcome::degraded(None, id, e),
        };

        match self.track_access(&db, std::slice::from_mut(&mut record), now_millis()).await {
            Ok(()) => Outcome::ok(Some(record)),
            Err(e) => Outcome::degraded(Some(record), id, e),
        }
    }

    /// Every cached product without counting reads.
    pub async fn all_products(&self) -> Outcome<Vec<ProductRecord>> {
        match self.store().await {
            Ok(db) => match db.all_products().await {
                Ok(records) => Outcome::ok(records),
                Err(e) => Outcome::degraded(Vec::new(), "all_products", e),
            },
            Err(e) => Outcome::degraded(Vec::new(), "all_products", e),
        }
    }

    /// Most accessed products first, without counting reads.
    pub async fn popular_products(&self, limit: usize) -> Outcome<Vec<ProductRecord>> {
        match self.store().await {
            Ok(db) => match db.popular_products(limit).await {
                Ok(records) => Outcome::ok(records),
                Err(e) => Outcome::degraded(Vec::new(), "popular_products", e),
            },
            Err(e) => Outcome::degraded(Vec::new(), "popular_products", e),
        }
    }

    /// Remove one product. The value says whether it existed.
    pub async fn delete_product(&self, id: &str) -> Outcome<bool> {
        match self.store().await {
            Ok(db) => match db.delete_product(id).await {
                Ok(removed) => Outcome::ok(removed),
                Err(e) => Outcome::degraded(false, id, e),
            },
            Err(e) => Outcome::degraded(false, id, e),
        }
    }

    /// Evict products not accessed within `days` (configured retention when
    /// `None`). The value is the number evicted.
    pub async fn clear_old_cache(&self, days: Option<u32>) -> Outcome<u64> {
        let days = days.unwrap_or(self.config.retention_days);
        let cutoff = retention_cutoff(now_millis(), days);

        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => return Outcome::degraded(0, "clear_old_cache", e),
        };

        match db.purge_accessed_before(cutoff).await {
            Ok(deleted) => {
                tracing::debug!(days, deleted, "evicted stale products");
                Outcome::ok(deleted)
            }
            Err(e) => Outcome::degraded(0, "clear_old_cache", e),
        }
    }

    /// Record count and storage usage.
    pub async fn get_cache_stats(&self) -> Outcome<CacheStats> {
        let db = match self.store().await {
            Ok(db) => db,
            Err(e) => return Outcome::degraded(CacheStats::default(), "get_cache_stats", e),
        };

        let mut outcome = Outcome::ok(CacheStats::default());

        match db.count_products().await {
            Ok(count) => outcome.value.total_products = count,
            Err(e) => outcome.push("get_cache_stats", e),
        }

        match db.storage_estimate().await {
            Ok(estimate) => {
                outcome.value.usage_bytes = estimate.usage_bytes;
                outcome.value.quota_bytes = estimate.quota_bytes;
            }
            Err(e) => outcome.push("get_cache_stats", e),
        }

        outcome
    }

    /// Remove every product. The value is the number removed.
    pub async fn clear_all_cache(&self) -> Outcome<u64> {
        match self.store().await {
            Ok(db) => match db.clear_products().await {
                Ok(deleted) => Outcome::ok(deleted),
                Err(e) => Outcome::degraded(0, "clear_all_cache", e),
            },
            Err(e) => Outcome::degraded(0, "clear_all_cache", e),
        }
    }

    /// Pull popular products from `source` and cache them.
    ///
    /// One attempt, no retry. The value is the number of records cached;
    /// any fetch failure yields zero.
    pub async fn sync_with_server<S>(&self, source: &S) -> Outcome<usize>
    where
        S: ProductSource + ?Sized,
    {
        let batch_size = self.config.sync.batch_size;
        tracing::debug!(batch_size, "syncing popular products");

        let mut payloads = match source.fetch_popular(batch_size).await {
            Ok(payloads) => payloads,
            Err(e) => return Outcome::degraded(0, "sync_with_server", e),
        };
        payloads.truncate(batch_size);

        self.cache_products(&payloads).await
    }
}
