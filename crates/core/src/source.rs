//! Remote product sources used to warm the cache.

use async_trait::async_trait;
use serde_json::Value;

use crate::Error;

/// Somewhere popular product payloads can be pulled from.
///
/// Implementations perform one fetch per call with no retry; the cache
/// decides what to do with a failure.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch up to `limit` raw product payloads.
    async fn fetch_popular(&self, limit: usize) -> Result<Vec<Value>, Error>;
}

/// A fixed list of payloads, for seeding a cache without a network.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    payloads: Vec<Value>,
}

impl StaticSource {
    pub fn new(payloads: Vec<Value>) -> Self {
        Self { payloads }
    }
}

#[async_trait]
impl ProductSource for StaticSource {
    async fn fetch_popular(&self, limit: usize) -> Result<Vec<Value>, Error> {
        Ok(self.payloads.iter().take(limit).cloned().collect())
    }
}
