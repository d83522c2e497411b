//! Product CRUD operations.
//!
//! Records are stored one row per product. List-valued and opaque fields are
//! kept as JSON text columns and decoded on read.

use super::connection::ProductDb;
use crate::Error;
use crate::record::ProductRecord;
use serde::Serialize;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row};

const SELECT_COLUMNS: &str = "SELECT
    id, name, brand, category, image_url,
    badges_json, nutrition_json, search_keywords_json, enrichment_source,
    upstream_id, barcode, extra_json,
    cached, cached_at, last_accessed, access_count
FROM products";

/// Preserves `cached_at` and `access_count` of an existing row and never
/// moves `last_accessed` backwards.
const UPSERT_SQL: &str = "INSERT INTO products (
    id, name, brand, category, image_url,
    badges_json, nutrition_json, search_keywords_json, enrichment_source,
    upstream_id, barcode, extra_json,
    cached, cached_at, last_accessed, access_count
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13, ?14, ?15)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    brand = excluded.brand,
    category = excluded.category,
    image_url = excluded.image_url,
    badges_json = excluded.badges_json,
    nutrition_json = excluded.nutrition_json,
    search_keywords_json = excluded.search_keywords_json,
    enrichment_source = excluded.enrichment_source,
    upstream_id = excluded.upstream_id,
    barcode = excluded.barcode,
    extra_json = excluded.extra_json,
    cached = 1,
    last_accessed = MAX(products.last_accessed, excluded.last_accessed)";

/// Result of a batch write.
#[derive(Debug, Default)]
pub struct BatchWrite {
    /// Records durably written.
    pub written: usize,
    /// Records rejected by the store, with the reason.
    pub rejected: Vec<(String, Error)>,
}

/// Best-effort storage accounting, in bytes. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageEstimate {
    pub usage_bytes: u64,
    pub quota_bytes: u64,
}

/// Raw column values, decoded into a record outside the row callback.
struct ProductRow {
    id: String,
    name: Option<String>,
    brand: String,
    category: String,
    image_url: String,
    badges_json: String,
    nutrition_json: Option<String>,
    search_keywords_json: Option<String>,
    enrichment_source: String,
    upstream_id: Option<String>,
    barcode: Option<String>,
    extra_json: String,
    cached: bool,
    cached_at: i64,
    last_accessed: i64,
    access_count: i64,
}

impl ProductRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            brand: row.get(2)?,
            category: row.get(3)?,
            image_url: row.get(4)?,
            badges_json: row.get(5)?,
            nutrition_json: row.get(6)?,
            search_keywords_json: row.get(7)?,
            enrichment_source: row.get(8)?,
            upstream_id: row.get(9)?,
            barcode: row.get(10)?,
            extra_json: row.get(11)?,
            cached: row.get::<_, i32>(12)? == 1,
            cached_at: row.get(13)?,
            last_accessed: row.get(14)?,
            access_count: row.get(15)?,
        })
    }

    fn into_record(self) -> Result<ProductRecord, Error> {
        let corrupt = |field: &str, e: serde_json::Error| Error::CorruptRecord(format!("{} {field}: {e}", self.id));

        let badges = serde_json::from_str(&self.badges_json).map_err(|e| corrupt("badges", e))?;
        let nutrition = self
            .nutrition_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| corrupt("nutrition", e))?;
        let search_keywords = self
            .search_keywords_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| corrupt("search_keywords", e))?;
        let extra = serde_json::from_str(&self.extra_json).map_err(|e| corrupt("extra", e))?;

        Ok(ProductRecord {
            id: self.id,
            name: self.name,
            brand: self.brand,
            category: self.category,
            image_url: self.image_url,
            badges,
            nutrition,
            search_keywords,
            enrichment_source: self.enrichment_source,
            upstream_id: self.upstream_id,
            barcode: self.barcode,
            cached: self.cached,
            cached_at: self.cached_at,
            last_accessed: self.last_accessed,
            access_count: self.access_count,
            extra,
        })
    }
}

fn upsert_row(conn: &rusqlite::Connection, record: &ProductRecord) -> Result<(), Error> {
    let nutrition_json = record.nutrition.as_ref().map(serde_json::to_string).transpose()?;
    let keywords_json = record.search_keywords.as_ref().map(serde_json::to_string).transpose()?;

    conn.execute(
        UPSERT_SQL,
        params![
            &record.id,
            &record.name,
            &record.brand,
            &record.category,
            &record.image_url,
            serde_json::to_string(&record.badges)?,
            nutrition_json,
            keywords_json,
            &record.enrichment_source,
            &record.upstream_id,
            &record.barcode,
            serde_json::to_string(&record.extra)?,
            record.cached_at,
            record.last_accessed,
            record.access_count,
        ],
    )?;
    Ok(())
}

/// Decode scanned rows, skipping any that no longer decode.
fn collect_records(rows: Vec<ProductRow>) -> Vec<ProductRecord> {
    rows.into_iter()
        .filter_map(|row| match row.into_record() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable product row");
                None
            }
        })
        .collect()
}

impl ProductDb {
    /// Insert or update a product.
    ///
    /// Descriptive fields are overwritten; access bookkeeping of an existing
    /// row is kept.
    pub async fn upsert_product(&self, record: &ProductRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { upsert_row(conn, &record) })
            .await
            .map_err(Error::from)
    }

    /// Insert or update many products in one transaction.
    ///
    /// A record the store rejects is skipped and reported; the remaining
    /// records are still committed.
    pub async fn upsert_products(&self, records: Vec<ProductRecord>) -> Result<BatchWrite, Error> {
        self.conn
            .call(move |conn| -> Result<BatchWrite, Error> {
                let tx = conn.transaction()?;
                let mut outcome = BatchWrite::default();

                for record in &records {
                    match upsert_row(&tx, record) {
                        Ok(()) => outcome.written += 1,
                        Err(e) => {
                            tracing::debug!(id = %record.id, error = %e, "store rejected product in batch write");
                            outcome.rejected.push((record.id.clone(), e));
                        }
                    }
                }

                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(Error::from)
    }

    /// Get a product by id.
    ///
    /// Returns None if the id doesn't exist in the store.
    pub async fn get_product(&self, id: &str) -> Result<Option<ProductRecord>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ProductRecord>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;

                match stmt.query_row(params![id], ProductRow::from_row) {
                    Ok(row) => Ok(Some(row.into_record()?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Every stored product, in primary key order.
    ///
    /// Rows that fail to decode are logged and left out.
    pub async fn all_products(&self) -> Result<Vec<ProductRecord>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<ProductRecord>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
                let rows = stmt
                    .query_map([], ProductRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(collect_records(rows))
            })
            .await
            .map_err(Error::from)
    }

    /// Most accessed products first, ties broken by recency.
    pub async fn popular_products(&self, limit: usize) -> Result<Vec<ProductRecord>, Error> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<Vec<ProductRecord>, Error> {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY access_count DESC, last_accessed DESC LIMIT ?1"))?;
                let rows = stmt
                    .query_map(params![limit], ProductRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(collect_records(rows))
            })
            .await
            .map_err(Error::from)
    }

    /// Count one access for each id at time `now`.
    ///
    /// The increment happens in SQL so concurrent readers never lose counts.
    /// Returns the number of rows updated.
    pub async fn record_access(&self, ids: Vec<String>, now: i64) -> Result<u64, Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut updated = 0u64;
                {
                    let mut stmt = tx.prepare(
                        "UPDATE products SET
                            access_count = access_count + 1,
                            last_accessed = MAX(last_accessed, ?2)
                        WHERE id = ?1",
                    )?;
                    for id in &ids {
                        updated += stmt.execute(params![id, now])? as u64;
                    }
                }
                tx.commit()?;
                Ok(updated)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a product by id.
    ///
    /// Returns whether a row was removed.
    pub async fn delete_product(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every product last accessed at or before `cutoff` (epoch millis).
    ///
    /// Walks the `last_accessed` index. Returns the number of deleted entries.
    pub async fn purge_accessed_before(&self, cutoff: i64) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM products WHERE last_accessed <= ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every product.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_products(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM products", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Total number of stored products.
    pub async fn count_products(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
                Ok(u64::try_from(count).unwrap_or_default())
            })
            .await
            .map_err(Error::from)
    }

    /// Bytes used by the database and the most it may grow to.
    pub async fn storage_estimate(&self) -> Result<StorageEstimate, Error> {
        self.conn
            .call(|conn| -> Result<StorageEstimate, Error> {
                let (usage, quota): (i64, i64) = conn.query_row(
                    "SELECT p.page_count * s.page_size, m.max_page_count * s.page_size
                     FROM pragma_page_count() AS p, pragma_page_size() AS s, pragma_max_page_count() AS m",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(StorageEstimate {
                    usage_bytes: u64::try_from(usage).unwrap_or_default(),
                    quota_bytes: u64::try_from(quota).unwrap_or_default(),
                })
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn make_test_record(id: &str, name: &str, last_accessed: i64) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: Some(name.to_string()),
            brand: "Acme".to_string(),
            category: "Dairy".to_string(),
            image_url: format!("https://img.example.com/{id}.png"),
            badges: vec!["organic".to_string()],
            nutrition: Some(json!({"calories": 120})),
            search_keywords: Some(vec!["dairy".to_string()]),
            enrichment_source: "offline_cache".to_string(),
            upstream_id: Some(format!("up-{id}")),
            barcode: None,
            cached: true,
            cached_at: last_accessed,
            last_accessed,
            access_count: 0,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = ProductDb::open_in_memory().await.unwrap();
        let record = make_test_record("p1", "Whole Milk", 1_000);

        db.upsert_product(&record).await.unwrap();

        let retrieved = db.get_product("p1").await.unwrap().unwrap();
        assert_eq!(retrieved, record);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = ProductDb::open_in_memory().await.unwrap();
        assert!(db.get_product("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_fields_and_keeps_bookkeeping() {
        let db = ProductDb::open_in_memory().await.unwrap();
        db.upsert_product(&make_test_record("p1", "Whole Milk", 1_000)).await.unwrap();
        db.record_access(vec!["p1".into()], 5_000).await.unwrap();

        let mut replacement = make_test_record("p1", "Organic Whole Milk", 2_000);
        replacement.brand = "Horizon".into();
        db.upsert_product(&replacement).await.unwrap();

        let stored = db.get_product("p1").await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Organic Whole Milk"));
        assert_eq!(stored.brand, "Horizon");
        assert_eq!(stored.cached_at, 1_000);
        assert_eq!(stored.access_count, 1);
        assert_eq!(stored.last_accessed, 5_000);
        assert_eq!(db.count_products().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_isolates_rejected_records() {
        let db = ProductDb::open_in_memory().await.unwrap();
        let mut bad = make_test_record("bad", "No Image", 1_000);
        bad.image_url = String::new();

        let outcome = db
            .upsert_products(vec![make_test_record("a", "A", 1_000), bad, make_test_record("b", "B", 1_000)])
            .await
            .unwrap();

        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, "bad");
        assert_eq!(db.count_products().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_access_is_monotonic() {
        let db = ProductDb::open_in_memory().await.unwrap();
        db.upsert_product(&make_test_record("p1", "Milk", 10_000)).await.unwrap();

        db.record_access(vec!["p1".into()], 20_000).await.unwrap();
        db.record_access(vec!["p1".into()], 15_000).await.unwrap();
        let updated = db.record_access(vec!["p1".into(), "missing".into()], 30_000).await.unwrap();
        assert_eq!(updated, 1);

        let stored = db.get_product("p1").await.unwrap().unwrap();
        assert_eq!(stored.access_count, 3);
        assert_eq!(stored.last_accessed, 30_000);
    }

    #[tokio::test]
    async fn test_purge_boundary_is_inclusive() {
        let db = ProductDb::open_in_memory().await.unwrap();
        let cutoff = 1_000_000;
        db.upsert_product(&make_test_record("older", "Older", cutoff - 1)).await.unwrap();
        db.upsert_product(&make_test_record("exact", "Exact", cutoff)).await.unwrap();
        db.upsert_product(&make_test_record("younger", "Younger", cutoff + 1)).await.unwrap();

        let deleted = db.purge_accessed_before(cutoff).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(db.get_product("older").await.unwrap().is_none());
        assert!(db.get_product("exact").await.unwrap().is_none());
        assert!(db.get_product("younger").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_clear_and_count() {
        let db = ProductDb::open_in_memory().await.unwrap();
        for id in ["a", "b", "c"] {
            db.upsert_product(&make_test_record(id, id, 1_000)).await.unwrap();
        }
        assert_eq!(db.count_products().await.unwrap(), 3);

        assert!(db.delete_product("a").await.unwrap());
        assert!(!db.delete_product("a").await.unwrap());
        assert_eq!(db.all_products().await.unwrap().len(), 2);

        assert_eq!(db.clear_products().await.unwrap(), 2);
        assert_eq!(db.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_popular_products_order() {
        let db = ProductDb::open_in_memory().await.unwrap();
        for id in ["a", "b", "c"] {
            db.upsert_product(&make_test_record(id, id, 1_000)).await.unwrap();
        }
        db.record_access(vec!["b".into(), "c".into()], 2_000).await.unwrap();
        db.record_access(vec!["b".into()], 3_000).await.unwrap();

        let popular = db.popular_products(2).await.unwrap();
        let ids: Vec<&str> = popular.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_storage_estimate_reports_pages() {
        let db = ProductDb::open_in_memory().await.unwrap();
        let estimate = db.storage_estimate().await.unwrap();
        assert!(estimate.usage_bytes > 0);
        assert!(estimate.quota_bytes >= estimate.usage_bytes);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let db = ProductDb::open_in_memory().await.unwrap();
        db.upsert_product(&make_test_record("p1", "Milk", 1_000)).await.unwrap();
        db.conn
            .call(|conn| conn.execute("UPDATE products SET badges_json = 'not json' WHERE id = 'p1'", []))
            .await
            .unwrap();

        let result = db.get_product("p1").await;
        assert!(matches!(result, Err(Error::CorruptRecord(_))));
    }

    #[tokio::test]
    async fn test_scan_skips_corrupt_rows() {
        let db = ProductDb::open_in_memory().await.unwrap();
        db.upsert_product(&make_test_record("good", "Milk", 1_000)).await.unwrap();
        db.upsert_product(&make_test_record("bad", "Bread", 1_000)).await.unwrap();
        db.conn
            .call(|conn| conn.execute("UPDATE products SET extra_json = '[' WHERE id = 'bad'", []))
            .await
            .unwrap();

        let all = db.all_products().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "good");
    }
}
