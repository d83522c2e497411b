//! Search scoring over a snapshot of cached records.
//!
//! Pure and synchronous: the caller fetches the records and applies access
//! bookkeeping to whatever is returned.

use crate::eviction::DAY_MS;
use crate::record::ProductRecord;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

const EXACT_NAME_SCORE: f64 = 10.0;
const NAME_PREFIX_SCORE: f64 = 5.0;
const NAME_CONTAINS_SCORE: f64 = 3.0;
const BRAND_SCORE: f64 = 2.0;
const CATEGORY_SCORE: f64 = 1.0;
const RECENT_DAY_SCORE: f64 = 2.0;
const RECENT_WEEK_SCORE: f64 = 1.0;
const POPULARITY_PER_ACCESS: f64 = 0.1;
const POPULARITY_CAP: f64 = 2.0;

/// A record paired with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredProduct {
    pub record: ProductRecord,
    pub score: f64,
}

/// Whether the lowercased `query` occurs in name, brand, category or any
/// search keyword.
pub fn matches(record: &ProductRecord, query: &str) -> bool {
    record.display_name().to_lowercase().contains(query)
        || record.brand.to_lowercase().contains(query)
        || record.category.to_lowercase().contains(query)
        || record
            .search_keywords
            .as_ref()
            .is_some_and(|keywords| keywords.iter().any(|k| k.to_lowercase().contains(query)))
}

/// Relevance of a matching record for the lowercased `query` at time `now`.
pub fn score(record: &ProductRecord, query: &str, now: i64) -> f64 {
    let name = record.display_name().to_lowercase();
    let mut score = if name == query {
        EXACT_NAME_SCORE
    } else if name.starts_with(query) {
        NAME_PREFIX_SCORE
    } else if name.contains(query) {
        NAME_CONTAINS_SCORE
    } else {
        0.0
    };

    if record.brand.to_lowercase().contains(query) {
        score += BRAND_SCORE;
    }
    if record.category.to_lowercase().contains(query) {
        score += CATEGORY_SCORE;
    }

    let age = now.saturating_sub(record.last_accessed);
    if age < DAY_MS {
        score += RECENT_DAY_SCORE;
    } else if age < 7 * DAY_MS {
        score += RECENT_WEEK_SCORE;
    }

    score + (record.access_count as f64 * POPULARITY_PER_ACCESS).min(POPULARITY_CAP)
}

/// Filter, score and order `records` for `query`, keeping at most `limit`.
///
/// An empty query matches every record. Equal scores keep scan order.
pub fn rank(records: Vec<ProductRecord>, query: &str, limit: usize, now: i64) -> Vec<ScoredProduct> {
    let query = query.to_lowercase();

    let mut scored: Vec<ScoredProduct> = records
        .into_iter()
        .filter(|record| matches(record, &query))
        .map(|record| {
            let score = score(&record, &query, now);
            ScoredProduct { record, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
