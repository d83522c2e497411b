//! Age-based eviction window.

/// Milliseconds in one day.
pub const DAY_MS: i64 = 86_400_000;

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Last-access timestamp at or below which a record is evicted.
///
/// The boundary is inclusive: a record accessed exactly `days` ago goes.
pub fn retention_cutoff(now: i64, days: u32) -> i64 {
    now.saturating_sub(i64::from(days).saturating_mul(DAY_MS))
}
