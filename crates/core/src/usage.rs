//! Read-side access bookkeeping.

use crate::record::ProductRecord;

/// Count one access of `record` at `now`.
///
/// `last_accessed` never moves backwards, so a skewed clock cannot make a
/// record look older than it is.
pub fn touch(record: &mut ProductRecord, now: i64) {
    record.last_accessed = record.last_accessed.max(now);
    record.access_count = record.access_count.saturating_add(1);
}
