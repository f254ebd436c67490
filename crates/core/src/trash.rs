//! Retention rules for soft-deleted menu photos.

use chrono::Duration;

use crate::types::Timestamp;

/// Days a soft-deleted row stays restorable before it is purged.
pub const TRASH_RETENTION_DAYS: i64 = 30;

/// Rows deleted at or before this instant are due for purging.
pub fn purge_cutoff(now: Timestamp) -> Timestamp {
    now - Duration::days(TRASH_RETENTION_DAYS)
}

pub fn is_expired(deleted_at: Timestamp, now: Timestamp) -> bool {
    deleted_at <= purge_cutoff(now)
}

/// Whole days left before purge, never negative.
pub fn days_remaining(deleted_at: Timestamp, now: Timestamp) -> i64 {
    let expires_at = deleted_at + Duration::days(TRASH_RETENTION_DAYS);
    (expires_at - now).num_days().max(0)
}
