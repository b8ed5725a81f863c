use time::{Duration, OffsetDateTime};

/// Current UTC time truncated to the millisecond precision the store keeps, so a freshly
/// written timestamp compares equal to the one read back.
#[must_use]
pub fn now() -> OffsetDateTime {
    truncate_to_millis(OffsetDateTime::now_utc())
}

#[must_use]
pub fn truncate_to_millis(date_time: OffsetDateTime) -> OffsetDateTime {
    date_time - Duration::nanoseconds(i64::from(date_time.nanosecond() % 1_000_000))
}
