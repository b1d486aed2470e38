use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Current wall-clock time in UTC.
pub fn timestamp_now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp as RFC 3339 (e.g. `2026-01-01T00:00:00Z`).
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}
