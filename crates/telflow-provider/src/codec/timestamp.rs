use chrono::DateTime;

/// Output format of every decoded timestamp: ISO-8601 with an explicit
/// offset and no fractional seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Parse an RFC 2822 (2010-04-01 API) or RFC 3339 (v1 APIs) timestamp and
/// render it in [`TIMESTAMP_FORMAT`]. `None` if the input is blank or invalid.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}
