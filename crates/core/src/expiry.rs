//! Expiry window tokens accepted from clients.

/// Window applied when the client sends an unrecognized token (one hour).
pub const DEFAULT_EXPIRY_SECONDS: u64 = 60 * 60;

/// Longest window any token resolves to (one day). No live drop can be older
/// than this, which bounds how long an orphaned blob may legitimately exist.
pub const MAX_EXPIRY_SECONDS: u64 = 24 * 60 * 60;

/// Resolve an expiry token to a number of seconds.
///
/// `5min`/`5m` → 300, `1hour`/`1h` → 3600, `1day`/`1d` → 86400. Anything else,
/// including a missing token, falls back to [`DEFAULT_EXPIRY_SECONDS`].
pub fn expiry_seconds(token: Option<&str>) -> u64 {
    match token.map(str::trim) {
        Some("5min" | "5m") => 5 * 60,
        Some("1hour" | "1h") => 60 * 60,
        Some("1day" | "1d") => MAX_EXPIRY_SECONDS,
        _ => DEFAULT_EXPIRY_SECONDS,
    }
}
