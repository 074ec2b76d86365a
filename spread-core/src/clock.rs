//! Microsecond wall-clock timestamps for the command envelope.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UNIX time in microseconds. Saturates to `i64::MAX` rather than
/// panicking if the system clock is absurdly far in the future.
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
