use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the UNIX epoch, as carried in wire timestamps.
pub fn current_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
