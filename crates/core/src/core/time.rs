pub use core::time::Duration;

// `std::time::Instant::now()` can panic on `wasm32-unknown-unknown` depending on
// how the runtime is configured. `web-time` provides a browser-backed monotonic
// clock via `performance.now()`.
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Wall-clock time as unix milliseconds, used to stamp history and journal entries.
pub fn unix_millis_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    use web_time::{SystemTime, UNIX_EPOCH};
    #[cfg(not(target_arch = "wasm32"))]
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0)
}

/// Milliseconds as `f64`, the unit every sub-score is expressed in.
#[inline]
pub fn as_millis_f64(d: Duration) -> f64 {
    // Whole milliseconds stay exact (no detour through fractional seconds).
    d.as_secs() as f64 * 1000.0 + d.subsec_nanos() as f64 / 1_000_000.0
}
