//! Filler clip scoring.
//!
//! Both scores are small positive integers so reservoir totals stay exact.

use crate::constants::{MINUTE, RECENCY_CEILING};
use crate::models::DurationMs;

/// Duration score: linear up to 3 minutes, logarithmic beyond
pub fn duration_score(duration_ms: DurationMs) -> u64 {
    let mut x = duration_ms as f64 / MINUTE as f64;
    if x >= 3.0 {
        x = 3.0 + x.ln();
    }
    let y = 10_000.0 * ((x * 1000.0).ceil() + 1.0);
    ((y / 1_000_000.0).ceil() + 1.0) as u64
}

/// Recency score: grows with the time since last play, capped at 5 hours
pub fn recency_score(time_since_ms: DurationMs) -> u64 {
    let x = time_since_ms.min(RECENCY_CEILING) as f64;
    let y = (x / 600.0).ceil() + 1.0;
    (((y * y) / 1_000_000.0).ceil() + 1.0) as u64
}

/// Combined weight of a clip, `None` when it just played
pub fn clip_weight(duration_ms: DurationMs, time_since_ms: DurationMs) -> Option<u64> {
    if time_since_ms <= 0 {
        return None;
    }
    Some(recency_score(time_since_ms) + duration_score(duration_ms))
}
