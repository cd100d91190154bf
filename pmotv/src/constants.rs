//! Timing constants shared by the cursor, the lineup assembler and the
//! schedule generator.
//!
//! The values mirror the behaviour channels have always had; the lineup
//! related ones can be overridden through [`crate::LineupSettings`].

use crate::models::DurationMs;

pub const SECOND: DurationMs = 1000;
pub const MINUTE: DurationMs = 60 * SECOND;
pub const HOUR: DurationMs = 60 * MINUTE;
pub const DAY: DurationMs = 24 * HOUR;

// ============================================================================
// Skew tolerance
// ============================================================================

/// Tolerance absorbing rounding and clock skew in duration comparisons
///
/// A program whose end is closer than this to the cursor is treated as
/// finished, a clip this much longer than a budget still fits, and a time
/// this close to a pad boundary counts as aligned.
pub const SLACK: DurationMs = 300;

// ============================================================================
// Live lineup
// ============================================================================

/// Elapsed time under which a program restarts from its beginning
pub const SMOOTHING_THRESHOLD: DurationMs = 30 * SECOND;

/// Extra filler budget granted to the first item of a new viewer
pub const FIRST_TUNE_EXTENSION: DurationMs = 7 * DAY;

/// Longest offline screen emitted at once
pub const OFFLINE_SCREEN_CAP: DurationMs = 10 * MINUTE;

/// Filler tail left after a randomized join point
pub const MIN_FILLER_TAIL: DurationMs = 15 * SECOND;

// ============================================================================
// Filler selection
// ============================================================================

/// Default delay before the same filler clip may repeat on a channel
pub const DEFAULT_FILLER_REPEAT_COOLDOWN: DurationMs = 30 * MINUTE;

/// "Time since last play" assumed for clips that never played
pub const NEVER_PLAYED_AGE: DurationMs = 7 * DAY;

/// Recency above which every clip scores the same
pub const RECENCY_CEILING: DurationMs = 5 * HOUR;

/// Initial `minimum_wait` when at least one collection is scanned
pub const MINIMUM_WAIT_UNBOUNDED: DurationMs = 1_000_000_000;

/// `minimum_wait` reported when there is no collection at all
pub const MINIMUM_WAIT_NO_FILLER: DurationMs = (1 << 53) - 1;

// ============================================================================
// Schedule generation
// ============================================================================

/// Safety cap on the number of generated lineup entries
pub const LIMIT: usize = 40_000;

/// Largest span a schedule may express (ms), about 142 000 years
///
/// Exact as an `f64`, and far enough from `i64::MAX` that timestamps plus
/// spans never overflow.
pub const MAX_SPAN: DurationMs = 1 << 52;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_sanity() {
        assert!(2 * SLACK < SMOOTHING_THRESHOLD);
        assert!(MIN_FILLER_TAIL < OFFLINE_SCREEN_CAP);
        assert!(RECENCY_CEILING < NEVER_PLAYED_AGE);
        assert!(MINIMUM_WAIT_UNBOUNDED < MINIMUM_WAIT_NO_FILLER);
        assert_eq!(DAY, 86_400_000);
        assert!(MAX_SPAN.checked_add(2 * MAX_SPAN).is_some());
    }
}
