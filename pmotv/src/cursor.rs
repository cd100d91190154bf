//! Time cursor: what a channel plays at a given instant

use crate::constants::SLACK;
use crate::error::{Error, Result};
use crate::models::{Channel, DurationMs, Program, TimestampMs};
use serde::Serialize;
use tracing::debug;

/// Position of a channel's loop at some instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    /// Program on air
    pub program: Program,
    /// Time already played of `program`
    pub elapsed_ms: DurationMs,
    /// Index in the channel lineup, `None` before the channel starts
    pub program_index: Option<usize>,
}

impl CursorPosition {
    /// Time left until `program` ends
    pub fn remaining_ms(&self) -> DurationMs {
        self.program.duration_ms - self.elapsed_ms
    }
}

/// Maps `time` onto the channel's repeating lineup
///
/// Before `start_time` the channel plays flex until it starts. A program
/// with less than [`SLACK`] left is considered over and the next one starts
/// from zero.
///
/// # Errors
///
/// [`Error::EmptyLineup`] when the channel has no program or a zero-length
/// loop, [`Error::ProgramNotFound`] when its stored duration exceeds the sum
/// of its programs.
pub fn resolve_cursor(time: TimestampMs, channel: &Channel) -> Result<CursorPosition> {
    if time < channel.start_time {
        debug!(
            channel = channel.number,
            start_time = channel.start_time,
            "Channel has not started yet, playing flex until start"
        );
        return Ok(CursorPosition {
            program: Program::offline(channel.start_time - time),
            elapsed_ms: 0,
            program_index: None,
        });
    }

    if channel.programs.is_empty() || channel.duration <= 0 {
        return Err(Error::EmptyLineup(channel.number));
    }

    let loop_elapsed = (time - channel.start_time) % channel.duration;
    let mut elapsed = loop_elapsed;
    let count = channel.programs.len();

    for (index, program) in channel.programs.iter().enumerate() {
        if elapsed < program.duration_ms {
            if program.duration_ms > 2 * SLACK && elapsed > program.duration_ms - SLACK {
                let next = (index + 1) % count;
                return Ok(CursorPosition {
                    program: channel.programs[next].clone(),
                    elapsed_ms: 0,
                    program_index: Some(next),
                });
            }
            return Ok(CursorPosition {
                program: program.clone(),
                elapsed_ms: elapsed,
                program_index: Some(index),
            });
        }
        elapsed -= program.duration_ms;
    }

    Err(Error::ProgramNotFound {
        channel: channel.number,
        elapsed: loop_elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MINUTE;

    fn episode(key: &str, duration_ms: DurationMs) -> Program {
        Program {
            external_source_id: Some("plex".into()),
            external_key: Some(key.into()),
            duration_ms,
            title: key.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_program_wraps() {
        let channel = Channel::new(1, "One", 0, vec![episode("a", 30 * MINUTE)]);
        let cursor = resolve_cursor(45 * MINUTE, &channel).unwrap();
        assert_eq!(cursor.elapsed_ms, 15 * MINUTE);
        assert_eq!(cursor.program_index, Some(0));
        assert_eq!(cursor.remaining_ms(), 15 * MINUTE);
    }

    #[test]
    fn test_before_start_is_flex() {
        let channel = Channel::new(1, "One", 10_000, vec![episode("a", 30 * MINUTE)]);
        let cursor = resolve_cursor(4_000, &channel).unwrap();
        assert!(cursor.program.is_offline());
        assert_eq!(cursor.program.duration_ms, 6_000);
        assert_eq!(cursor.elapsed_ms, 0);
        assert_eq!(cursor.program_index, None);
    }

    #[test]
    fn test_finds_program_in_the_middle() {
        let channel = Channel::new(
            1,
            "One",
            1_000,
            vec![episode("a", 10 * MINUTE), episode("b", 20 * MINUTE), episode("c", 5 * MINUTE)],
        );
        let cursor = resolve_cursor(1_000 + 12 * MINUTE, &channel).unwrap();
        assert_eq!(cursor.program_index, Some(1));
        assert_eq!(cursor.elapsed_ms, 2 * MINUTE);
        assert_eq!(cursor.program.external_key.as_deref(), Some("b"));
    }

    #[test]
    fn test_skew_correction_advances_and_wraps() {
        let channel = Channel::new(
            1,
            "One",
            0,
            vec![episode("a", 10 * MINUTE), episode("b", 10 * MINUTE)],
        );
        let cursor = resolve_cursor(20 * MINUTE - SLACK / 2, &channel).unwrap();
        assert_eq!(cursor.program_index, Some(0));
        assert_eq!(cursor.elapsed_ms, 0);

        let cursor = resolve_cursor(10 * MINUTE - SLACK / 2, &channel).unwrap();
        assert_eq!(cursor.program_index, Some(1));
        assert_eq!(cursor.elapsed_ms, 0);
    }

    #[test]
    fn test_short_programs_are_not_skew_corrected() {
        let channel = Channel::new(1, "One", 0, vec![episode("a", SLACK), episode("b", 10 * MINUTE)]);
        let cursor = resolve_cursor(SLACK - 1, &channel).unwrap();
        assert_eq!(cursor.program_index, Some(0));
        assert_eq!(cursor.elapsed_ms, SLACK - 1);
    }

    #[test]
    fn test_empty_lineup_is_an_error() {
        let channel = Channel::new(3, "Empty", 0, vec![]);
        assert!(matches!(resolve_cursor(1_000, &channel), Err(Error::EmptyLineup(3))));
    }

    #[test]
    fn test_corrupted_duration_is_an_error() {
        let mut channel = Channel::new(3, "Bad", 0, vec![episode("a", 1_000)]);
        channel.duration = 5_000;
        assert!(matches!(
            resolve_cursor(2_000, &channel),
            Err(Error::ProgramNotFound { channel: 3, .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let channel = Channel::new(1, "One", 0, vec![episode("a", 7_777), episode("b", 12_345)]);
        for t in [0, 5_000, 19_000, 1_000_000] {
            assert_eq!(resolve_cursor(t, &channel).unwrap(), resolve_cursor(t, &channel).unwrap());
        }
    }
}
