//! Playback-time context shared by the filler selector and the lineup
//! assembler.

use crate::constants::{
    DEFAULT_FILLER_REPEAT_COOLDOWN, FIRST_TUNE_EXTENSION, MIN_FILLER_TAIL, OFFLINE_SCREEN_CAP,
    SMOOTHING_THRESHOLD,
};
use crate::history::PlayHistory;
use crate::models::{DurationMs, TimestampMs};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Tunables of the live lineup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSettings {
    /// Filler repeat cooldown for channels that do not set one
    #[serde(default = "LineupSettings::default_filler_repeat_cooldown")]
    pub filler_repeat_cooldown: DurationMs,
    /// Longest offline screen emitted at once
    #[serde(default = "LineupSettings::default_offline_screen_cap")]
    pub offline_screen_cap: DurationMs,
    /// Extra filler budget for a newly connecting viewer
    #[serde(default = "LineupSettings::default_first_tune_extension")]
    pub first_tune_extension: DurationMs,
    /// Elapsed time under which a program restarts from zero
    #[serde(default = "LineupSettings::default_smoothing_threshold")]
    pub smoothing_threshold: DurationMs,
    /// Filler tail kept after a randomized join point
    #[serde(default = "LineupSettings::default_min_filler_tail")]
    pub min_filler_tail: DurationMs,
}

impl LineupSettings {
    const fn default_filler_repeat_cooldown() -> DurationMs {
        DEFAULT_FILLER_REPEAT_COOLDOWN
    }

    const fn default_offline_screen_cap() -> DurationMs {
        OFFLINE_SCREEN_CAP
    }

    const fn default_first_tune_extension() -> DurationMs {
        FIRST_TUNE_EXTENSION
    }

    const fn default_smoothing_threshold() -> DurationMs {
        SMOOTHING_THRESHOLD
    }

    const fn default_min_filler_tail() -> DurationMs {
        MIN_FILLER_TAIL
    }
}

impl Default for LineupSettings {
    fn default() -> Self {
        Self {
            filler_repeat_cooldown: Self::default_filler_repeat_cooldown(),
            offline_screen_cap: Self::default_offline_screen_cap(),
            first_tune_extension: Self::default_first_tune_extension(),
            smoothing_threshold: Self::default_smoothing_threshold(),
            min_filler_tail: Self::default_min_filler_tail(),
        }
    }
}

/// Everything a live lineup request reads besides the channel itself
#[derive(Clone, Copy)]
pub struct PlaybackContext<'a> {
    pub history: &'a dyn PlayHistory,
    pub random: &'a RandomSource,
    /// Wall-clock time of the request (Unix ms)
    pub now: TimestampMs,
    pub settings: LineupSettings,
}

impl<'a> PlaybackContext<'a> {
    pub fn new(history: &'a dyn PlayHistory, random: &'a RandomSource, now: TimestampMs) -> Self {
        Self {
            history,
            random,
            now,
            settings: LineupSettings::default(),
        }
    }

    /// Context at the current wall-clock time using the global random source
    pub fn live(history: &'a dyn PlayHistory) -> Self {
        Self::new(history, RandomSource::global(), chrono::Utc::now().timestamp_millis())
    }

    pub fn with_settings(mut self, settings: LineupSettings) -> Self {
        self.settings = settings;
        self
    }
}
