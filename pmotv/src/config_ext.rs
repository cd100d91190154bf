//! Extension de pmoconfig pour l'ordonnancement des chaînes

use crate::context::LineupSettings;
use crate::constants::MIN_FILLER_TAIL;
use crate::error::Result;
use crate::random::RandomSource;
use std::path::PathBuf;

/// Trait d'extension pour pmoconfig::Config
pub trait TvConfigExt {
    /// Réglages du lineup en direct (section `scheduling`)
    fn lineup_settings(&self) -> Result<LineupSettings>;

    /// Source aléatoire, déterministe si `scheduling.random_seed` est défini
    fn random_source(&self) -> Result<RandomSource>;

    /// Répertoire des grilles générées, créé au besoin
    fn schedule_output_dir(&self) -> Result<PathBuf>;
}

impl TvConfigExt for pmoconfig::Config {
    fn lineup_settings(&self) -> Result<LineupSettings> {
        Ok(LineupSettings {
            filler_repeat_cooldown: self.get_filler_repeat_cooldown_ms()?,
            offline_screen_cap: self.get_offline_screen_cap_ms()?,
            first_tune_extension: self.get_first_tune_extension_ms()?,
            smoothing_threshold: self.get_smoothing_threshold_ms()?,
            min_filler_tail: MIN_FILLER_TAIL,
        })
    }

    fn random_source(&self) -> Result<RandomSource> {
        Ok(match self.get_random_seed()? {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::from_entropy(),
        })
    }

    fn schedule_output_dir(&self) -> Result<PathBuf> {
        Ok(self.get_managed_dir(&["scheduling", "output", "directory"], "schedules")?)
    }
}
