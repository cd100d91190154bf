//! # pmotv - Ordonnancement de chaînes TV virtuelles
//!
//! Cette crate fournit le cœur d'ordonnancement des chaînes PMOTv :
//! - Résolution du curseur temporel d'une chaîne qui boucle sur son lineup
//! - Assemblage du lineup en direct (programme, remplissage, écran hors-ligne)
//! - Sélection pondérée des remplissages sous contraintes de durée et de cooldown
//! - Génération de grilles multi-jours à partir de créneaux déclaratifs
//!
//! # Architecture
//!
//! - **resolve_cursor** : programme à l'antenne et temps écoulé à un instant donné
//! - **assemble_lineup** : éléments à diffuser pour une position de curseur
//! - **select_filler** : choix d'un clip dans les collections de remplissage
//! - **slots::generate_schedule** : génération coopérative (async) d'une grille
//! - **RandomSource** : source aléatoire partagée, injectable pour les tests
//! - **PlayHistory** : historique de diffusion en lecture seule
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use pmotv::{assemble_lineup, resolve_cursor, Channel, MemoryPlayHistory, PlaybackContext};
//!
//! # fn main() -> pmotv::Result<()> {
//! # let channel: Channel = serde_json::from_str("{}")?;
//! let history = MemoryPlayHistory::new();
//! let ctx = PlaybackContext::live(&history);
//!
//! let cursor = resolve_cursor(ctx.now, &channel)?;
//! for item in assemble_lineup(&ctx, &cursor, &channel, &[], true) {
//!     println!("{} for {}ms", item.type_name(), item.stream_duration());
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
mod context;
mod cursor;
mod error;
pub mod filler;
mod history;
mod lineup;
pub mod models;
mod random;
mod reservoir;
pub mod slots;
mod watermark;

#[cfg(feature = "pmoconfig")]
mod config_ext;

// Réexports publics
pub use context::{LineupSettings, PlaybackContext};
pub use cursor::{resolve_cursor, CursorPosition};
pub use error::{Error, Result};
pub use filler::{select_filler, FillerPick};
pub use history::{MemoryPlayHistory, NoHistory, PlayHistory};
pub use lineup::assemble_lineup;
pub use models::{
    Channel, DurationMs, FillerCollection, LineupItem, OfflineItem, OfflineMode, OfflineSettings,
    Program, ProgramKey, ProgramType, RedirectItem, StreamItem, TimestampMs, Watermark,
};
pub use random::RandomSource;
pub use reservoir::{weighted_pick, WeightedReservoir};
pub use slots::{generate_schedule, generate_schedule_at, GenerateRequest, GeneratedSchedule, Schedule};
pub use watermark::{resolve_watermark, TranscodeSettings};

#[cfg(feature = "pmoconfig")]
pub use config_ext::TvConfigExt;
