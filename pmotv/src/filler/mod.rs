//! Filler content: scoring and selection
//!
//! Filler collections hold short clips (commercials, bumpers) played while
//! a channel's lineup is in flex time.

pub mod scorer;
pub mod selector;

pub use scorer::{clip_weight, duration_score, recency_score};
pub use selector::{select_filler, FillerPick};
