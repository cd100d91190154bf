//! Slot-based schedule generation
//!
//! A [`Schedule`] is a list of weighted, cooldown-gated slots, each playing
//! one show. [`generate_schedule`] turns it into a multi-day timeline that
//! can be stored as a channel lineup.
//!
//! ```no_run
//! use pmotv::slots::{generate_schedule, GenerateRequest};
//!
//! # async fn run(body: serde_json::Value) -> pmotv::Result<()> {
//! let request = GenerateRequest::from_value(body)?;
//! let schedule = request.schedule.validate()?;
//! let generated = generate_schedule(&request.programs, &schedule).await?;
//! println!("{} entries", generated.programs.len());
//! # Ok(())
//! # }
//! ```

pub mod generator;
pub mod schedule;
pub mod show;

pub use generator::{generate_schedule, generate_schedule_at, GeneratedSchedule};
pub use schedule::{
    FlexPreference, GenerateRequest, PadStyle, Schedule, ScheduleSpec, Slot, SlotOrder, SlotSpec,
};
pub use show::{ContentShow, Show, ShowArena, ShowCursor, ShowKey};
