//! Declarative schedules: raw requests and their validated form
//!
//! A request arrives as JSON (`{"programs": [...], "schedule": {...}}`).
//! [`GenerateRequest::from_value`] checks its shape, [`ScheduleSpec::validate`]
//! checks the rules and fills the defaults. Either the whole schedule is
//! accepted or nothing is generated.

use crate::constants::{DAY, MAX_SPAN};
use crate::error::{Error, Result};
use crate::models::{DurationMs, Program};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a slot walks through its show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotOrder {
    /// Show order, one program after the other
    #[default]
    Next,
    /// Random order, reshuffled when exhausted
    Shuffle,
}

/// Where the leftover time of a slot goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlexPreference {
    /// Spread between the programs of the slot
    #[default]
    Distribute,
    /// After the last program of the slot
    End,
}

/// Padding granularity of programs inside a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PadStyle {
    /// Only the slot end is aligned to `pad`
    #[default]
    Slot,
    /// Every program is rounded up to `pad`
    Episode,
}

/// A slot as sent by the client, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSpec {
    #[serde(default)]
    pub show_id: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub cooldown: Option<f64>,
    #[serde(default)]
    pub order: Option<String>,
}

/// A schedule as sent by the client, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    #[serde(default)]
    pub slots: Option<Vec<SlotSpec>>,
    #[serde(default)]
    pub period: Option<f64>,
    #[serde(default)]
    pub pad: Option<f64>,
    #[serde(default)]
    pub max_days: Option<f64>,
    #[serde(default)]
    pub flex_preference: Option<String>,
    #[serde(default)]
    pub pad_style: Option<String>,
}

/// A validated slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub show_id: String,
    /// Time budget of one occurrence (ms)
    pub duration: DurationMs,
    pub weight: f64,
    /// Minimum time between two occurrences (ms)
    pub cooldown: DurationMs,
    pub order: SlotOrder,
}

/// A validated schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub slots: Vec<Slot>,
    /// The generated timeline length is a multiple of this (ms)
    pub period: DurationMs,
    /// Alignment granularity (ms)
    pub pad: DurationMs,
    /// Span of the generated timeline, in days
    pub max_days: f64,
    pub flex_preference: FlexPreference,
    pub pad_style: PadStyle,
}

fn positive_millis(value: f64, name: &str) -> Result<DurationMs> {
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 {
        return Err(Error::invalid_schedule(format!(
            "{name} should be an integer number of milliseconds greater than 0"
        )));
    }
    if value > MAX_SPAN as f64 {
        return Err(Error::invalid_schedule(format!("{name} is too large")));
    }
    Ok(value as DurationMs)
}

impl SlotSpec {
    fn validate(&self) -> Result<Slot> {
        let duration = self
            .duration
            .ok_or_else(|| Error::invalid_schedule("Each slot should have a duration"))?;
        let show_id = self
            .show_id
            .clone()
            .ok_or_else(|| Error::invalid_schedule("Each slot should have a showId"))?;
        let duration = positive_millis(duration, "Slot duration")?;

        let weight = self.weight.filter(|w| !w.is_nan()).unwrap_or(1.0);
        if weight < 0.0 {
            return Err(Error::invalid_schedule("Slot weight should not be negative"));
        }

        let order = match self.order.as_deref() {
            None | Some("next") => SlotOrder::Next,
            Some("shuffle") => SlotOrder::Shuffle,
            Some(other) => {
                return Err(Error::invalid_schedule(format!(
                    "Invalid slot order value: \"{other}\""
                )))
            }
        };

        let cooldown = self.cooldown.filter(|c| c.is_finite()).unwrap_or(0.0);
        if cooldown > MAX_SPAN as f64 {
            return Err(Error::invalid_schedule("Slot cooldown is too large"));
        }

        Ok(Slot {
            show_id,
            duration,
            weight,
            cooldown: cooldown as DurationMs,
            order,
        })
    }
}

impl ScheduleSpec {
    /// Checks the schedule and applies defaults
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSchedule`] naming the first rule that failed.
    pub fn validate(&self) -> Result<Schedule> {
        let slots = match &self.slots {
            Some(slots) if !slots.is_empty() => slots,
            _ => return Err(Error::invalid_schedule("Expected a \"slots\" array in schedule")),
        };
        let slots = slots.iter().map(SlotSpec::validate).collect::<Result<Vec<_>>>()?;

        let period = match self.period {
            Some(period) => positive_millis(period, "schedule.period")?,
            None => DAY,
        };
        let pad = self
            .pad
            .ok_or_else(|| Error::invalid_schedule("Expected schedule.pad"))?;
        let pad = positive_millis(pad, "schedule.pad")?;

        let max_days = self
            .max_days
            .ok_or_else(|| Error::invalid_schedule("schedule.maxDays must be defined."))?;
        if !max_days.is_finite() || max_days < 0.0 {
            return Err(Error::invalid_schedule("schedule.maxDays should not be negative"));
        }
        if max_days * DAY as f64 > MAX_SPAN as f64 {
            return Err(Error::invalid_schedule("schedule.maxDays is too large"));
        }

        // Anything but "end" spreads the leftover
        let flex_preference = match self.flex_preference.as_deref() {
            Some("end") => FlexPreference::End,
            _ => FlexPreference::Distribute,
        };

        let pad_style = match self.pad_style.as_deref() {
            None | Some("slot") => PadStyle::Slot,
            Some("episode") => PadStyle::Episode,
            Some(other) => {
                return Err(Error::invalid_schedule(format!(
                    "Invalid schedule.padStyle value: \"{other}\""
                )))
            }
        };

        Ok(Schedule {
            slots,
            period,
            pad,
            max_days,
            flex_preference,
            pad_style,
        })
    }
}

/// Body of a generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub programs: Vec<Program>,
    pub schedule: ScheduleSpec,
}

impl GenerateRequest {
    /// Parses a raw JSON request
    ///
    /// The schedule itself is only checked by [`ScheduleSpec::validate`].
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut body) = value else {
            return Err(Error::invalid_schedule("Expected a programs array"));
        };

        let programs = match body.remove("programs") {
            Some(programs @ Value::Array(_)) => serde_json::from_value(programs)?,
            _ => return Err(Error::invalid_schedule("Expected a programs array")),
        };

        let schedule = match body.remove("schedule") {
            None | Some(Value::Null) => return Err(Error::invalid_schedule("Expected a schedule")),
            Some(schedule) => {
                if !matches!(schedule.get("slots"), Some(Value::Array(_))) {
                    return Err(Error::invalid_schedule("Expected a \"slots\" array in schedule"));
                }
                serde_json::from_value(schedule)?
            }
        };

        Ok(Self { programs, schedule })
    }
}
