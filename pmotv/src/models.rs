//! Data models exchanged with the storage layer and the streaming layer
//!
//! Channels, programs and filler collections are read snapshots owned by the
//! host; the core never mutates them. [`LineupItem`] is what the core hands
//! back for playback.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Duration in milliseconds
pub type DurationMs = i64;

/// Unix timestamp in milliseconds
pub type TimestampMs = i64;

/// Kind of content a [`Program`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgramType {
    Movie,
    #[default]
    Episode,
    Track,
    Custom,
    Redirect,
    Flex,
}

/// A unit of content in a channel lineup, a filler collection or a show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Storage identifier, reported as `fillerId` when played as filler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Media server the content lives on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source_id: Option<String>,

    /// Key of the content on its media server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_key: Option<String>,

    #[serde(alias = "duration")]
    pub duration_ms: DurationMs,

    #[serde(rename = "type", default)]
    pub kind: ProgramType,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_title: Option<String>,

    #[serde(default, alias = "season", skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,

    #[serde(default, alias = "episode", skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_show_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_order: Option<i64>,

    /// Target channel of a redirect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Error marker set by the storage layer when the entry is unplayable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Program {
    /// Offline placeholder (flex time) of the given length
    pub fn offline(duration_ms: DurationMs) -> Self {
        Self {
            duration_ms,
            kind: ProgramType::Flex,
            title: "Offline".to_string(),
            ..Default::default()
        }
    }

    /// Redirect to another channel for the given length
    pub fn redirect(channel: u32, duration_ms: DurationMs) -> Self {
        Self {
            duration_ms,
            kind: ProgramType::Redirect,
            title: format!("Redirect to channel {channel}"),
            channel: Some(channel),
            ..Default::default()
        }
    }

    /// True for flex time (the channel's offline placeholder)
    pub fn is_offline(&self) -> bool {
        self.kind == ProgramType::Flex
    }

    pub fn is_redirect(&self) -> bool {
        self.kind == ProgramType::Redirect
    }

    /// Identity used for play history and show membership
    pub fn key(&self) -> ProgramKey {
        ProgramKey::new(
            self.external_source_id.as_deref().unwrap_or("unknown"),
            self.external_key.as_deref().unwrap_or("unknown"),
        )
    }
}

/// Stable identity of a program: media server plus content key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramKey {
    pub source: String,
    pub key: String,
}

impl ProgramKey {
    pub fn new(source: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.source, self.key)
    }
}

/// What a channel shows while its lineup is in flex time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OfflineMode {
    /// A still picture
    #[default]
    #[serde(alias = "picture")]
    Pic,
    /// The first fallback program
    Clip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSettings {
    #[serde(default)]
    pub mode: OfflineMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Channel logo overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub vertical_margin: f64,
    #[serde(default)]
    pub horizontal_margin: f64,
    #[serde(default)]
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_size: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

/// A virtual channel looping its lineup from `start_time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub number: u32,
    #[serde(default)]
    pub name: String,
    /// Origin of the loop (Unix ms)
    pub start_time: TimestampMs,
    #[serde(default)]
    pub programs: Vec<Program>,
    /// Loop period, the sum of the program durations
    pub duration: DurationMs,
    #[serde(default)]
    pub fallback: Vec<Program>,
    #[serde(default)]
    pub offline: OfflineSettings,
    /// Minimum delay between two plays of the same filler clip (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filler_repeat_cooldown: Option<DurationMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_filler_overlay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Channel {
    /// Creates a channel whose duration matches its programs
    pub fn new(number: u32, name: impl Into<String>, start_time: TimestampMs, programs: Vec<Program>) -> Self {
        let mut channel = Self {
            number,
            name: name.into(),
            start_time,
            programs,
            ..Default::default()
        };
        channel.recompute_duration();
        channel
    }

    /// Sum of the program durations
    pub fn programs_duration(&self) -> DurationMs {
        self.programs.iter().map(|p| p.duration_ms).sum()
    }

    /// Restores `duration == sum(programs)`
    pub fn recompute_duration(&mut self) {
        self.duration = self.programs_duration();
    }

    /// Checks the duration invariant
    pub fn check_duration(&self) -> bool {
        self.duration == self.programs_duration() && (self.programs.is_empty() || self.duration > 0)
    }
}

/// A weighted pool of filler clips attached to a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillerCollection {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "FillerCollection::default_weight")]
    pub weight: f64,
    /// Minimum delay between two picks of this collection, in seconds
    #[serde(default)]
    pub cooldown: i64,
    #[serde(default)]
    pub content: Vec<Program>,
}

impl FillerCollection {
    const fn default_weight() -> f64 {
        1.0
    }

    pub fn new(id: impl Into<String>, weight: f64, cooldown_secs: i64, content: Vec<Program>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            weight,
            cooldown: cooldown_secs,
            content,
        }
    }

    pub fn cooldown_ms(&self) -> DurationMs {
        self.cooldown * 1000
    }
}

/// A playable reference to real content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Offset into the content where playback starts
    pub start: DurationMs,
    /// How long to stream
    pub stream_duration: DurationMs,
    /// Full content duration
    pub duration: DurationMs,
    /// Real elapsed time hidden by start smoothing
    pub beginning_offset: DurationMs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filler_id: Option<String>,
}

impl StreamItem {
    pub(crate) fn from_program(program: &Program, start: DurationMs, stream_duration: DurationMs) -> Self {
        Self {
            title: program.title.clone(),
            key: program.external_key.clone(),
            server_key: program.external_source_id.clone(),
            file: program.file_path.clone(),
            start,
            stream_duration,
            duration: program.duration_ms,
            beginning_offset: 0,
            filler_id: None,
        }
    }
}

/// Offline screen, either flex time or an error card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineItem {
    pub title: String,
    pub start: DurationMs,
    pub stream_duration: DurationMs,
    pub duration: DurationMs,
    pub beginning_offset: DurationMs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OfflineItem {
    pub(crate) fn new(title: &str, duration: DurationMs, error: Option<String>) -> Self {
        Self {
            title: title.to_string(),
            start: 0,
            stream_duration: duration,
            duration,
            beginning_offset: 0,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectItem {
    pub channel: u32,
    pub duration: DurationMs,
}

/// One entry of a live lineup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineupItem {
    Program(StreamItem),
    Commercial(StreamItem),
    Offline(OfflineItem),
    Redirect(RedirectItem),
}

impl LineupItem {
    /// Name of the item type as exposed to the streaming layer
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Program(_) => "program",
            Self::Commercial(_) => "commercial",
            Self::Offline(_) => "offline",
            Self::Redirect(_) => "redirect",
        }
    }

    /// How long the item occupies the channel
    pub fn stream_duration(&self) -> DurationMs {
        match self {
            Self::Program(item) | Self::Commercial(item) => item.stream_duration,
            Self::Offline(item) => item.stream_duration,
            Self::Redirect(item) => item.duration,
        }
    }
}
