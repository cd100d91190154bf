//! Error types for pmotv

/// Result type alias for pmotv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the scheduling core
///
/// `InvalidSchedule` is a user error: the request was rejected before any
/// work started. Every other variant is an internal-consistency failure
/// caused by corrupted channel or show data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed schedule or generation request
    #[error("{0}")]
    InvalidSchedule(String),

    /// Channel has no program or a zero-length loop
    #[error("Channel {0} has an empty lineup")]
    EmptyLineup(u32),

    /// The cursor scan fell off the end of the lineup
    #[error("No program found in channel {channel} at elapsed {elapsed}ms")]
    ProgramNotFound { channel: u32, elapsed: i64 },

    /// A slot references a show no program belongs to
    #[error("Show not found: {0}")]
    ShowNotFound(String),

    /// A show exists but has nothing playable
    #[error("{0} has no programs")]
    EmptyShow(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a schedule validation error
    pub fn invalid_schedule(msg: impl Into<String>) -> Self {
        Self::InvalidSchedule(msg.into())
    }

    /// True for errors caused by the caller's input rather than corrupted state
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidSchedule(_) | Self::Json(_))
    }
}
