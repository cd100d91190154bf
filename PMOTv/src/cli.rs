use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Virtual TV channel scheduler
#[derive(Debug, Parser)]
#[command(name = "PMOTv", version, about)]
pub struct Cli {
    /// Configuration directory (defaults to $PMOTV_CONFIG, ./.pmotv or ~/.pmotv)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Seed of the shared random source, overrides scheduling.random_seed
    #[arg(long, global = true, env = "PMOTV_SEED")]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a timeline from a slot schedule
    Generate(GenerateArgs),
    /// Show what a channel is playing
    NowPlaying(NowPlayingArgs),
    /// Build the live lineup of a channel
    Lineup(LineupArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// JSON request: {"programs": [...], "schedule": {...}}
    #[arg(long, short)]
    pub input: PathBuf,

    /// Output file, defaults to the managed schedules directory
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NowPlayingArgs {
    /// Channel snapshot (JSON)
    #[arg(long, short)]
    pub channel: PathBuf,

    /// Instant to resolve (RFC 3339), defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct LineupArgs {
    /// Channel snapshot (JSON)
    #[arg(long, short)]
    pub channel: PathBuf,

    /// Filler collections (JSON array)
    #[arg(long, short)]
    pub fillers: Option<PathBuf>,

    /// Instant to resolve (RFC 3339), defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    /// First item for a viewer who just tuned in
    #[arg(long)]
    pub first: bool,

    /// Report the watermark a transcoding player would overlay
    #[arg(long)]
    pub transcode: bool,
}
