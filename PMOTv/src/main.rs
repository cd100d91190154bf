mod cli;
mod logging;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use cli::{Cli, Command, GenerateArgs, LineupArgs, NowPlayingArgs};
use pmoconfig::{Config, get_config};
use pmotv::{
    Channel, FillerCollection, GenerateRequest, GeneratedSchedule, MemoryPlayHistory,
    PlaybackContext, RandomSource, TranscodeSettings, TvConfigExt, assemble_lineup,
    generate_schedule_at, resolve_cursor, resolve_watermark,
};
use serde_json::{Value, json};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Exit code of a rejected schedule
const USER_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config_dir {
        Some(dir) => Arc::new(Config::load_config(&dir.to_string_lossy())?),
        None => get_config(),
    };
    logging::init_logging(&config);

    // Une seule source aléatoire pour tout le processus
    let random = match cli.seed {
        Some(seed) => RandomSource::seeded(seed),
        None => config.random_source()?,
    };
    if !RandomSource::install_global(random) {
        warn!("Global random source already initialised");
    }

    match cli.command {
        Command::Generate(args) => generate(&config, args).await,
        Command::NowPlaying(args) => now_playing(args),
        Command::Lineup(args) => lineup(&config, args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn instant(at: Option<DateTime<Utc>>) -> i64 {
    at.unwrap_or_else(Utc::now).timestamp_millis()
}

async fn run_request(body: Value, start: DateTime<Utc>) -> pmotv::Result<GeneratedSchedule> {
    let request = GenerateRequest::from_value(body)?;
    let schedule = request.schedule.validate()?;
    generate_schedule_at(&request.programs, &schedule, start, RandomSource::global()).await
}

async fn generate(config: &Config, args: GenerateArgs) -> anyhow::Result<ExitCode> {
    let body: Value = read_json(&args.input)?;
    let start = Utc::now();

    let generated = match run_request(body, start).await {
        Ok(generated) => generated,
        Err(e) if e.is_user_error() => {
            print_json(&json!({ "userError": e.to_string() }))?;
            return Ok(ExitCode::from(USER_ERROR_EXIT));
        }
        Err(e) => return Err(e.into()),
    };

    let output = match args.output {
        Some(path) => path,
        None => config
            .schedule_output_dir()?
            .join(format!("schedule-{}.json", start.format("%Y%m%dT%H%M%SZ"))),
    };
    std::fs::write(&output, serde_json::to_vec_pretty(&generated)?)
        .with_context(|| format!("Cannot write {}", output.display()))?;

    info!(
        items = generated.programs.len(),
        duration_ms = generated.total_duration_ms(),
        output = %output.display(),
        "Schedule written"
    );
    Ok(ExitCode::SUCCESS)
}

fn now_playing(args: NowPlayingArgs) -> anyhow::Result<ExitCode> {
    let channel: Channel = read_json(&args.channel)?;
    let cursor = resolve_cursor(instant(args.at), &channel)?;
    print_json(&cursor)?;
    Ok(ExitCode::SUCCESS)
}

fn lineup(config: &Config, args: LineupArgs) -> anyhow::Result<ExitCode> {
    let channel: Channel = read_json(&args.channel)?;
    let fillers: Vec<FillerCollection> = match &args.fillers {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    // L'historique de diffusion appartient au lecteur, vide ici
    let history = MemoryPlayHistory::new();
    let ctx = PlaybackContext::new(&history, RandomSource::global(), instant(args.at))
        .with_settings(config.lineup_settings()?);

    let cursor = resolve_cursor(ctx.now, &channel)?;
    let transcode = TranscodeSettings {
        enable_transcoding: args.transcode,
        disable_channel_overlay: false,
    };

    let items: Vec<Value> = assemble_lineup(&ctx, &cursor, &channel, &fillers, args.first)
        .into_iter()
        .map(|item| {
            let watermark = resolve_watermark(&transcode, &channel, &item);
            json!({ "item": item, "watermark": watermark })
        })
        .collect();

    print_json(&items)?;
    Ok(ExitCode::SUCCESS)
}
