//! Live lineup assembly
//!
//! Turns a [`CursorPosition`] into the items a viewer gets streamed:
//! - an error card when the stored entry is broken,
//! - a redirect when the lineup points at another channel,
//! - filler, fallback content or an offline screen during flex time,
//! - the program itself otherwise.

use crate::constants::SLACK;
use crate::context::PlaybackContext;
use crate::cursor::CursorPosition;
use crate::filler::select_filler;
use crate::models::{
    Channel, DurationMs, FillerCollection, LineupItem, OfflineItem, OfflineMode, Program,
    RedirectItem, StreamItem,
};
use tracing::{debug, warn};

/// Builds the near-term lineup for a resolved cursor
///
/// `is_first` is true for the first item requested by a viewer who just
/// tuned in. The result currently holds a single item.
pub fn assemble_lineup(
    ctx: &PlaybackContext<'_>,
    cursor: &CursorPosition,
    channel: &Channel,
    fillers: &[FillerCollection],
    is_first: bool,
) -> Vec<LineupItem> {
    let program = &cursor.program;
    let remaining = cursor.remaining_ms();

    if let Some(err) = &program.error {
        return vec![LineupItem::Offline(OfflineItem::new(
            "Error",
            remaining,
            Some(err.clone()),
        ))];
    }

    if program.is_redirect() {
        if let Some(target) = program.channel {
            return vec![LineupItem::Redirect(RedirectItem {
                channel: target,
                duration: remaining,
            })];
        }
        warn!(channel = channel.number, "Redirect without target channel, playing flex");
        return flex_lineup(ctx, channel, fillers, remaining, is_first);
    }

    if program.is_offline() {
        return flex_lineup(ctx, channel, fillers, remaining, is_first);
    }

    vec![LineupItem::Program(program_item(ctx, program, cursor.elapsed_ms))]
}

/// Program item with start smoothing
///
/// Under the smoothing threshold the program restarts from zero and the
/// real elapsed time is reported as `beginning_offset`.
fn program_item(ctx: &PlaybackContext<'_>, program: &Program, elapsed: DurationMs) -> StreamItem {
    let start = if elapsed < ctx.settings.smoothing_threshold {
        0
    } else {
        elapsed
    };

    let mut item = StreamItem::from_program(program, start, program.duration_ms - start);
    item.beginning_offset = (elapsed - start).max(0);
    item
}

fn flex_lineup(
    ctx: &PlaybackContext<'_>,
    channel: &Channel,
    fillers: &[FillerCollection],
    mut remaining: DurationMs,
    is_first: bool,
) -> Vec<LineupItem> {
    let fallback = match channel.offline.mode {
        OfflineMode::Clip => channel.fallback.first(),
        OfflineMode::Pic => None,
    };

    let budget = remaining
        + if is_first {
            ctx.settings.first_tune_extension
        } else {
            0
        };
    let pick = select_filler(ctx, channel, fillers, budget);

    if pick.filler.is_none() && remaining > pick.minimum_wait {
        remaining = pick.minimum_wait;
    }

    // Le contenu de secours ne sert que si aucun remplissage n'a été trouvé
    let (filler, is_fallback) = match pick.filler {
        Some(filler) => (Some(filler), false),
        None => (fallback.cloned(), true),
    };

    let Some(filler) = filler else {
        let duration = remaining.min(ctx.settings.offline_screen_cap);
        debug!(channel = channel.number, duration, "No filler available, showing offline screen");
        return vec![LineupItem::Offline(OfflineItem::new("Channel Offline", duration, None))];
    };

    let start = if is_fallback {
        // Trimmed so it ends exactly with the flex block
        (filler.duration_ms - remaining).max(0)
    } else if is_first {
        // Avoid always joining at the very start of a commercial
        let start = (filler.duration_ms - remaining).max(0);
        let more = (filler.duration_ms - start - ctx.settings.min_filler_tail - SLACK).max(0);
        start + ctx.random.integer(0, more)
    } else {
        0
    };

    let stream_duration = (filler.duration_ms - start).min(remaining).max(1);
    debug!(
        channel = channel.number,
        fallback = is_fallback,
        start,
        stream_duration,
        "Playing filler during flex"
    );

    let mut item = StreamItem::from_program(&filler, start, stream_duration);
    item.filler_id = filler.id.clone();
    vec![LineupItem::Commercial(item)]
}
