//! Weighted filler selection across a channel's collections

use super::scorer::clip_weight;
use crate::constants::{MINIMUM_WAIT_NO_FILLER, MINIMUM_WAIT_UNBOUNDED, NEVER_PLAYED_AGE, SLACK};
use crate::context::PlaybackContext;
use crate::models::{Channel, DurationMs, FillerCollection, Program, TimestampMs};
use crate::reservoir::WeightedReservoir;
use tracing::trace;

/// Outcome of a filler query
#[derive(Debug, Clone, PartialEq)]
pub struct FillerPick {
    /// Chosen clip, `None` when nothing is eligible
    pub filler: Option<Program>,
    /// Collection the scan committed to
    pub collection_id: Option<String>,
    /// Soonest delay after which a new query could succeed (ms)
    pub minimum_wait: DurationMs,
}

fn age(now: TimestampMs, last_play: TimestampMs) -> DurationMs {
    if last_play == 0 {
        NEVER_PLAYED_AGE
    } else {
        now - last_play
    }
}

/// Picks a filler clip no longer than `max_duration` (plus [`SLACK`])
///
/// Collections are scanned in order. The first clip of a collection that
/// is out of its own repeat cooldown decides whether the collection may be
/// used at all (collection cooldown) and whether the scan commits to it (a
/// weighted pick against the collections accepted so far). Clips of the
/// committed collection compete through a weighted reservoir scored by
/// duration and recency. Clips and collections still cooling down only
/// shrink `minimum_wait`.
pub fn select_filler(
    ctx: &PlaybackContext<'_>,
    channel: &Channel,
    fillers: &[FillerCollection],
    max_duration: DurationMs,
) -> FillerPick {
    if fillers.is_empty() {
        return FillerPick {
            filler: None,
            collection_id: None,
            minimum_wait: MINIMUM_WAIT_NO_FILLER,
        };
    }

    let repeat_cooldown = channel
        .filler_repeat_cooldown
        .unwrap_or(ctx.settings.filler_repeat_cooldown);
    let budget = max_duration + SLACK;

    let mut minimum_wait = MINIMUM_WAIT_UNBOUNDED;
    let mut collections = WeightedReservoir::new();
    let mut clips: WeightedReservoir<&Program> = WeightedReservoir::new();

    for collection in fillers {
        let mut committed = false;
        clips.reset_weight();

        for clip in &collection.content {
            if clip.duration_ms > budget {
                continue;
            }

            let mut time_since = age(ctx.now, ctx.history.program_last_play(channel.number, &clip.key()));

            if time_since < repeat_cooldown - SLACK {
                let wait = repeat_cooldown - time_since;
                if clip.duration_ms + wait <= budget {
                    minimum_wait = minimum_wait.min(wait);
                }
                time_since = 0;
            } else if !committed {
                let collection_since = age(
                    ctx.now,
                    ctx.history.collection_last_play(channel.number, &collection.id),
                );
                let cooldown = collection.cooldown_ms();

                if collection_since + SLACK >= cooldown {
                    if collections.offer(collection.id.as_str(), collection.weight, ctx.random) {
                        committed = true;
                        clips.reset_weight();
                    } else {
                        break;
                    }
                } else {
                    let wait = cooldown - collection_since;
                    if clip.duration_ms + wait <= budget {
                        minimum_wait = minimum_wait.min(wait);
                    }
                    break;
                }
            }

            // Clips that just played carry no weight this round
            let Some(weight) = clip_weight(clip.duration_ms, time_since) else {
                continue;
            };
            clips.offer(clip, weight as f64, ctx.random);
        }
    }

    let filler = clips.into_pick().cloned();
    let collection_id = collections.into_pick().map(str::to_string);
    trace!(
        channel = channel.number,
        max_duration,
        found = filler.is_some(),
        minimum_wait,
        "Filler selection"
    );

    FillerPick {
        filler,
        collection_id,
        minimum_wait,
    }
}
