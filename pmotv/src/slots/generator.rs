//! Slot schedule generator
//!
//! Walks a time cursor from the generation start to `max_days` later. Each
//! step aligns the cursor on `pad`, picks an eligible slot by weight, and
//! plays that slot's show for the slot budget, padding with flex time.

use super::schedule::{FlexPreference, PadStyle, Schedule};
use super::show::{Show, ShowArena};
use crate::constants::{DAY, LIMIT, SLACK};
use crate::error::Result;
use crate::models::{Channel, DurationMs, Program, TimestampMs};
use crate::random::RandomSource;
use crate::reservoir::WeightedReservoir;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, trace};

/// A generated timeline, ready to become a channel lineup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSchedule {
    pub programs: Vec<Program>,
    pub start_time: DateTime<Utc>,
}

impl GeneratedSchedule {
    pub fn total_duration_ms(&self) -> DurationMs {
        self.programs.iter().map(|p| p.duration_ms).sum()
    }

    /// Channel looping this timeline from its generation start
    pub fn into_channel(self, number: u32, name: impl Into<String>) -> Channel {
        Channel::new(number, name, self.start_time.timestamp_millis(), self.programs)
    }
}

/// Timeline under construction
struct Timeline {
    items: Vec<Program>,
    t: TimestampMs,
}

impl Timeline {
    fn new(t0: TimestampMs) -> Self {
        Self {
            items: Vec::new(),
            t: t0,
        }
    }

    /// Appends flex time, merged into a trailing flex entry
    fn push_flex(&mut self, duration: DurationMs) {
        if duration <= 0 {
            return;
        }
        self.t += duration;
        match self.items.last_mut() {
            Some(last) if last.is_offline() => last.duration_ms += duration,
            _ => self.items.push(Program::offline(duration)),
        }
    }

    fn push_program(&mut self, program: Program) {
        if program.is_offline() {
            self.push_flex(program.duration_ms);
        } else {
            self.t += program.duration_ms;
            self.items.push(program);
        }
    }

    /// Drops trailing entries until the timeline fits both bounds
    ///
    /// A trailing flex entry that starts before `hard_limit` is shortened
    /// rather than dropped.
    fn truncate(&mut self, hard_limit: TimestampMs) {
        while self.t > hard_limit || self.items.len() >= LIMIT {
            let len = self.items.len();
            let overflow = self.t - hard_limit;
            let Some(last) = self.items.last_mut() else {
                break;
            };
            if len < LIMIT && last.is_offline() && overflow < last.duration_ms {
                last.duration_ms -= overflow;
                self.t = hard_limit;
                break;
            }
            self.t -= last.duration_ms;
            self.items.pop();
        }
    }
}

/// A program with the flex time that follows it
struct Padded {
    item: Program,
    pad: DurationMs,
}

impl Padded {
    /// Rounds the program up to a multiple of `unit`, unless it is already
    /// within [`SLACK`] of one
    fn new(item: Program, unit: DurationMs) -> Self {
        let m = item.duration_ms % unit;
        let pad = if m > SLACK && unit - m > SLACK { unit - m } else { 0 };
        Self { item, pad }
    }

    fn total(&self) -> DurationMs {
        self.item.duration_ms + self.pad
    }
}

/// Shares the time left before the next pad boundary among a slot's programs
fn distribute_leftover(group: &mut [Padded], rem: DurationMs, schedule: &Schedule) {
    let n = group.len();
    let Some(last) = n.checked_sub(1) else {
        return;
    };

    match (schedule.flex_preference, schedule.pad_style) {
        (FlexPreference::Distribute, PadStyle::Episode) => {
            let pad = schedule.pad;
            let chunks = rem / pad;
            group[last].pad += rem % pad;

            // Whole chunks go to the least padded programs first
            let mut by_pad: Vec<usize> = (0..n).collect();
            by_pad.sort_by_key(|&i| group[i].pad);
            let n = n as DurationMs;
            for (rank, &i) in by_pad.iter().enumerate() {
                let mut q = chunks / n;
                if (rank as DurationMs) < chunks % n {
                    q += 1;
                }
                group[i].pad += q * pad;
            }
        }
        (FlexPreference::Distribute, PadStyle::Slot) => {
            let share = rem / n as DurationMs;
            for padded in group.iter_mut() {
                padded.pad += share;
            }
            group[0].pad += rem - share * n as DurationMs;
        }
        (FlexPreference::End, _) => group[last].pad += rem,
    }
}

/// Generates a timeline starting now, with the process-wide random source
pub async fn generate_schedule(programs: &[Program], schedule: &Schedule) -> Result<GeneratedSchedule> {
    generate_schedule_at(programs, schedule, Utc::now(), RandomSource::global()).await
}

/// Generates a timeline starting at `start`
///
/// Yields to the runtime once per step. The result spans a multiple of
/// `schedule.period`, holds at most [`LIMIT`] entries and never has two
/// flex entries in a row.
///
/// # Errors
///
/// Fails before generating anything when a slot references a show that
/// has no playable program, or a malformed redirect.
pub async fn generate_schedule_at(
    programs: &[Program],
    schedule: &Schedule,
    start: DateTime<Utc>,
    random: &RandomSource,
) -> Result<GeneratedSchedule> {
    let mut shows = ShowArena::from_programs(programs);
    let targets = schedule
        .slots
        .iter()
        .map(|slot| shows.resolve(&slot.show_id))
        .collect::<Result<Vec<Show>>>()?;

    let pad = schedule.pad;
    let pad_unit = match schedule.pad_style {
        PadStyle::Slot => 1,
        PadStyle::Episode => pad,
    };

    let t0 = start.timestamp_millis();
    let hard_limit = t0.saturating_add((schedule.max_days * DAY as f64) as TimestampMs);
    info!(
        slots = schedule.slots.len(),
        shows = shows.len(),
        max_days = schedule.max_days,
        "Generating slot schedule"
    );

    let mut line = Timeline::new(t0);
    let mut last_played: Vec<Option<TimestampMs>> = vec![None; schedule.slots.len()];

    while line.t < hard_limit && line.items.len() < LIMIT {
        tokio::task::yield_now().await;

        let m = line.t.rem_euclid(pad);
        if m > SLACK && pad - m > SLACK {
            line.push_flex(pad - m);
            continue;
        }

        let mut min_next = line.t + 24 * DAY;
        let mut picker = WeightedReservoir::new();
        for (index, slot) in schedule.slots.iter().enumerate() {
            if let Some(last) = last_played[index] {
                min_next = min_next.min(last.saturating_add(slot.cooldown));
                if line.t - last < slot.cooldown - SLACK {
                    continue;
                }
            }
            picker.offer(index, slot.weight, random);
        }

        let Some(index) = picker.into_pick() else {
            let wait = min_next - line.t;
            trace!(t = line.t, wait, "Every slot is cooling down");
            line.push_flex(if wait > 0 { wait } else { pad });
            continue;
        };
        let slot = &schedule.slots[index];
        let remaining = slot.duration;

        let show = match targets[index] {
            Show::Flex => {
                line.push_flex(remaining);
                last_played[index] = Some(line.t);
                continue;
            }
            Show::Redirect(channel) => {
                line.push_program(Program::redirect(channel, remaining));
                last_played[index] = Some(line.t);
                continue;
            }
            Show::Content(show) => show,
        };

        let item = shows.current(show, slot.order, random).clone();
        if item.duration_ms > remaining {
            // Slides past the slot end, the next step realigns
            line.push_program(item);
            last_played[index] = Some(line.t);
            shows.advance(show, slot.order, random);
            continue;
        }

        let first = Padded::new(item, pad_unit);
        let mut total = first.total();
        let mut group = vec![first];
        shows.advance(show, slot.order, random);

        loop {
            let next = shows.current(show, slot.order, random);
            if total + next.duration_ms > remaining {
                break;
            }
            let padded = Padded::new(next.clone(), pad_unit);
            total += padded.total();
            group.push(padded);
            shows.advance(show, slot.order, random);
        }

        let end = (line.t + total).rem_euclid(pad);
        let rem = if end >= SLACK && end < pad - SLACK { pad - end } else { 0 };
        distribute_leftover(&mut group, rem, schedule);

        for padded in group {
            line.push_program(padded.item);
            last_played[index] = Some(line.t);
            line.push_flex(padded.pad);
        }
    }

    line.truncate(hard_limit);
    let m = (line.t - t0).rem_euclid(schedule.period);
    if m != 0 {
        line.push_flex(schedule.period - m);
    }

    info!(
        items = line.items.len(),
        duration_ms = line.t - t0,
        "Slot schedule generated"
    );

    Ok(GeneratedSchedule {
        programs: line.items,
        start_time: start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{HOUR, MINUTE};
    use crate::models::ProgramType;
    use crate::slots::schedule::{Slot, SlotOrder};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn episode(show: &str, number: u32, duration_ms: DurationMs) -> Program {
        Program {
            external_source_id: Some("plex".into()),
            external_key: Some(format!("{show}-{number}")),
            duration_ms,
            show_title: Some(show.into()),
            season_number: Some(1),
            episode_number: Some(number),
            title: format!("{show} {number}"),
            ..Default::default()
        }
    }

    fn slot(show_id: &str, duration: DurationMs) -> Slot {
        Slot {
            show_id: show_id.into(),
            duration,
            weight: 1.0,
            cooldown: 0,
            order: SlotOrder::Next,
        }
    }

    fn schedule(slots: Vec<Slot>, pad: DurationMs, max_days: f64) -> Schedule {
        Schedule {
            slots,
            period: DAY,
            pad,
            max_days,
            flex_preference: FlexPreference::Distribute,
            pad_style: PadStyle::Slot,
        }
    }

    fn assert_well_formed(result: &GeneratedSchedule, schedule: &Schedule) {
        assert!(result.programs.len() <= LIMIT);
        assert_eq!(result.total_duration_ms() % schedule.period, 0);
        for pair in result.programs.windows(2) {
            assert!(!(pair[0].is_offline() && pair[1].is_offline()), "adjacent flex entries");
        }
    }

    fn kinds(result: &GeneratedSchedule) -> Vec<(bool, DurationMs)> {
        result
            .programs
            .iter()
            .map(|p| (p.is_offline(), p.duration_ms))
            .collect()
    }

    #[tokio::test]
    async fn test_flex_only_schedule() {
        let random = RandomSource::seeded(1);
        let schedule = schedule(vec![slot("flex.", 60_000)], 30_000, 1.0);
        let result = generate_schedule_at(&[], &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert!(result.programs.iter().all(Program::is_offline));
        assert_eq!(result.total_duration_ms(), DAY);
    }

    #[tokio::test]
    async fn test_unaligned_start_keeps_bounds() {
        let random = RandomSource::seeded(1);
        let schedule = schedule(vec![slot("flex.", 60_000)], 30_000, 1.0);
        let at = start() + chrono::Duration::milliseconds(10_000);
        let result = generate_schedule_at(&[], &schedule, at, &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(result.total_duration_ms(), DAY);
        assert_eq!(result.start_time, at);
    }

    #[tokio::test]
    async fn test_sequential_episodes_fill_slots() {
        let random = RandomSource::seeded(2);
        let programs = vec![
            episode("Lost", 2, 30 * MINUTE),
            episode("Lost", 1, 30 * MINUTE),
            episode("Lost", 3, 30 * MINUTE),
        ];
        let schedule = schedule(vec![slot("tv.Lost", 30 * MINUTE)], 30 * MINUTE, 1.0);
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(result.programs.len(), 48);
        let numbers: Vec<u32> = result.programs[..4]
            .iter()
            .map(|p| p.episode_number.unwrap())
            .collect();
        assert_eq!(numbers, vec![2, 3, 1, 2]);
    }

    #[tokio::test]
    async fn test_short_episodes_are_packed_with_distributed_flex() {
        let random = RandomSource::seeded(3);
        let programs = vec![episode("Lost", 1, 12 * MINUTE)];
        let schedule = schedule(vec![slot("tv.Lost", 30 * MINUTE)], 30 * MINUTE, 1.0);
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(
            kinds(&result)[..4],
            [
                (false, 12 * MINUTE),
                (true, 3 * MINUTE),
                (false, 12 * MINUTE),
                (true, 3 * MINUTE)
            ]
        );
    }

    #[tokio::test]
    async fn test_flex_at_end() {
        let random = RandomSource::seeded(3);
        let programs = vec![episode("Lost", 1, 12 * MINUTE)];
        let mut schedule = schedule(vec![slot("tv.Lost", 30 * MINUTE)], 30 * MINUTE, 1.0);
        schedule.flex_preference = FlexPreference::End;
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(
            kinds(&result)[..3],
            [(false, 12 * MINUTE), (false, 12 * MINUTE), (true, 6 * MINUTE)]
        );
    }

    #[tokio::test]
    async fn test_episode_pad_style() {
        let random = RandomSource::seeded(4);
        let programs = vec![episode("Lost", 1, 12 * MINUTE)];
        let mut schedule = schedule(vec![slot("tv.Lost", 30 * MINUTE)], 5 * MINUTE, 1.0);
        schedule.pad_style = PadStyle::Episode;
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(
            kinds(&result)[..4],
            [
                (false, 12 * MINUTE),
                (true, 3 * MINUTE),
                (false, 12 * MINUTE),
                (true, 3 * MINUTE)
            ]
        );
    }

    #[tokio::test]
    async fn test_long_program_slides() {
        let random = RandomSource::seeded(5);
        let movie = Program {
            kind: ProgramType::Movie,
            external_key: Some("m".into()),
            duration_ms: 45 * MINUTE,
            title: "Movie".into(),
            ..Default::default()
        };
        let schedule = schedule(vec![slot("movie.", 30 * MINUTE)], 30 * MINUTE, 1.0);
        let result = generate_schedule_at(&[movie], &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(
            kinds(&result)[..3],
            [(false, 45 * MINUTE), (true, 15 * MINUTE), (false, 45 * MINUTE)]
        );
    }

    #[tokio::test]
    async fn test_slot_cooldown() {
        let random = RandomSource::seeded(6);
        let programs = vec![episode("Lost", 1, 30 * MINUTE), episode("Lost", 2, 30 * MINUTE)];
        let mut lost = slot("tv.Lost", 30 * MINUTE);
        lost.cooldown = 2 * HOUR;
        lost.weight = 10.0;
        let schedule = schedule(vec![lost, slot("flex.", 30 * MINUTE)], 30 * MINUTE, 2.0);
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        let mut t = 0;
        let mut starts = Vec::new();
        for program in &result.programs {
            if !program.is_offline() {
                starts.push(t);
            }
            t += program.duration_ms;
        }
        assert!(starts.len() > 2);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= 2 * HOUR, "slot played again too early");
        }
    }

    #[tokio::test]
    async fn test_cooling_down_slot_waits_with_flex() {
        let random = RandomSource::seeded(6);
        let programs = vec![episode("Lost", 1, 30 * MINUTE), episode("Lost", 2, 30 * MINUTE)];
        let mut lost = slot("tv.Lost", 30 * MINUTE);
        lost.cooldown = 2 * HOUR;
        let schedule = schedule(vec![lost], 30 * MINUTE, 1.0);
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        let kinds = kinds(&result);
        assert_eq!(kinds.len(), 20);
        // Each episode ends the play, the wait lasts until the cooldown expires
        for pair in kinds[..18].chunks(2) {
            assert_eq!(pair, [(false, 30 * MINUTE), (true, 2 * HOUR)]);
        }
        assert_eq!(kinds[18], (false, 30 * MINUTE));
        assert_eq!(kinds[19], (true, HOUR));
    }

    #[tokio::test]
    async fn test_huge_values_do_not_overflow() {
        let random = RandomSource::seeded(11);
        let programs = vec![episode("Tiny", 1, 1_000)];
        let endless = schedule(vec![slot("tv.Tiny", 1_000)], 1_000, 1e12);
        let result = generate_schedule_at(&programs, &endless, start(), &random).await.unwrap();
        assert_well_formed(&result, &endless);
        assert_eq!(result.programs.len(), LIMIT);

        let mut flex = slot("flex.", HOUR);
        flex.cooldown = DurationMs::MAX;
        let once = schedule(vec![flex], 30 * MINUTE, 2.0);
        let result = generate_schedule_at(&[], &once, start(), &random).await.unwrap();
        assert_well_formed(&result, &once);
        assert_eq!(result.total_duration_ms(), 2 * DAY);
    }

    #[tokio::test]
    async fn test_redirect_slot() {
        let random = RandomSource::seeded(7);
        let schedule = schedule(vec![slot("redirect.5", HOUR)], 30 * MINUTE, 0.5);
        let result = generate_schedule_at(&[], &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(result.programs.len(), 13);
        assert!(result.programs[..12]
            .iter()
            .all(|p| p.is_redirect() && p.channel == Some(5) && p.duration_ms == HOUR));
        assert!(result.programs[12].is_offline());
        assert_eq!(result.programs[12].duration_ms, 12 * HOUR);
    }

    #[tokio::test]
    async fn test_item_limit() {
        let random = RandomSource::seeded(8);
        let programs = vec![episode("Tiny", 1, 1_000)];
        let schedule = schedule(vec![slot("tv.Tiny", 1_000)], 1_000, 1.0);
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        assert_well_formed(&result, &schedule);
        assert_eq!(result.programs.len(), LIMIT);
        assert!(result.programs.last().unwrap().is_offline());
    }

    #[tokio::test]
    async fn test_unknown_show_fails_before_generation() {
        let random = RandomSource::seeded(9);
        let schedule = schedule(vec![slot("tv.Nope", HOUR)], 30 * MINUTE, 1.0);
        let err = generate_schedule_at(&[], &schedule, start(), &random).await.unwrap_err();
        assert!(!err.is_user_error());
    }

    #[tokio::test]
    async fn test_into_channel_resolves() {
        let random = RandomSource::seeded(10);
        let programs = vec![episode("Lost", 1, 22 * MINUTE)];
        let schedule = schedule(vec![slot("tv.Lost", 30 * MINUTE)], 30 * MINUTE, 1.0);
        let result = generate_schedule_at(&programs, &schedule, start(), &random).await.unwrap();

        let channel = result.into_channel(4, "Lost TV");
        assert!(channel.check_duration());
        assert_eq!(channel.duration, DAY);
        assert_eq!(channel.start_time, start().timestamp_millis());
    }
}
