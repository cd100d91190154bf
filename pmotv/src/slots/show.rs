//! Shows: programs grouped under a scheduling key, with their cursors
//!
//! A slot names a show by id. `flex.` and `redirect.<n>` are synthetic
//! shows without programs; every other id refers to a [`ContentShow`]
//! built from the programs handed to the generator. Cursors live in the
//! [`ShowArena`] of one generation run and are created on first use.

use super::schedule::SlotOrder;
use crate::error::{Error, Result};
use crate::models::{Program, ProgramKey, ProgramType};
use crate::random::RandomSource;
use std::collections::{HashMap, HashSet};

pub const FLEX_SHOW_ID: &str = "flex.";
pub const REDIRECT_SHOW_PREFIX: &str = "redirect.";

/// Grouping key of a program and its rank inside the group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShowKey {
    pub id: String,
    pub order: i64,
}

impl ShowKey {
    fn new(id: String, order: i64) -> Self {
        Self { id, order }
    }

    /// Show a program belongs to, `None` when it cannot be grouped
    pub fn for_program(program: &Program) -> Option<ShowKey> {
        match program.kind {
            ProgramType::Flex => Some(Self::new(FLEX_SHOW_ID.to_string(), 0)),
            ProgramType::Redirect => program
                .channel
                .map(|channel| Self::new(format!("{REDIRECT_SHOW_PREFIX}{channel}"), 0)),
            _ if program.custom_show_id.is_some() => {
                let id = program.custom_show_id.as_deref().unwrap_or_default();
                Some(Self::new(
                    format!("custom-show.{id}"),
                    program.custom_order.unwrap_or(0),
                ))
            }
            ProgramType::Episode => {
                let title = program.show_title.as_deref()?;
                let season = i64::from(program.season_number.unwrap_or(0));
                let episode = i64::from(program.episode_number.unwrap_or(0));
                Some(Self::new(format!("tv.{title}"), season * 100_000 + episode))
            }
            ProgramType::Track => {
                let album = program.album.as_deref().unwrap_or(&program.title);
                Some(Self::new(format!("track.{album}"), 0))
            }
            ProgramType::Movie => Some(Self::new("movie.".to_string(), 0)),
            ProgramType::Custom => None,
        }
    }
}

/// What a slot plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    /// Flex time for the whole slot
    Flex,
    /// Redirect to another channel for the whole slot
    Redirect(u32),
    /// Programs of the arena show at this index
    Content(usize),
}

/// Position in a show's programs, sequential or shuffled
#[derive(Debug, Clone)]
pub struct ShowCursor {
    order: Vec<usize>,
    position: usize,
    mode: SlotOrder,
}

impl ShowCursor {
    /// Programs sorted by rank, starting at the founder's rank
    pub fn sequential(ranks: &[i64], founder_rank: i64) -> Self {
        let mut order: Vec<usize> = (0..ranks.len()).collect();
        order.sort_by_key(|&i| ranks[i]);

        let mut position = 0;
        while position + 1 < order.len() && ranks[order[position]] != founder_rank {
            position += 1;
        }

        Self {
            order,
            position,
            mode: SlotOrder::Next,
        }
    }

    pub fn shuffled(len: usize, random: &RandomSource) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        random.shuffle_range(&mut order, 0, len);
        Self {
            order,
            position: 0,
            mode: SlotOrder::Shuffle,
        }
    }

    /// Index of the current program in the show
    pub fn current(&self) -> usize {
        self.order[self.position]
    }

    /// Moves to the next program
    ///
    /// A shuffled cursor that went through every program reshuffles each
    /// half separately, so the last programs of a cycle cannot open the
    /// next one.
    pub fn advance(&mut self, random: &RandomSource) {
        let n = self.order.len();
        match self.mode {
            SlotOrder::Next => self.position = (self.position + 1) % n,
            SlotOrder::Shuffle => {
                self.position += 1;
                if self.position == n {
                    let half = n / 2;
                    random.shuffle_range(&mut self.order, 0, half);
                    random.shuffle_range(&mut self.order, half, n);
                    self.position = 0;
                }
            }
        }
    }
}

/// Programs sharing a [`ShowKey`] id
#[derive(Debug, Clone)]
pub struct ContentShow {
    pub id: String,
    /// Order of the first program seen for this show
    founder_order: i64,
    programs: Vec<Program>,
    orders: Vec<i64>,
    members: HashSet<ProgramKey>,
    sequential: Option<ShowCursor>,
    shuffled: Option<ShowCursor>,
}

impl ContentShow {
    fn new(key: &ShowKey) -> Self {
        Self {
            id: key.id.clone(),
            founder_order: key.order,
            programs: Vec::new(),
            orders: Vec::new(),
            members: HashSet::new(),
            sequential: None,
            shuffled: None,
        }
    }

    /// Adds a program once; unplayable ones are skipped
    fn add(&mut self, program: &Program, order: i64) {
        if program.duration_ms <= 0 {
            return;
        }
        if self.members.insert(program.key()) {
            self.programs.push(program.clone());
            self.orders.push(order);
        }
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    fn cursor(&mut self, mode: SlotOrder, random: &RandomSource) -> &mut ShowCursor {
        match mode {
            SlotOrder::Next => self
                .sequential
                .get_or_insert_with(|| ShowCursor::sequential(&self.orders, self.founder_order)),
            SlotOrder::Shuffle => self
                .shuffled
                .get_or_insert_with(|| ShowCursor::shuffled(self.programs.len(), random)),
        }
    }
}

/// Content shows of one generation run
#[derive(Debug, Default)]
pub struct ShowArena {
    shows: Vec<ContentShow>,
    by_id: HashMap<String, usize>,
}

impl ShowArena {
    /// Groups programs into shows, in order of first appearance
    pub fn from_programs(programs: &[Program]) -> Self {
        let mut arena = Self::default();
        for program in programs {
            let Some(key) = ShowKey::for_program(program) else {
                continue;
            };
            if key.id == FLEX_SHOW_ID || key.id.starts_with(REDIRECT_SHOW_PREFIX) {
                continue;
            }
            let index = match arena.by_id.get(&key.id) {
                Some(&index) => index,
                None => {
                    arena.by_id.insert(key.id.clone(), arena.shows.len());
                    arena.shows.push(ContentShow::new(&key));
                    arena.shows.len() - 1
                }
            };
            arena.shows[index].add(program, key.order);
        }
        arena
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentShow> {
        self.by_id.get(id).map(|&index| &self.shows[index])
    }

    /// Resolves a slot's show id
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSchedule`] for a redirect without a valid channel
    /// number, [`Error::ShowNotFound`] / [`Error::EmptyShow`] when no
    /// playable program belongs to the show.
    pub fn resolve(&self, show_id: &str) -> Result<Show> {
        if show_id == FLEX_SHOW_ID {
            return Ok(Show::Flex);
        }
        if let Some(channel) = show_id.strip_prefix(REDIRECT_SHOW_PREFIX) {
            return channel.parse().map(Show::Redirect).map_err(|_| {
                Error::invalid_schedule(format!("Invalid redirect show id: \"{show_id}\""))
            });
        }
        let &index = self
            .by_id
            .get(show_id)
            .ok_or_else(|| Error::ShowNotFound(show_id.to_string()))?;
        if self.shows[index].programs.is_empty() {
            return Err(Error::EmptyShow(show_id.to_string()));
        }
        Ok(Show::Content(index))
    }

    /// Current program of a show for the given cursor mode
    pub fn current(&mut self, show: usize, mode: SlotOrder, random: &RandomSource) -> &Program {
        let show = &mut self.shows[show];
        let index = show.cursor(mode, random).current();
        &show.programs[index]
    }

    pub fn advance(&mut self, show: usize, mode: SlotOrder, random: &RandomSource) {
        self.shows[show].cursor(mode, random).advance(random);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MINUTE;

    fn episode(show: &str, season: u32, number: u32) -> Program {
        Program {
            external_source_id: Some("plex".into()),
            external_key: Some(format!("{show}-{season}-{number}")),
            duration_ms: 22 * MINUTE,
            show_title: Some(show.into()),
            season_number: Some(season),
            episode_number: Some(number),
            title: format!("{show} S{season}E{number}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_show_keys() {
        assert_eq!(ShowKey::for_program(&episode("Lost", 2, 3)).unwrap(), ShowKey::new("tv.Lost".into(), 200_003));
        assert_eq!(ShowKey::for_program(&Program::offline(1_000)).unwrap().id, "flex.");
        assert_eq!(ShowKey::for_program(&Program::redirect(4, 1_000)).unwrap().id, "redirect.4");

        let movie = Program {
            kind: ProgramType::Movie,
            duration_ms: 1,
            ..Default::default()
        };
        assert_eq!(ShowKey::for_program(&movie).unwrap().id, "movie.");

        let custom = Program {
            custom_show_id: Some("abc".into()),
            custom_order: Some(4),
            kind: ProgramType::Movie,
            ..Default::default()
        };
        assert_eq!(ShowKey::for_program(&custom).unwrap(), ShowKey::new("custom-show.abc".into(), 4));

        let loose = Program {
            kind: ProgramType::Episode,
            ..Default::default()
        };
        assert!(ShowKey::for_program(&loose).is_none());
    }

    #[test]
    fn test_arena_deduplicates_and_skips_empty() {
        let mut broken = episode("Lost", 1, 9);
        broken.duration_ms = 0;
        let arena = ShowArena::from_programs(&[
            episode("Lost", 1, 1),
            episode("Lost", 1, 1),
            broken,
            Program::offline(5_000),
            episode("Fargo", 1, 1),
        ]);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get("tv.Lost").unwrap().programs().len(), 1);
        assert_eq!(arena.resolve("tv.Fargo").unwrap(), Show::Content(1));
        assert_eq!(arena.resolve("flex.").unwrap(), Show::Flex);
        assert_eq!(arena.resolve("redirect.12").unwrap(), Show::Redirect(12));
        assert!(matches!(arena.resolve("redirect.x"), Err(Error::InvalidSchedule(_))));
        assert!(matches!(arena.resolve("tv.Nope"), Err(Error::ShowNotFound(_))));
    }

    #[test]
    fn test_empty_show_is_an_error() {
        let mut broken = episode("Lost", 1, 1);
        broken.duration_ms = -5;
        let arena = ShowArena::from_programs(&[broken]);
        assert!(matches!(arena.resolve("tv.Lost"), Err(Error::EmptyShow(_))));
    }

    #[test]
    fn test_sequential_starts_at_founder() {
        let random = RandomSource::seeded(1);
        let mut arena = ShowArena::from_programs(&[
            episode("Lost", 1, 2),
            episode("Lost", 1, 1),
            episode("Lost", 1, 3),
        ]);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(arena.current(0, SlotOrder::Next, &random).episode_number.unwrap());
            arena.advance(0, SlotOrder::Next, &random);
        }
        assert_eq!(seen, vec![2, 3, 1, 2]);
    }

    #[test]
    fn test_shuffle_reshuffles_halves() {
        let random = RandomSource::seeded(9);
        let programs: Vec<Program> = (1..=6).map(|n| episode("Lost", 1, n)).collect();
        let mut arena = ShowArena::from_programs(&programs);

        let cycle = |arena: &mut ShowArena| {
            (0..6)
                .map(|_| {
                    let n = arena.current(0, SlotOrder::Shuffle, &random).episode_number.unwrap();
                    arena.advance(0, SlotOrder::Shuffle, &random);
                    n
                })
                .collect::<Vec<_>>()
        };

        let first = cycle(&mut arena);
        let second = cycle(&mut arena);

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6]);

        let mut a: Vec<_> = first[..3].to_vec();
        let mut b: Vec<_> = second[..3].to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
