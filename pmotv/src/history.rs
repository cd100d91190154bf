//! Play history lookups.
//!
//! The core only reads history: whoever streams content records it. A
//! timestamp of `0` means "never played on this channel".

use crate::models::{ProgramKey, TimestampMs};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

/// Read access to per-channel play history
pub trait PlayHistory: Send + Sync {
    /// Last time `program` started on `channel`, or 0
    fn program_last_play(&self, channel: u32, program: &ProgramKey) -> TimestampMs;

    /// Last time a clip of `collection_id` started on `channel`, or 0
    fn collection_last_play(&self, channel: u32, collection_id: &str) -> TimestampMs;
}

/// History with nothing ever played
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl PlayHistory for NoHistory {
    fn program_last_play(&self, _channel: u32, _program: &ProgramKey) -> TimestampMs {
        0
    }

    fn collection_last_play(&self, _channel: u32, _collection_id: &str) -> TimestampMs {
        0
    }
}

#[derive(Debug, Default)]
struct HistoryTables {
    programs: HashMap<(u32, ProgramKey), TimestampMs>,
    collections: HashMap<(u32, String), TimestampMs>,
}

/// In-memory history shared between the streaming side and the scheduler
#[derive(Debug, Default)]
pub struct MemoryPlayHistory {
    tables: RwLock<HistoryTables>,
}

impl MemoryPlayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HistoryTables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HistoryTables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_program(&self, channel: u32, program: ProgramKey, at: TimestampMs) {
        self.write().programs.insert((channel, program), at);
    }

    pub fn record_collection(&self, channel: u32, collection_id: impl Into<String>, at: TimestampMs) {
        self.write().collections.insert((channel, collection_id.into()), at);
    }

    /// Forgets everything recorded for every channel
    pub fn clear(&self) {
        let mut tables = self.write();
        tables.programs.clear();
        tables.collections.clear();
    }

    pub fn len(&self) -> usize {
        let tables = self.read();
        tables.programs.len() + tables.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlayHistory for MemoryPlayHistory {
    fn program_last_play(&self, channel: u32, program: &ProgramKey) -> TimestampMs {
        self.read()
            .programs
            .get(&(channel, program.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn collection_last_play(&self, channel: u32, collection_id: &str) -> TimestampMs {
        self.read()
            .collections
            .get(&(channel, collection_id.to_string()))
            .copied()
            .unwrap_or(0)
    }
}
