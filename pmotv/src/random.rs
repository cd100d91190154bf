//! Shared random source
//!
//! Every weighted pick, shuffle and randomized join point draws from a
//! [`RandomSource`] passed by the caller. The process-wide instance returned
//! by [`RandomSource::global`] is seeded once and advances across calls;
//! tests build their own with [`RandomSource::seeded`].

use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard, PoisonError};

static GLOBAL: OnceCell<RandomSource> = OnceCell::new();

/// Thread-safe pseudo-random generator
#[derive(Debug)]
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic source
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Process-wide source, OS-seeded unless [`install_global`](Self::install_global) ran first
    pub fn global() -> &'static RandomSource {
        GLOBAL.get_or_init(Self::from_entropy)
    }

    /// Installs the process-wide source
    ///
    /// Returns `false` if the global source was already initialised, in
    /// which case the existing one is kept.
    pub fn install_global(source: RandomSource) -> bool {
        GLOBAL.set(source).is_ok()
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true with probability `numerator / denominator`
    ///
    /// A non-positive numerator never succeeds, a numerator at or above the
    /// denominator always does.
    pub fn weighted_bool(&self, numerator: f64, denominator: f64) -> bool {
        if numerator <= 0.0 || denominator <= 0.0 {
            return false;
        }
        if numerator >= denominator {
            return true;
        }
        self.rng().random_range(0.0..denominator) < numerator
    }

    /// Uniform integer in `[lo, hi]`, both bounds included
    pub fn integer(&self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng().random_range(lo..=hi)
    }

    /// Fisher-Yates shuffle of `items[lo..hi]`, leaving the rest untouched
    pub fn shuffle_range<T>(&self, items: &mut [T], lo: usize, hi: usize) {
        let hi = hi.min(items.len());
        if hi <= lo + 1 {
            return;
        }
        let mut rng = self.rng();
        let mut current = hi;
        while current > lo + 1 {
            let pick = rng.random_range(lo..current);
            current -= 1;
            items.swap(current, pick);
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}
