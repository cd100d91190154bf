//! Weighted reservoir of size one
//!
//! Candidates are offered one at a time with their weight. After the last
//! offer, each candidate has been kept with probability
//! `weight / total_weight`, without the weights ever being collected.
//!
//! ```
//! use pmotv::{RandomSource, WeightedReservoir};
//!
//! let random = RandomSource::seeded(1);
//! let mut reservoir = WeightedReservoir::new();
//! for (name, weight) in [("a", 1.0), ("b", 3.0), ("c", 0.0)] {
//!     reservoir.offer(name, weight, &random);
//! }
//! assert!(matches!(reservoir.pick(), Some(&"a") | Some(&"b")));
//! ```

use crate::random::RandomSource;

#[derive(Debug, Clone)]
pub struct WeightedReservoir<T> {
    total: f64,
    pick: Option<T>,
}

impl<T> WeightedReservoir<T> {
    pub fn new() -> Self {
        Self {
            total: 0.0,
            pick: None,
        }
    }

    /// Offers a candidate, returns true if it replaced the current pick
    ///
    /// Non-positive weights are ignored.
    pub fn offer(&mut self, item: T, weight: f64, random: &RandomSource) -> bool {
        if weight <= 0.0 {
            return false;
        }
        self.total += weight;
        if random.weighted_bool(weight, self.total) {
            self.pick = Some(item);
            true
        } else {
            false
        }
    }

    /// Forgets the accumulated weight but keeps the current pick
    pub fn reset_weight(&mut self) {
        self.total = 0.0;
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    pub fn pick(&self) -> Option<&T> {
        self.pick.as_ref()
    }

    pub fn into_pick(self) -> Option<T> {
        self.pick
    }
}

impl<T> Default for WeightedReservoir<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks one element of `items` with probability proportional to `weight`
pub fn weighted_pick<'a, T, F>(items: &'a [T], weight: F, random: &RandomSource) -> Option<&'a T>
where
    F: Fn(&T) -> f64,
{
    let mut reservoir = WeightedReservoir::new();
    for item in items {
        reservoir.offer(item, weight(item), random);
    }
    reservoir.into_pick()
}
