//! Fair random selection with bounded repeat avoidance.
//!
//! [`FairSelector`] picks outcomes uniformly at random, optionally refusing to
//! repeat any outcome picked in the recent past. The history is capped at half
//! the number of live outcomes, so a fair pick always has at least half of the
//! pool to choose from. Over a long run this evens out how often each outcome
//! is chosen without collapsing into a fixed rotation.

use rand::Rng;
use std::collections::VecDeque;

/// Random chooser over a changing pool of outcomes.
///
/// The selector borrows its randomness from the caller on every pick, so a
/// seeded generator gives reproducible selections.
#[derive(Debug, Clone)]
pub struct FairSelector<T> {
    outcomes: Vec<T>,
    /// Most recent pick at the front.
    history: VecDeque<T>,
}

impl<T> Default for FairSelector<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
            history: VecDeque::new(),
        }
    }
}

impl<T: Clone + PartialEq> FairSelector<T> {
    /// Creates an empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an outcome to the pool.
    pub fn insert(&mut self, outcome: T) {
        self.outcomes.push(outcome);
    }

    /// Removes one occurrence of `outcome` from the pool and forgets it from
    /// the history.
    pub fn remove(&mut self, outcome: &T) {
        if let Some(pos) = self.outcomes.iter().position(|o| o == outcome) {
            self.outcomes.remove(pos);
        }
        if let Some(pos) = self.history.iter().position(|o| o == outcome) {
            self.history.remove(pos);
        }
    }

    /// Number of outcomes in the pool.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Recently chosen outcomes, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &T> {
        self.history.iter()
    }

    /// Picks an outcome.
    ///
    /// With `fair == false` this is a uniform pick. With `fair == true` and
    /// more than two outcomes, anything in the (trimmed) history is rejected
    /// and redrawn. Returns `None` when the pool is empty.
    pub fn choice<R: Rng + ?Sized>(&mut self, rng: &mut R, fair: bool) -> Option<T> {
        if !fair || self.outcomes.len() <= 2 {
            return self.outcome(rng);
        }

        let limit = self.outcomes.len() / 2;
        self.history.truncate(limit);

        loop {
            let candidate = self.outcome(rng)?;
            if !self.history.contains(&candidate) {
                self.history.push_front(candidate.clone());
                return Some(candidate);
            }
        }
    }

    fn outcome<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        if self.outcomes.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.outcomes.len());
        Some(self.outcomes[idx].clone())
    }
}
