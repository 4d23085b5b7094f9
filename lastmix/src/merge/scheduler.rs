//! Windowed merge scheduler.
//!
//! The scheduler interleaves many source playlists into one. At any moment
//! only a bounded *working set* (the window) of sources may emit tracks; the
//! rest wait in a pending queue. Each scheduling round:
//!
//! 1. exhausted sources leave the working set;
//! 2. sources that have served their quota are evicted to the back of the
//!    pending queue (only while other sources are waiting);
//! 3. pending sources are admitted, front first, until the window is full;
//! 4. one or more sources emit their next track.
//!
//! ```text
//!   pending: [f g h ...] ──admit──► working: [a b c d e] ──emit──► output
//!        ▲                                  │
//!        └──────────── evict at quota ──────┘
//! ```
//!
//! The emission policy in step 4 is one of:
//!
//! - **round-robin**: every working source emits once per round;
//! - **fair subrange**: only the sources in the lowest descending run of
//!   served counts emit, which admits replacements one at a time and gives a
//!   sliding rather than tumbling window;
//! - **random**: a single source is drawn through a [`FairSelector`].

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use crate::fairness::FairSelector;
use crate::sequence::lowest_descending_subrange;

/// Window size and quota used by the named 5x5 strategies.
pub const DEFAULT_WINDOW: usize = 5;

/// Scheduler configuration.
///
/// A `window` of 0 admits every source at once. A `promote_after` of 0
/// disables quota-based eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowedMerge {
    window: usize,
    promote_after: usize,
    randomized: bool,
    fair: bool,
}

/// A source playlist resident in (or waiting for) the working set.
#[derive(Debug)]
struct SourceQueue<T> {
    id: usize,
    items: Arc<[T]>,
    position: usize,
    served: usize,
}

impl<T: Clone> SourceQueue<T> {
    fn new(id: usize, items: Arc<[T]>) -> Self {
        Self {
            id,
            items,
            position: 0,
            served: 0,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.items.len()
    }

    fn pop(&mut self) -> Option<T> {
        let item = self.items.get(self.position).cloned()?;
        self.position += 1;
        Some(item)
    }

    /// True if both queues read the same shared slice at the same position.
    fn same_cursor(&self, items: &Arc<[T]>, position: usize) -> bool {
        Arc::ptr_eq(&self.items, items) && self.position == position
    }
}

impl WindowedMerge {
    /// Creates a deterministic round-robin scheduler.
    pub fn new(window: usize, promote_after: usize) -> Self {
        Self {
            window,
            promote_after,
            randomized: false,
            fair: false,
        }
    }

    /// Strict round-robin over all sources.
    pub fn interleave() -> Self {
        Self::new(0, 0)
    }

    /// Unweighted random interleave over all sources.
    pub fn interleave_shuffle() -> Self {
        Self::new(0, 0).randomized(true)
    }

    /// Batches of `window` sources, `quota` tracks each before rotating.
    pub fn tumbling(window: usize, quota: usize) -> Self {
        Self::new(window, quota)
    }

    /// Like [`tumbling`](Self::tumbling), but replacements are admitted one
    /// source at a time.
    pub fn sliding(window: usize, quota: usize) -> Self {
        Self::new(window, quota).fair(true)
    }

    /// Weighted random draw inside a rotating window.
    pub fn shuffled(window: usize, quota: usize) -> Self {
        Self::new(window, quota).randomized(true).fair(true)
    }

    /// Draw one source at random per round instead of emitting round-robin.
    pub fn randomized(mut self, randomized: bool) -> Self {
        self.randomized = randomized;
        self
    }

    /// Use fair selection (fair subrange, or repeat-avoiding random draws).
    pub fn fair(mut self, fair: bool) -> Self {
        self.fair = fair;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn promote_after(&self) -> usize {
        self.promote_after
    }

    pub fn is_randomized(&self) -> bool {
        self.randomized
    }

    pub fn is_fair(&self) -> bool {
        self.fair
    }

    /// Merges owned sources using the thread-local random generator.
    pub fn merge<T: Clone>(&self, sources: Vec<Vec<T>>) -> Vec<T> {
        self.merge_with(sources, &mut rand::rng())
    }

    /// Merges owned sources using the given random generator.
    pub fn merge_with<T: Clone, R: Rng + ?Sized>(
        &self,
        sources: Vec<Vec<T>>,
        rng: &mut R,
    ) -> Vec<T> {
        let shared = sources
            .into_iter()
            .map(|items| Arc::<[T]>::from(items))
            .collect();
        self.merge_shared(shared, rng)
    }

    /// Merges shared sources.
    ///
    /// The same slice may appear more than once. Each occurrence is read
    /// through its own cursor, so it emits its own copy of every track. In
    /// randomized mode, a draw also counts against any other occurrence whose
    /// cursor sits on the same slice and position as the drawn one.
    pub fn merge_shared<T: Clone, R: Rng + ?Sized>(
        &self,
        sources: Vec<Arc<[T]>>,
        rng: &mut R,
    ) -> Vec<T> {
        let total: usize = sources.iter().map(|s| s.len()).sum();
        let mut output = Vec::with_capacity(total);

        let mut pending: VecDeque<SourceQueue<T>> = sources
            .into_iter()
            .enumerate()
            .filter(|(_, items)| !items.is_empty())
            .map(|(id, items)| SourceQueue::new(id, items))
            .collect();
        let mut working: Vec<SourceQueue<T>> = Vec::new();
        let mut selector = FairSelector::new();

        while !working.is_empty() || !pending.is_empty() {
            self.retire_exhausted(&mut working, &mut selector);
            self.promote(&mut working, &mut pending, &mut selector);
            self.admit(&mut working, &mut pending, &mut selector);

            if working.is_empty() {
                continue;
            }

            if self.randomized {
                match selector.choice(rng, self.fair) {
                    Some(id) => Self::emit_chosen(&mut working, id, &mut output),
                    None => break,
                }
            } else {
                let (begin, end) = if self.fair {
                    let counts: Vec<usize> = working.iter().map(|s| s.served).collect();
                    lowest_descending_subrange(&counts)
                } else {
                    (0, working.len())
                };
                for source in &mut working[begin..end] {
                    if let Some(item) = source.pop() {
                        output.push(item);
                        source.served += 1;
                    }
                }
            }
        }

        output
    }

    fn retire_exhausted<T: Clone>(
        &self,
        working: &mut Vec<SourceQueue<T>>,
        selector: &mut FairSelector<usize>,
    ) {
        working.retain(|source| {
            if source.is_exhausted() {
                trace!(source = source.id, "source exhausted");
                selector.remove(&source.id);
                false
            } else {
                true
            }
        });
    }

    fn promote<T: Clone>(
        &self,
        working: &mut Vec<SourceQueue<T>>,
        pending: &mut VecDeque<SourceQueue<T>>,
        selector: &mut FairSelector<usize>,
    ) {
        if self.promote_after == 0 || pending.is_empty() {
            return;
        }

        let mut kept = Vec::with_capacity(working.len());
        for mut source in working.drain(..) {
            if source.served >= self.promote_after {
                trace!(source = source.id, served = source.served, "source promoted");
                selector.remove(&source.id);
                source.served = 0;
                pending.push_back(source);
            } else {
                kept.push(source);
            }
        }
        *working = kept;
    }

    fn admit<T: Clone>(
        &self,
        working: &mut Vec<SourceQueue<T>>,
        pending: &mut VecDeque<SourceQueue<T>>,
        selector: &mut FairSelector<usize>,
    ) {
        while self.window == 0 || working.len() < self.window {
            let Some(source) = pending.pop_front() else {
                break;
            };
            if self.randomized {
                selector.insert(source.id);
            }
            working.push(source);
        }
    }

    fn emit_chosen<T: Clone>(working: &mut [SourceQueue<T>], id: usize, output: &mut Vec<T>) {
        let Some(chosen) = working.iter_mut().find(|s| s.id == id) else {
            return;
        };
        if let Some(item) = chosen.pop() {
            output.push(item);
        }
        let items = Arc::clone(&chosen.items);
        let position = chosen.position;

        for source in working.iter_mut() {
            if source.id == id || source.same_cursor(&items, position) {
                source.served += 1;
            }
        }
    }
}

impl Default for WindowedMerge {
    fn default() -> Self {
        Self::interleave()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sources(count: usize, len: usize) -> Vec<Vec<String>> {
        (0..count)
            .map(|s| {
                let letter = (b'a' + s as u8) as char;
                (1..=len).map(|i| format!("{}{}", letter, i)).collect()
            })
            .collect()
    }

    fn position_of(output: &[String], item: &str) -> usize {
        output.iter().position(|x| x == item).unwrap()
    }

    #[test]
    fn test_merge_empty() {
        let merged: Vec<String> = WindowedMerge::interleave().merge(Vec::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_single_source() {
        let merged = WindowedMerge::interleave().merge(vec![vec!["a", "b", "c"]]);
        assert_eq!(merged, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_interleave_is_column_major() {
        let merged = WindowedMerge::interleave().merge(sources(4, 4));
        let expected = vec![
            "a1", "b1", "c1", "d1", "a2", "b2", "c2", "d2", "a3", "b3", "c3", "d3", "a4", "b4",
            "c4", "d4",
        ];
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_interleave_uneven_lengths() {
        let merged = WindowedMerge::interleave().merge(vec![vec!["a1", "a2", "a3"], vec!["b1"], vec![]]);
        assert_eq!(merged, vec!["a1", "b1", "a2", "a3"]);
    }

    #[test]
    fn test_tumbling_window_rotates_sources() {
        // Two-source window with a two-track quota over three sources.
        let merged = WindowedMerge::tumbling(2, 2).merge(sources(3, 4));
        let expected = vec![
            "a1", "b1", "a2", "b2", "c1", "a3", "c2", "a4", "b3", "c3", "b4", "c4",
        ];
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_window_without_quota_drains_in_batches() {
        let merged = WindowedMerge::new(2, 0).merge(sources(3, 2));
        assert_eq!(merged, vec!["a1", "b1", "a2", "b2", "c1", "c2"]);
    }

    #[test]
    fn test_sliding_window_starts_with_staircase() {
        let merged = WindowedMerge::sliding(3, 3).merge(sources(3, 3));
        assert_eq!(&merged[..6], &["a1", "a2", "b1", "a3", "b2", "c1"]);
        assert_eq!(merged.len(), 9);
    }

    #[test]
    fn test_randomized_merge_keeps_every_track_in_source_order() {
        let input = sources(6, 7);
        let mut rng = StdRng::seed_from_u64(17);
        let merged = WindowedMerge::shuffled(3, 2).merge_with(input.clone(), &mut rng);

        assert_eq!(merged.len(), 42);
        for source in &input {
            let positions: Vec<usize> = source.iter().map(|t| position_of(&merged, t)).collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_randomized_merge_is_reproducible_with_seed() {
        let first = WindowedMerge::interleave_shuffle()
            .merge_with(sources(4, 5), &mut StdRng::seed_from_u64(5));
        let second = WindowedMerge::interleave_shuffle()
            .merge_with(sources(4, 5), &mut StdRng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn test_randomized_window_limits_active_sources() {
        // With a one-source window and no quota, sources drain one after another.
        let mut rng = StdRng::seed_from_u64(99);
        let merged = WindowedMerge::new(1, 0)
            .randomized(true)
            .merge_with(sources(3, 3), &mut rng);
        assert_eq!(
            merged,
            vec!["a1", "a2", "a3", "b1", "b2", "b3", "c1", "c2", "c3"]
        );
    }

    #[test]
    fn test_shared_sources_emit_independently() {
        let shared: Arc<[&str]> = Arc::from(vec!["x1", "x2"]);
        let mut rng = StdRng::seed_from_u64(1);
        let merged = WindowedMerge::interleave().merge_shared(
            vec![Arc::clone(&shared), Arc::clone(&shared)],
            &mut rng,
        );
        assert_eq!(merged, vec!["x1", "x1", "x2", "x2"]);
    }

    #[test]
    fn test_shared_sources_randomized_emit_every_copy() {
        let shared: Arc<[&str]> = Arc::from(vec!["x1", "x2", "x3"]);
        let other: Arc<[&str]> = Arc::from(vec!["y1"]);
        let mut rng = StdRng::seed_from_u64(23);
        let merged = WindowedMerge::shuffled(2, 1).merge_shared(
            vec![Arc::clone(&shared), other, Arc::clone(&shared)],
            &mut rng,
        );
        assert_eq!(merged.len(), 7);
        assert_eq!(merged.iter().filter(|t| **t == "x1").count(), 2);
    }

    #[test]
    fn test_named_configurations() {
        assert_eq!(WindowedMerge::interleave().window(), 0);
        assert!(WindowedMerge::interleave_shuffle().is_randomized());
        assert!(!WindowedMerge::interleave_shuffle().is_fair());
        let sliding = WindowedMerge::sliding(5, 5);
        assert!(sliding.is_fair() && !sliding.is_randomized());
        let shuffled = WindowedMerge::shuffled(5, 5);
        assert!(shuffled.is_fair() && shuffled.is_randomized());
        assert_eq!(shuffled.promote_after(), 5);
    }
}
