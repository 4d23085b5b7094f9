//! Merge strategy selection.
//!
//! [`MergeStrategy`] is the closed set of ways to combine several playlists
//! into one. Strategies are resolved from their user-facing names with
//! [`FromStr`]; every alias the command line accepts is listed in
//! [`MergeStrategy::NAMES`].

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use super::scheduler::{WindowedMerge, DEFAULT_WINDOW};
use super::set_ops;
use crate::error::{LastmixError, StrategyKind};
use crate::sequence::deduplicate_across;

/// How playlists are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Concatenate the playlists, dropping tracks seen earlier.
    Join,
    /// Concatenate, then shuffle the whole result.
    Randomize,
    /// Strict round-robin over all playlists.
    Interleave,
    /// Random interleave over all playlists.
    InterleaveShuffle,
    /// `window` playlists at a time, `quota` tracks each, rotating in batches.
    Tumbling { window: usize, quota: usize },
    /// Like `Tumbling`, but replacements slide in one playlist at a time.
    Sliding { window: usize, quota: usize },
    /// Random draws inside a rotating window.
    Shuffle { window: usize, quota: usize },
    Union,
    Intersection,
    SymmetricDifference,
    Difference,
    Overlay,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        MergeStrategy::Join
    }
}

impl MergeStrategy {
    /// Accepted names, grouped by strategy.
    pub const NAMES: &'static [(&'static str, &'static [&'static str])] = &[
        ("join", &["append", "join"]),
        ("randomize", &["random", "randomize"]),
        ("interleave", &["interleave"]),
        (
            "interleave-shuffle",
            &["shuffle-interleave", "interleave-shuffle", "merge-shuffle"],
        ),
        ("merge", &["merge", "merge5x5", "5x5merge"]),
        ("slide", &["5x5", "slide"]),
        ("shuffle", &["5x5shuffle", "shuffle5x5", "shuffle"]),
        (
            "union",
            &[
                "union",
                "merge-union",
                "unique-merge",
                "unique-interleave",
                "interleave-unique",
                "merge-unique",
            ],
        ),
        (
            "intersection",
            &["intersection", "merge-intersection", "intersect"],
        ),
        ("symmetric-difference", &["symmetric-difference"]),
        ("difference", &["difference"]),
        (
            "overlay",
            &[
                "overlay",
                "overlay-merge",
                "overlay-interleave",
                "interleave-overlay",
                "merge-overlay",
            ],
        ),
    ];

    /// The five-by-five sliding window used by the normalizing presets.
    pub fn slide5x5() -> Self {
        MergeStrategy::Sliding {
            window: DEFAULT_WINDOW,
            quota: DEFAULT_WINDOW,
        }
    }

    /// The scheduler configuration behind a windowed strategy, if any.
    pub fn scheduler(&self) -> Option<WindowedMerge> {
        match *self {
            MergeStrategy::Interleave => Some(WindowedMerge::interleave()),
            MergeStrategy::InterleaveShuffle => Some(WindowedMerge::interleave_shuffle()),
            MergeStrategy::Tumbling { window, quota } => Some(WindowedMerge::tumbling(window, quota)),
            MergeStrategy::Sliding { window, quota } => Some(WindowedMerge::sliding(window, quota)),
            MergeStrategy::Shuffle { window, quota } => Some(WindowedMerge::shuffled(window, quota)),
            MergeStrategy::Join
            | MergeStrategy::Randomize
            | MergeStrategy::Union
            | MergeStrategy::Intersection
            | MergeStrategy::SymmetricDifference
            | MergeStrategy::Difference
            | MergeStrategy::Overlay => None,
        }
    }

    /// Combines `playlists` into one.
    ///
    /// Randomized strategies draw from `rng`; the others ignore it.
    pub fn apply<T, R>(&self, playlists: Vec<Vec<T>>, rng: &mut R) -> Vec<T>
    where
        T: Clone + Eq + Hash,
        R: Rng + ?Sized,
    {
        match self {
            MergeStrategy::Join => join(&playlists),
            MergeStrategy::Randomize => {
                let mut joined = join(&playlists);
                joined.shuffle(rng);
                joined
            }
            MergeStrategy::Union => set_ops::union_all(&playlists),
            MergeStrategy::Intersection => set_ops::intersection_all(&playlists),
            MergeStrategy::SymmetricDifference => set_ops::symmetric_difference_all(&playlists),
            MergeStrategy::Difference => set_ops::difference_all(&playlists),
            MergeStrategy::Overlay => set_ops::overlay_all(&playlists),
            MergeStrategy::Interleave => WindowedMerge::interleave().merge_with(playlists, rng),
            MergeStrategy::InterleaveShuffle => {
                WindowedMerge::interleave_shuffle().merge_with(playlists, rng)
            }
            MergeStrategy::Tumbling { window, quota } => {
                WindowedMerge::tumbling(*window, *quota).merge_with(playlists, rng)
            }
            MergeStrategy::Sliding { window, quota } => {
                WindowedMerge::sliding(*window, *quota).merge_with(playlists, rng)
            }
            MergeStrategy::Shuffle { window, quota } => {
                WindowedMerge::shuffled(*window, *quota).merge_with(playlists, rng)
            }
        }
    }
}

/// Concatenates playlists after removing tracks already seen earlier.
pub fn join<T: Clone + Eq + Hash>(playlists: &[Vec<T>]) -> Vec<T> {
    deduplicate_across(playlists).into_iter().flatten().collect()
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Join => write!(f, "join"),
            MergeStrategy::Randomize => write!(f, "randomize"),
            MergeStrategy::Interleave => write!(f, "interleave"),
            MergeStrategy::InterleaveShuffle => write!(f, "interleave-shuffle"),
            MergeStrategy::Tumbling { window, quota } => write!(f, "merge:{}x{}", window, quota),
            MergeStrategy::Sliding { window, quota } => write!(f, "slide:{}x{}", window, quota),
            MergeStrategy::Shuffle { window, quota } => write!(f, "shuffle:{}x{}", window, quota),
            MergeStrategy::Union => write!(f, "union"),
            MergeStrategy::Intersection => write!(f, "intersection"),
            MergeStrategy::SymmetricDifference => write!(f, "symmetric-difference"),
            MergeStrategy::Difference => write!(f, "difference"),
            MergeStrategy::Overlay => write!(f, "overlay"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = LastmixError;

    /// Parses a strategy name (case-insensitive, surrounding space ignored).
    ///
    /// The windowed strategies also accept an explicit size, as in
    /// `slide:3x4` for three playlists at a time, four tracks each.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();

        if let Some((base, size)) = name.split_once(':') {
            let (window, quota) = parse_window(size)?;
            return match base {
                "merge" => Ok(MergeStrategy::Tumbling { window, quota }),
                "slide" => Ok(MergeStrategy::Sliding { window, quota }),
                "shuffle" => Ok(MergeStrategy::Shuffle { window, quota }),
                _ => Err(LastmixError::unknown(StrategyKind::Merge, s.trim())),
            };
        }

        let canonical = Self::NAMES
            .iter()
            .find(|(_, aliases)| aliases.contains(&name.as_str()))
            .map(|(canonical, _)| *canonical)
            .ok_or_else(|| LastmixError::unknown(StrategyKind::Merge, s.trim()))?;

        let five = DEFAULT_WINDOW;
        Ok(match canonical {
            "join" => MergeStrategy::Join,
            "randomize" => MergeStrategy::Randomize,
            "interleave" => MergeStrategy::Interleave,
            "interleave-shuffle" => MergeStrategy::InterleaveShuffle,
            "merge" => MergeStrategy::Tumbling { window: five, quota: five },
            "slide" => MergeStrategy::Sliding { window: five, quota: five },
            "shuffle" => MergeStrategy::Shuffle { window: five, quota: five },
            "union" => MergeStrategy::Union,
            "intersection" => MergeStrategy::Intersection,
            "symmetric-difference" => MergeStrategy::SymmetricDifference,
            "difference" => MergeStrategy::Difference,
            _ => MergeStrategy::Overlay,
        })
    }
}

/// Parses `MxN` into `(window, quota)`.
fn parse_window(spec: &str) -> Result<(usize, usize), LastmixError> {
    let invalid = || LastmixError::InvalidWindow(spec.to_string());
    let (m, n) = spec.split_once('x').ok_or_else(invalid)?;
    let window: usize = m.trim().parse().map_err(|_| invalid())?;
    let quota: usize = n.trim().parse().map_err(|_| invalid())?;
    if window == 0 || quota == 0 {
        return Err(invalid());
    }
    Ok((window, quota))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn test_every_alias_parses() {
        for (canonical, aliases) in MergeStrategy::NAMES {
            for alias in *aliases {
                let parsed: MergeStrategy = alias.parse().unwrap();
                let again: MergeStrategy = canonical.parse().unwrap_or(parsed);
                assert_eq!(parsed, again, "alias {} of {}", alias, canonical);
            }
        }
    }

    #[test]
    fn test_windowed_strategies_apply_their_scheduler() {
        let playlists: Vec<Vec<u32>> = (0..7)
            .map(|p| (0..6).map(|i| p * 10 + i).collect())
            .collect();
        let windowed = [
            MergeStrategy::Interleave,
            MergeStrategy::InterleaveShuffle,
            MergeStrategy::Tumbling { window: 3, quota: 2 },
            MergeStrategy::Sliding { window: 3, quota: 2 },
            MergeStrategy::Shuffle { window: 3, quota: 2 },
        ];

        for strategy in windowed {
            let scheduler = strategy.scheduler().unwrap();
            let applied = strategy.apply(playlists.clone(), &mut rng());
            let direct = scheduler.merge_with(playlists.clone(), &mut rng());
            assert_eq!(applied, direct, "{}", strategy);
            assert_eq!(applied.len(), 42, "{}", strategy);
        }
        assert!(MergeStrategy::Union.scheduler().is_none());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" Interleave ".parse::<MergeStrategy>().unwrap(), MergeStrategy::Interleave);
        assert_eq!("SLIDE".parse::<MergeStrategy>().unwrap(), MergeStrategy::slide5x5());
    }

    #[test]
    fn test_parse_window_sizes() {
        assert_eq!(
            "slide:3x4".parse::<MergeStrategy>().unwrap(),
            MergeStrategy::Sliding { window: 3, quota: 4 }
        );
        assert_eq!(
            "merge:2x10".parse::<MergeStrategy>().unwrap(),
            MergeStrategy::Tumbling { window: 2, quota: 10 }
        );
        assert!(matches!(
            "slide:0x4".parse::<MergeStrategy>(),
            Err(LastmixError::InvalidWindow(_))
        ));
        assert!(matches!(
            "slide:big".parse::<MergeStrategy>(),
            Err(LastmixError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "zipper".parse::<MergeStrategy>().unwrap_err();
        assert!(matches!(
            err,
            LastmixError::UnknownStrategy {
                kind: StrategyKind::Merge,
                ..
            }
        ));
        assert!("union:5x5".parse::<MergeStrategy>().is_err());
    }

    #[test]
    fn test_display_round_trips_parameterised_windows() {
        let strategy = MergeStrategy::Shuffle { window: 4, quota: 2 };
        assert_eq!(strategy.to_string().parse::<MergeStrategy>().unwrap(), strategy);
    }

    #[test]
    fn test_join_deduplicates_across_playlists() {
        let merged = MergeStrategy::Join.apply(vec![vec!["f1", "f2"], vec!["f3"]], &mut rng());
        assert_eq!(merged, vec!["f1", "f2", "f3"]);

        let merged = MergeStrategy::Join.apply(vec![vec!["f1", "f2"], vec!["f2", "f3"]], &mut rng());
        assert_eq!(merged, vec!["f1", "f2", "f3"]);
    }

    #[test]
    fn test_randomize_is_a_permutation_of_join() {
        let playlists = vec![vec![1, 2, 3], vec![4, 5], vec![3, 6]];
        let mut merged = MergeStrategy::Randomize.apply(playlists, &mut rng());
        merged.sort();
        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_interleave_dispatches_to_scheduler() {
        let merged = MergeStrategy::Interleave.apply(vec![vec!["a1", "a2"], vec!["b1", "b2"]], &mut rng());
        assert_eq!(merged, vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_set_operators_dispatch() {
        let playlists = vec![vec!["a", "b", "c"], vec!["b", "d"]];
        assert_eq!(MergeStrategy::Union.apply(playlists.clone(), &mut rng()), vec!["a", "b", "c", "d"]);
        assert_eq!(MergeStrategy::Intersection.apply(playlists.clone(), &mut rng()), vec!["b"]);
        assert_eq!(MergeStrategy::Difference.apply(playlists.clone(), &mut rng()), vec!["a", "c"]);
        assert_eq!(
            MergeStrategy::SymmetricDifference.apply(playlists.clone(), &mut rng()),
            vec!["a", "c", "d"]
        );
        assert_eq!(MergeStrategy::Overlay.apply(playlists, &mut rng()), vec!["a", "d", "b", "c"]);
    }
}
