//! Order-preserving sequence utilities.
//!
//! These helpers are shared by the merge scheduler, the set operators and the
//! grouping engine. All of them keep the first occurrence of an element and
//! never reorder what they keep.

use std::collections::HashSet;
use std::hash::Hash;

/// Removes duplicates, keeping the first occurrence of each element.
///
/// The result is the longest subsequence of `items` without repeated
/// elements; relative order is unchanged.
///
/// # Example
///
/// ```
/// use lastmix::sequence::deduplicate;
///
/// assert_eq!(deduplicate(&["a", "b", "a", "c", "b"]), vec!["a", "b", "c"]);
/// ```
pub fn deduplicate<T: Clone + Eq + Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Deduplicates each sequence and then removes elements already kept by an
/// earlier sequence.
///
/// The first sequence keeps all of its (distinct) elements, the second loses
/// whatever the first kept, the third loses whatever the first two kept, and
/// so on. Sequences left empty are dropped from the result.
pub fn deduplicate_across<T: Clone + Eq + Hash>(sequences: &[Vec<T>]) -> Vec<Vec<T>> {
    let mut kept: HashSet<T> = HashSet::new();
    let mut result = Vec::with_capacity(sequences.len());

    for sequence in sequences {
        let remaining: Vec<T> = deduplicate(sequence)
            .into_iter()
            .filter(|item| !kept.contains(item))
            .collect();
        kept.extend(remaining.iter().cloned());
        if !remaining.is_empty() {
            result.push(remaining);
        }
    }

    result
}

/// Finds the lowest run of values that descends by exactly one per step.
///
/// Returns a half-open `(begin, end)` index range. The scan keeps a current
/// run starting at `(0, 1)`. A value one below its predecessor extends the run
/// if the run ends right there, and otherwise restarts it one element to the
/// left. Any other drop restarts the run at the lower value. Rises and equal
/// values leave the run alone.
///
/// The merge scheduler feeds this the served counts of its working set: the
/// selected range covers the sources that are furthest behind, plus the
/// contiguous staircase of sources just ahead of them.
///
/// # Example
///
/// ```
/// use lastmix::sequence::lowest_descending_subrange;
///
/// assert_eq!(lowest_descending_subrange(&[4, 5, 4, 3, 2]), (1, 5));
/// assert_eq!(lowest_descending_subrange(&[4, 5, 0, 0, 0]), (2, 3));
/// ```
pub fn lowest_descending_subrange(counts: &[usize]) -> (usize, usize) {
    if counts.is_empty() {
        return (0, 0);
    }

    let (mut begin, mut end) = (0, 1);
    for (i, pair) in counts.windows(2).enumerate() {
        let (previous, next) = (pair[0], pair[1]);
        let index = i + 1;

        if next + 1 == previous {
            if end == index {
                end = index + 1;
            } else {
                begin = index - 1;
                end = index + 1;
            }
        } else if next < previous {
            begin = index;
            end = index + 1;
        }
    }

    (begin, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplicate_keeps_first_occurrence() {
        let input = vec!["b", "a", "b", "c", "a", "d"];
        assert_eq!(deduplicate(&input), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_deduplicate_empty() {
        let input: Vec<&str> = Vec::new();
        assert!(deduplicate(&input).is_empty());
    }

    #[test]
    fn test_deduplicate_across_removes_earlier_elements() {
        let input = vec![
            vec!["f1", "f2", "f1"],
            vec!["f2", "f3", "f3"],
            vec!["f1", "f3", "f4"],
        ];
        assert_eq!(
            deduplicate_across(&input),
            vec![vec!["f1", "f2"], vec!["f3"], vec!["f4"]]
        );
    }

    #[test]
    fn test_deduplicate_across_drops_empty_sequences() {
        let input = vec![vec!["a", "b"], vec!["b", "a"], vec![], vec!["c"]];
        assert_eq!(deduplicate_across(&input), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_subrange_degenerate() {
        assert_eq!(lowest_descending_subrange(&[]), (0, 0));
        assert_eq!(lowest_descending_subrange(&[1]), (0, 1));
        assert_eq!(lowest_descending_subrange(&[1, 1, 1, 1]), (0, 1));
        assert_eq!(lowest_descending_subrange(&[0, 0, 0, 0, 0]), (0, 1));
    }

    #[test]
    fn test_subrange_staircase() {
        assert_eq!(lowest_descending_subrange(&[1, 1, 0, 0, 0]), (1, 3));
        assert_eq!(lowest_descending_subrange(&[1, 0, 0, 0, 0]), (0, 2));
        assert_eq!(lowest_descending_subrange(&[2, 1, 0, 0, 0]), (0, 3));
        assert_eq!(lowest_descending_subrange(&[3, 2, 1, 0, 0]), (0, 4));
        assert_eq!(lowest_descending_subrange(&[4, 3, 2, 1, 0]), (0, 5));
        assert_eq!(lowest_descending_subrange(&[5, 4, 3, 2, 1]), (0, 5));
    }

    #[test]
    fn test_subrange_after_gap() {
        assert_eq!(lowest_descending_subrange(&[4, 3, 2, 0, 0]), (3, 4));
        assert_eq!(lowest_descending_subrange(&[4, 5, 0, 0, 0]), (2, 3));
        assert_eq!(lowest_descending_subrange(&[4, 5, 1, 0, 0]), (2, 4));
        assert_eq!(lowest_descending_subrange(&[4, 5, 2, 1, 0]), (2, 5));
        assert_eq!(lowest_descending_subrange(&[4, 5, 3, 2, 1]), (2, 5));
        assert_eq!(lowest_descending_subrange(&[4, 5, 4, 3, 2]), (1, 5));
    }

    #[test]
    fn test_subrange_ascending() {
        assert_eq!(lowest_descending_subrange(&[1, 2, 3, 4, 5]), (0, 1));
        assert_eq!(lowest_descending_subrange(&[2, 2, 3, 4, 5]), (0, 1));
        assert_eq!(lowest_descending_subrange(&[3, 2, 3, 4, 5]), (0, 2));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_deduplicate_is_idempotent(items in proptest::collection::vec(0u8..16, 0..64)) {
                let once = deduplicate(&items);
                prop_assert_eq!(deduplicate(&once), once.clone());
            }

            #[test]
            fn test_deduplicate_preserves_first_occurrence_order(
                items in proptest::collection::vec(0u8..16, 0..64)
            ) {
                let result = deduplicate(&items);
                let mut expected = Vec::new();
                for item in &items {
                    if !expected.contains(item) {
                        expected.push(*item);
                    }
                }
                prop_assert_eq!(result, expected);
            }

            #[test]
            fn test_subrange_is_within_bounds(counts in proptest::collection::vec(0usize..8, 1..16)) {
                let (begin, end) = lowest_descending_subrange(&counts);
                prop_assert!(begin < end);
                prop_assert!(end <= counts.len());
                for i in begin + 1..end {
                    prop_assert_eq!(counts[i] + 1, counts[i - 1]);
                }
            }
        }
    }
}
