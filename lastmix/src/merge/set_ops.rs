//! Order-preserving set operators over playlists.
//!
//! Each binary operator works on deduplicated copies of its inputs and keeps
//! the relative order of both sides. The `*_all` variants fold an operator
//! left-to-right over any number of playlists, e.g.
//! `union_all([a, b, c]) == union(union(a, b), c)`.
//!
//! Union and symmetric difference share one walk over both sequences:
//!
//! - the left head is emitted while it does not occur on the right;
//! - otherwise the right head is emitted while it does not occur on the left;
//! - otherwise the left head is common to both: it is emitted once (union) or
//!   dropped (symmetric difference), and removed from the right copy.
//!
//! Whatever remains of either side once the other runs out is appended.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use crate::sequence::deduplicate;

/// Next step of a two-sided walk.
enum Step {
    Left,
    Right,
    Common,
}

/// Interleaved union of two playlists.
///
/// # Example
///
/// ```
/// use lastmix::merge::union;
///
/// let merged = union(&["a", "b", "c", "d"], &["x", "b", "y", "d"]);
/// assert_eq!(merged, vec!["a", "x", "b", "c", "y", "d"]);
/// ```
pub fn union<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> Vec<T> {
    walk_both(left, right, true)
}

/// Interleaved symmetric difference of two playlists.
pub fn symmetric_difference<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> Vec<T> {
    walk_both(left, right, false)
}

/// Elements of `left` that also occur in `right`, in `left`'s order.
pub fn intersection<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> Vec<T> {
    let in_right: HashSet<&T> = right.iter().collect();
    deduplicate(left)
        .into_iter()
        .filter(|item| in_right.contains(item))
        .collect()
}

/// Elements of `left` that do not occur in `right`, in `left`'s order.
pub fn difference<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> Vec<T> {
    let in_right: HashSet<&T> = right.iter().collect();
    deduplicate(left)
        .into_iter()
        .filter(|item| !in_right.contains(item))
        .collect()
}

/// Overlays the unique elements of `right` onto `left`.
///
/// Right-only elements are emitted as they come up. A right element that also
/// occurs on the left is skipped and the next left element is emitted in its
/// place, so common positions always resolve to the left's content.
///
/// ```
/// use lastmix::merge::overlay;
///
/// let merged = overlay(&["a", "c", "e"], &["x", "a", "y", "b", "z"]);
/// assert_eq!(merged, vec!["x", "a", "y", "b", "z", "c", "e"]);
/// ```
pub fn overlay<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> Vec<T> {
    let in_left: HashSet<&T> = left.iter().collect();
    let mut xs: VecDeque<T> = deduplicate(left).into();
    let mut ys: VecDeque<T> = deduplicate(right).into();
    let mut result = Vec::with_capacity(xs.len() + ys.len());

    while !xs.is_empty() {
        let Some(y) = ys.pop_front() else {
            break;
        };
        if in_left.contains(&y) {
            result.extend(xs.pop_front());
        } else {
            result.push(y);
        }
    }

    result.extend(xs);
    result.extend(ys);
    result
}

/// Left fold of [`union`] with the empty playlist as identity.
pub fn union_all<T: Clone + Eq + Hash>(playlists: &[Vec<T>]) -> Vec<T> {
    fold_from_empty(playlists, union)
}

/// Left fold of [`symmetric_difference`] with the empty playlist as identity.
pub fn symmetric_difference_all<T: Clone + Eq + Hash>(playlists: &[Vec<T>]) -> Vec<T> {
    fold_from_empty(playlists, symmetric_difference)
}

/// Left fold of [`overlay`] with the empty playlist as identity.
pub fn overlay_all<T: Clone + Eq + Hash>(playlists: &[Vec<T>]) -> Vec<T> {
    fold_from_empty(playlists, overlay)
}

/// Left fold of [`intersection`] seeded with the first playlist.
///
/// Returns an empty playlist when there is nothing to intersect.
pub fn intersection_all<T: Clone + Eq + Hash>(playlists: &[Vec<T>]) -> Vec<T> {
    fold_from_first(playlists, intersection)
}

/// Left fold of [`difference`] seeded with the first playlist.
pub fn difference_all<T: Clone + Eq + Hash>(playlists: &[Vec<T>]) -> Vec<T> {
    fold_from_first(playlists, difference)
}

fn fold_from_empty<T, F>(playlists: &[Vec<T>], op: F) -> Vec<T>
where
    T: Clone + Eq + Hash,
    F: Fn(&[T], &[T]) -> Vec<T>,
{
    playlists
        .iter()
        .fold(Vec::new(), |acc, playlist| op(&acc, playlist))
}

fn fold_from_first<T, F>(playlists: &[Vec<T>], op: F) -> Vec<T>
where
    T: Clone + Eq + Hash,
    F: Fn(&[T], &[T]) -> Vec<T>,
{
    let Some((first, rest)) = playlists.split_first() else {
        return Vec::new();
    };
    rest.iter()
        .fold(deduplicate(first), |acc, playlist| op(&acc, playlist))
}

fn walk_both<T: Clone + Eq + Hash>(left: &[T], right: &[T], keep_common: bool) -> Vec<T> {
    let in_left: HashSet<&T> = left.iter().collect();
    let in_right: HashSet<&T> = right.iter().collect();
    let mut xs: VecDeque<T> = deduplicate(left).into();
    let mut ys: VecDeque<T> = deduplicate(right).into();
    let mut result = Vec::with_capacity(xs.len() + ys.len());

    loop {
        let step = match (xs.front(), ys.front()) {
            (Some(x), Some(y)) => {
                if !in_right.contains(x) {
                    Step::Left
                } else if !in_left.contains(y) {
                    Step::Right
                } else {
                    Step::Common
                }
            }
            _ => break,
        };

        match step {
            Step::Left => result.extend(xs.pop_front()),
            Step::Right => result.extend(ys.pop_front()),
            Step::Common => {
                if let Some(x) = xs.pop_front() {
                    ys.retain(|y| *y != x);
                    if keep_common {
                        result.push(x);
                    }
                }
            }
        }
    }

    result.extend(xs);
    result.extend(ys);
    result
}
