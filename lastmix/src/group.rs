//! Grouping playlists into sub-playlists.
//!
//! The grouping engine splits a playlist into groups that share a key,
//! keeping groups in the order their key first appears and tracks in their
//! original order inside each group. Group strategies decide where the key
//! comes from (artist tag, folder name) and are applied to each input
//! playlist separately; the resulting groups are the sources a merge
//! interleaves.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use tracing::debug;

use crate::error::{LastmixError, StrategyKind};
use crate::metadata::TagReader;
use crate::sequence::{deduplicate, deduplicate_across};
use crate::track::Track;

/// A key and the tracks that share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K, T> {
    pub key: K,
    pub items: Vec<T>,
}

impl<K, T> Group<K, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Partitions `items` by `key_fn`.
///
/// The input is deduplicated first. Groups appear in order of their key's
/// first occurrence, and each group keeps the relative order of its tracks.
///
/// # Example
///
/// ```
/// use lastmix::group::group_by;
///
/// let groups = group_by(&["a/1", "b/1", "a/2", "a/1"], |t| t[..1].to_string());
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].items, vec!["a/1", "a/2"]);
/// ```
pub fn group_by<T, K, F>(items: &[T], mut key_fn: F) -> Vec<Group<K, T>>
where
    T: Clone + Eq + Hash,
    K: Clone + Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<K, T>> = Vec::new();

    for item in deduplicate(items) {
        let key = key_fn(&item);
        match index.get(&key) {
            Some(&i) => groups[i].items.push(item),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    items: vec![item],
                });
            }
        }
    }

    groups
}

/// Puts every (distinct) track into one group with a unit key.
pub fn group_single<T: Clone + Eq + Hash>(items: &[T]) -> Vec<Group<(), T>> {
    group_by(items, |_| ())
}

/// The folder-name key used by [`GroupStrategy::Prefix`].
///
/// Returns the path segment that immediately follows the longest common
/// string prefix of `tracks`, or an empty string when there is none.
pub fn prefix_key(common: &str, track: &str) -> String {
    track
        .strip_prefix(common)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default()
        .to_string()
}

/// Longest common string prefix of all tracks.
///
/// Identifiers that are not valid UTF-8 are compared in their lossy form.
pub fn common_prefix(tracks: &[Track]) -> String {
    let Some((first, rest)) = tracks.split_first() else {
        return String::new();
    };

    let first = first.to_string_lossy();
    let mut len = first.len();
    for track in rest {
        len = first
            .char_indices()
            .zip(track.to_string_lossy().chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(len);
    }

    first[..len].to_string()
}

/// How each playlist is split before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupStrategy {
    /// Keep playlists as they are, minus tracks seen in an earlier playlist.
    #[default]
    None,
    /// One group per artist tag.
    Artist,
    /// One group per folder below the playlist's common path prefix.
    Prefix,
}

impl GroupStrategy {
    /// Accepted names, grouped by strategy.
    pub const NAMES: &'static [(&'static str, &'static [&'static str])] = &[
        ("none", &["none"]),
        ("artist", &["artist"]),
        ("prefix", &["prefix", "folder", "directory", "dir"]),
    ];

    /// Splits each playlist into groups and concatenates the results.
    pub fn apply(&self, playlists: &[Vec<Track>], tags: &dyn TagReader) -> Vec<Vec<Track>> {
        let groups: Vec<Vec<Track>> = match self {
            GroupStrategy::None => deduplicate_across(playlists),
            GroupStrategy::Artist => playlists
                .iter()
                .flat_map(|playlist| {
                    group_by(playlist, |track| tags.read(track).artist)
                        .into_iter()
                        .map(|g| g.items)
                })
                .collect(),
            GroupStrategy::Prefix => playlists
                .iter()
                .flat_map(|playlist| {
                    let common = common_prefix(playlist);
                    group_by(playlist, |track| prefix_key(&common, &track.to_string_lossy()))
                        .into_iter()
                        .map(|g| g.items)
                })
                .collect(),
        };

        debug!(
            strategy = %self,
            playlists = playlists.len(),
            groups = groups.len(),
            "Grouped playlists"
        );
        groups
    }
}

impl fmt::Display for GroupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupStrategy::None => "none",
            GroupStrategy::Artist => "artist",
            GroupStrategy::Prefix => "prefix",
        };
        f.write_str(name)
    }
}

impl FromStr for GroupStrategy {
    type Err = LastmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let canonical = Self::NAMES
            .iter()
            .find(|(_, aliases)| aliases.contains(&name.as_str()))
            .map(|(canonical, _)| *canonical)
            .ok_or_else(|| LastmixError::unknown(StrategyKind::Group, s.trim()))?;

        Ok(match canonical {
            "artist" => GroupStrategy::Artist,
            "prefix" => GroupStrategy::Prefix,
            _ => GroupStrategy::None,
        })
    }
}
