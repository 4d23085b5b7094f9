//! Ordering tracks inside a group.

use std::fmt;
use std::str::FromStr;

use crate::error::{LastmixError, StrategyKind};
use crate::rating::{Metric, RankProgressCallback, Ranker};
use crate::track::Track;

/// How tracks are ordered before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStrategy {
    /// Keep the input order.
    Identity,
    /// Most played first.
    #[default]
    Playcount,
    /// Most listeners first.
    Listeners,
}

impl OrderStrategy {
    /// Accepted names, grouped by strategy.
    pub const NAMES: &'static [(&'static str, &'static [&'static str])] = &[
        (
            "playcount",
            &["playcount", "plays", "lastfm", "last.fm", "last-fm"],
        ),
        ("listeners", &["listeners", "listens"]),
        ("identity", &["identity", "id", "none"]),
    ];

    /// The statistic this order ranks by, if any.
    pub fn metric(&self) -> Option<Metric> {
        match self {
            OrderStrategy::Identity => None,
            OrderStrategy::Playcount => Some(Metric::Playcount),
            OrderStrategy::Listeners => Some(Metric::Listeners),
        }
    }

    /// True if applying this order needs rating lookups.
    pub fn needs_ratings(&self) -> bool {
        self.metric().is_some()
    }

    /// Orders the tracks of each group.
    ///
    /// `ranker` must rank by [`metric`](Self::metric); it is not consulted
    /// for [`OrderStrategy::Identity`]. Group boundaries and group order are
    /// kept.
    pub fn apply(
        &self,
        groups: Vec<Vec<Track>>,
        ranker: Option<&Ranker<'_>>,
        on_progress: Option<&RankProgressCallback>,
    ) -> Vec<Vec<Track>> {
        match (self, ranker) {
            (OrderStrategy::Identity, _) | (_, None) => groups,
            (_, Some(ranker)) => ranker.rank_groups(&groups, on_progress),
        }
    }
}

impl fmt::Display for OrderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStrategy::Identity => "identity",
            OrderStrategy::Playcount => "playcount",
            OrderStrategy::Listeners => "listeners",
        };
        f.write_str(name)
    }
}

impl FromStr for OrderStrategy {
    type Err = LastmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let canonical = Self::NAMES
            .iter()
            .find(|(_, aliases)| aliases.contains(&name.as_str()))
            .map(|(canonical, _)| *canonical)
            .ok_or_else(|| LastmixError::unknown(StrategyKind::Order, s.trim()))?;

        Ok(match canonical {
            "playcount" => OrderStrategy::Playcount,
            "listeners" => OrderStrategy::Listeners,
            _ => OrderStrategy::Identity,
        })
    }
}
