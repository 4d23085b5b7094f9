//! Putting it together: load, group, order, merge, write.
//!
//! [`StrategyChoice`] records what the user asked for and resolves it into
//! concrete strategies with the tool's defaulting rules. [`PipelineConfig`]
//! is the immutable configuration of one run and [`Pipeline`] executes it.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use tracing::info;

use crate::error::{LastmixError, Result, StrategyKind};
use crate::group::GroupStrategy;
use crate::merge::MergeStrategy;
use crate::metadata::{LoftyTagReader, TagReader};
use crate::order::OrderStrategy;
use crate::playlist;
use crate::rating::{
    AttemptPolicy, LastFmApi, LastFmPage, PacingPolicy, RankProgressCallback, Ranker,
    RatingGateway, RatingSource, ReqwestClient,
};
use crate::track::Track;

/// Named combinations of group, order and merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Artist groups, sliding 5x5 merge.
    Norm,
    /// Folder groups, sliding 5x5 merge.
    NormPrefix,
    /// Like [`Preset::Norm`], ordered by play count.
    Normalize,
    /// Like [`Preset::NormPrefix`], ordered by play count.
    NormalizePrefix,
}

impl Preset {
    /// Accepted names, grouped by preset.
    pub const NAMES: &'static [(&'static str, &'static [&'static str])] = &[
        ("norm", &["norm"]),
        ("norm-prefix", &["norm-prefix", "normprefix"]),
        ("normalize", &["normalize"]),
        ("normalize-prefix", &["normalize-prefix", "normalizeprefix"]),
    ];

    /// The choices this preset stands for.
    pub fn choice(&self) -> StrategyChoice {
        let (group, order) = match self {
            Preset::Norm => (GroupStrategy::Artist, OrderStrategy::Identity),
            Preset::NormPrefix => (GroupStrategy::Prefix, OrderStrategy::Identity),
            Preset::Normalize => (GroupStrategy::Artist, OrderStrategy::Playcount),
            Preset::NormalizePrefix => (GroupStrategy::Prefix, OrderStrategy::Playcount),
        };
        StrategyChoice {
            merge: Some(MergeStrategy::slide5x5()),
            group: Some(group),
            order: Some(order),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Norm => "norm",
            Preset::NormPrefix => "norm-prefix",
            Preset::Normalize => "normalize",
            Preset::NormalizePrefix => "normalize-prefix",
        };
        f.write_str(name)
    }
}

impl FromStr for Preset {
    type Err = LastmixError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        let canonical = Self::NAMES
            .iter()
            .find(|(_, aliases)| aliases.contains(&name.as_str()))
            .map(|(canonical, _)| *canonical)
            .ok_or_else(|| LastmixError::unknown(StrategyKind::Preset, s.trim()))?;

        Ok(match canonical {
            "norm" => Preset::Norm,
            "norm-prefix" => Preset::NormPrefix,
            "normalize" => Preset::Normalize,
            _ => Preset::NormalizePrefix,
        })
    }
}

/// Explicitly chosen strategies; `None` means "not chosen".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyChoice {
    pub merge: Option<MergeStrategy>,
    pub group: Option<GroupStrategy>,
    pub order: Option<OrderStrategy>,
}

impl StrategyChoice {
    /// Parses optional strategy names. Unknown names fail here, before any
    /// playlist is read.
    pub fn parse(merge: Option<&str>, group: Option<&str>, order: Option<&str>) -> Result<Self> {
        Ok(Self {
            merge: merge.map(str::parse).transpose()?,
            group: group.map(str::parse).transpose()?,
            order: order.map(str::parse).transpose()?,
        })
    }

    /// Fills unset choices from `fallback`.
    pub fn or(self, fallback: StrategyChoice) -> Self {
        Self {
            merge: self.merge.or(fallback.merge),
            group: self.group.or(fallback.group),
            order: self.order.or(fallback.order),
        }
    }

    /// Applies the defaulting rules.
    ///
    /// - nothing chosen: join, no grouping, play count order;
    /// - a merge but no group: group by artist;
    /// - a group but no merge: sliding 5x5 merge;
    /// - an order without both merge and group: the missing ones become
    ///   sliding 5x5 merge and folder grouping.
    ///
    /// Explicit choices are never replaced.
    pub fn resolve(&self) -> (MergeStrategy, GroupStrategy, OrderStrategy) {
        let order = self.order.unwrap_or_default();
        let (merge, group) = match (self.merge, self.group) {
            (Some(merge), Some(group)) => (merge, group),
            (Some(merge), None) if self.order.is_some() => (merge, GroupStrategy::Prefix),
            (Some(merge), None) => (merge, GroupStrategy::Artist),
            (None, Some(group)) => (MergeStrategy::slide5x5(), group),
            (None, None) if self.order.is_some() => {
                (MergeStrategy::slide5x5(), GroupStrategy::Prefix)
            }
            (None, None) => (MergeStrategy::default(), GroupStrategy::default()),
        };
        (merge, group, order)
    }
}

/// Immutable configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub merge: MergeStrategy,
    pub group: GroupStrategy,
    pub order: OrderStrategy,
    /// Last.fm API key; without one the public track pages are scraped.
    pub api_key: Option<String>,
    pub attempts: AttemptPolicy,
    pub pacing: PacingPolicy,
    /// Also write the result here.
    pub output: Option<PathBuf>,
    /// Write entries relative to this directory.
    pub base_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_choice(StrategyChoice::default())
    }
}

impl PipelineConfig {
    /// Configuration for the resolved `choice` with default lookup settings.
    pub fn from_choice(choice: StrategyChoice) -> Self {
        let (merge, group, order) = choice.resolve();
        Self {
            merge,
            group,
            order,
            api_key: None,
            attempts: AttemptPolicy::default(),
            pacing: PacingPolicy::default(),
            output: None,
            base_dir: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_attempts(mut self, attempts: AttemptPolicy) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }
}

/// Executes a [`PipelineConfig`].
pub struct Pipeline {
    config: PipelineConfig,
    tags: Arc<dyn TagReader>,
    source: Option<Arc<dyn RatingSource>>,
    on_progress: Option<RankProgressCallback>,
}

impl Pipeline {
    /// Builds a pipeline with file tags and Last.fm lookups.
    ///
    /// The HTTP client is only created if the order needs ratings.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let source = if config.order.needs_ratings() {
            Some(default_source(&config)?)
        } else {
            None
        };

        Ok(Self {
            config,
            tags: Arc::new(LoftyTagReader::new()),
            source,
            on_progress: None,
        })
    }

    pub fn with_tag_reader(mut self, tags: Arc<dyn TagReader>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_rating_source(mut self, source: Arc<dyn RatingSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Reports each rated track, e.g. to drive a progress bar.
    pub fn with_progress(mut self, on_progress: RankProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Loads every playlist.
    pub fn load<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<Vec<Track>>> {
        paths.iter().map(|p| playlist::load(p.as_ref())).collect()
    }

    /// Groups, orders and merges loaded playlists.
    pub fn arrange<R: Rng + ?Sized>(&self, playlists: Vec<Vec<Track>>, rng: &mut R) -> Vec<Track> {
        let config = &self.config;
        info!(
            merge = %config.merge,
            group = %config.group,
            order = %config.order,
            playlists = playlists.len(),
            "Arranging playlists"
        );

        let groups = config.group.apply(&playlists, self.tags.as_ref());

        let gateway = match (config.order.metric(), &self.source) {
            (Some(metric), Some(source)) => Some(
                RatingGateway::new(Arc::clone(source), Arc::clone(&self.tags))
                    .with_policy(config.attempts)
                    .with_metric(metric),
            ),
            _ => None,
        };
        let ranker = gateway
            .as_ref()
            .map(|gateway| Ranker::new(gateway).with_pacing(config.pacing));
        let ordered = config
            .order
            .apply(groups, ranker.as_ref(), self.on_progress.as_ref());

        let merged = config.merge.apply(ordered, rng);
        info!(tracks = merged.len(), "Arranged playlist");
        merged
    }

    /// Writes the result to `out` and to the configured output file.
    pub fn write<W: Write>(&self, tracks: &[Track], out: &mut W) -> Result<()> {
        playlist::write(
            tracks,
            out,
            self.config.output.as_deref(),
            self.config.base_dir.as_deref(),
        )
    }

    /// Loads, arranges and writes; returns the written playlist.
    pub fn run<P, W, R>(&self, paths: &[P], out: &mut W, rng: &mut R) -> Result<Vec<Track>>
    where
        P: AsRef<Path>,
        W: Write,
        R: Rng + ?Sized,
    {
        let playlists = self.load(paths)?;
        let result = self.arrange(playlists, rng);
        self.write(&result, out)?;
        Ok(result)
    }
}

fn default_source(config: &PipelineConfig) -> Result<Arc<dyn RatingSource>> {
    let client = ReqwestClient::with_timeout(config.attempts.deadline)
        .map_err(LastmixError::RatingSetup)?;

    Ok(match &config.api_key {
        Some(key) => Arc::new(LastFmApi::new(client, key.clone())),
        None => Arc::new(LastFmPage::new(client)),
    })
}
