//! Rating tracks and ordering them by popularity.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::cache::{RatingCache, RatingQuery};
use super::source::{Metric, RatingSource};
use super::worker::{AttemptPolicy, BoundedFetcher};
use crate::metadata::TagReader;
use crate::track::Track;

/// Default number of tracks between pauses.
pub const DEFAULT_PACE_EVERY: usize = 100;

/// Default length of a pause (10 seconds).
pub const DEFAULT_PACE_SECS: u64 = 10;

/// Pause schedule that keeps the request rate under Last.fm's limit of five
/// requests per second averaged over five minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Pause after this many tracks. Zero disables pacing.
    pub every: usize,
    pub pause: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            every: DEFAULT_PACE_EVERY,
            pause: Duration::from_secs(DEFAULT_PACE_SECS),
        }
    }
}

impl PacingPolicy {
    pub fn new(every: usize, pause: Duration) -> Self {
        Self { every, pause }
    }

    /// Never pause.
    pub fn disabled() -> Self {
        Self {
            every: 0,
            pause: Duration::ZERO,
        }
    }

    /// True if a pause is due after the `processed`-th track.
    pub fn is_due(&self, processed: usize) -> bool {
        self.every > 0 && !self.pause.is_zero() && processed % self.every == 0
    }
}

/// A looked-up track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub artist: String,
    pub title: String,
    /// `None` when the rating is unknown.
    pub value: Option<u64>,
}

impl Rating {
    /// The value used for ordering: unknown counts as 0.
    pub fn score(&self) -> u64 {
        self.value.unwrap_or(0)
    }
}

/// Looks up track ratings through tags, a cache and a bounded fetcher.
///
/// One gateway lives for one run; its cache is dropped with it.
pub struct RatingGateway {
    tags: Arc<dyn TagReader>,
    fetcher: BoundedFetcher,
    cache: RatingCache,
    metric: Metric,
}

impl RatingGateway {
    pub fn new(source: Arc<dyn RatingSource>, tags: Arc<dyn TagReader>) -> Self {
        Self {
            tags,
            fetcher: BoundedFetcher::new(source, AttemptPolicy::default()),
            cache: RatingCache::new(),
            metric: Metric::default(),
        }
    }

    pub fn with_policy(mut self, policy: AttemptPolicy) -> Self {
        self.fetcher = BoundedFetcher::new(self.fetcher.source(), policy);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of distinct queries looked up so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Looks up `track`, keeping track of what was asked.
    pub fn lookup(&self, track: &Track) -> Rating {
        let metadata = self.tags.read(track);
        if !metadata.is_identifiable() {
            debug!(track = %track, "No artist or title, rating unknown");
            return Rating {
                artist: metadata.artist,
                title: metadata.title,
                value: None,
            };
        }

        let query = RatingQuery::new(&metadata.artist, &metadata.title, self.metric);
        let value = self.cache.get_or_fetch(&query, || match self.fetcher.fetch(&query) {
            Ok(count) => Some(count),
            Err(e) => {
                debug!(track = %track, error = %e, "Rating lookup failed");
                None
            }
        });

        Rating {
            artist: metadata.artist,
            title: metadata.title,
            value,
        }
    }

    /// The track's rating, 0 when unknown.
    pub fn rate(&self, track: &Track) -> u64 {
        self.lookup(track).score()
    }
}

/// Progress of a ranking run, reported once per track.
#[derive(Debug, Clone, Copy)]
pub struct RankProgress<'a> {
    /// 1-based position of the track in the input.
    pub position: usize,
    pub total: usize,
    pub track: &'a Track,
    pub rating: &'a Rating,
}

impl fmt::Display for RankProgress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total.to_string().len();
        write!(
            f,
            "#{:0width$}/{}:\t{}\t{} - {}",
            self.position,
            self.total,
            self.rating.score(),
            self.rating.artist,
            self.rating.title,
            width = width
        )
    }
}

/// Callback invoked after each track is rated.
pub type RankProgressCallback = Box<dyn Fn(&RankProgress<'_>) + Send + Sync>;

/// Orders tracks by descending rating.
///
/// Pacing counts every track the ranker has processed, across calls.
pub struct Ranker<'g> {
    gateway: &'g RatingGateway,
    pacing: PacingPolicy,
    processed: AtomicUsize,
    pauses: AtomicUsize,
}

impl<'g> Ranker<'g> {
    pub fn new(gateway: &'g RatingGateway) -> Self {
        Self {
            gateway,
            pacing: PacingPolicy::default(),
            processed: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
        }
    }

    /// Pauses taken so far.
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::Relaxed)
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Rates every track and sorts by descending rating.
    ///
    /// The sort is stable: tracks with equal ratings (including all the
    /// unknown ones) keep their input order. No track is ever dropped.
    pub fn rank(&self, tracks: &[Track], on_progress: Option<&RankProgressCallback>) -> Vec<Track> {
        self.rank_groups(&[tracks.to_vec()], on_progress)
            .pop()
            .unwrap_or_default()
    }

    /// Ranks each group on its own.
    ///
    /// Progress positions and pacing run across all groups, so a caller sees
    /// one run of `1..=total` however the tracks are grouped.
    pub fn rank_groups(
        &self,
        groups: &[Vec<Track>],
        on_progress: Option<&RankProgressCallback>,
    ) -> Vec<Vec<Track>> {
        let total: usize = groups.iter().map(Vec::len).sum();
        let mut position = 0;

        groups
            .iter()
            .map(|group| {
                let mut rated: Vec<(Track, u64)> = Vec::with_capacity(group.len());
                for track in group {
                    position += 1;
                    let rating = self.gateway.lookup(track);
                    let progress = RankProgress {
                        position,
                        total,
                        track,
                        rating: &rating,
                    };
                    info!("{}", progress);
                    if let Some(cb) = on_progress {
                        cb(&progress);
                    }
                    rated.push((track.clone(), rating.score()));
                    self.pace();
                }

                rated.sort_by(|a, b| b.1.cmp(&a.1));
                rated.into_iter().map(|(track, _)| track).collect()
            })
            .collect()
    }

    fn pace(&self) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.pacing.is_due(processed) {
            debug!(
                processed,
                pause_ms = self.pacing.pause.as_millis() as u64,
                "Pacing lookups"
            );
            self.pauses.fetch_add(1, Ordering::Relaxed);
            thread::sleep(self.pacing.pause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{StaticTagReader, TrackMetadata};
    use crate::rating::error::LookupError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Instant;

    /// Answers from a table and counts calls.
    struct TableSource {
        counts: HashMap<(&'static str, &'static str), u64>,
        calls: AtomicUsize,
    }

    impl TableSource {
        fn new(entries: &[(&'static str, &'static str, u64)]) -> Self {
            Self {
                counts: entries.iter().map(|&(a, t, c)| ((a, t), c)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RatingSource for TableSource {
        fn fetch(&self, artist: &str, title: &str, _: Metric) -> Result<u64, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.counts
                .iter()
                .find(|((a, t), _)| *a == artist && *t == title)
                .map(|(_, c)| *c)
                .ok_or(LookupError::MissingField("playcount"))
        }
    }

    /// Never answers within any reasonable deadline.
    struct HangingSource;

    impl RatingSource for HangingSource {
        fn fetch(&self, _: &str, _: &str, _: Metric) -> Result<u64, LookupError> {
            thread::sleep(Duration::from_secs(60));
            Ok(1)
        }
    }

    fn tags() -> Arc<StaticTagReader> {
        Arc::new(
            StaticTagReader::new()
                .with("a.mp3", TrackMetadata::new("A", "Alpha"))
                .with("b.mp3", TrackMetadata::new("B", "Beta"))
                .with("b-copy.mp3", TrackMetadata::new("B", "Beta"))
                .with("c.mp3", TrackMetadata::new("C", "Gamma")),
        )
    }

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| Track::from(*id)).collect()
    }

    #[test]
    fn test_rank_sorts_descending_and_stable() {
        let source = Arc::new(TableSource::new(&[("A", "Alpha", 5), ("B", "Beta", 50)]));
        let gateway = RatingGateway::new(source, tags());
        let ranker = Ranker::new(&gateway).with_pacing(PacingPolicy::disabled());

        let ranked = ranker.rank(&tracks(&["c.mp3", "a.mp3", "untagged.mp3", "b.mp3"]), None);
        assert_eq!(ranked, tracks(&["b.mp3", "a.mp3", "c.mp3", "untagged.mp3"]));
    }

    #[test]
    fn test_identical_artist_and_title_fetched_once() {
        let source = Arc::new(TableSource::new(&[("B", "Beta", 50)]));
        let gateway = RatingGateway::new(source.clone(), tags());

        assert_eq!(gateway.rate(&Track::from("b.mp3")), 50);
        assert_eq!(gateway.rate(&Track::from("b-copy.mp3")), 50);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.cached(), 1);
    }

    #[test]
    fn test_untagged_track_is_not_looked_up() {
        let source = Arc::new(TableSource::new(&[]));
        let gateway = RatingGateway::new(source.clone(), tags());

        let rating = gateway.lookup(&Track::from("untagged.mp3"));
        assert_eq!(rating.value, None);
        assert_eq!(rating.score(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hanging_source_degrades_to_zero() {
        let gateway = RatingGateway::new(Arc::new(HangingSource), tags())
            .with_policy(AttemptPolicy::new(Duration::from_millis(10), 2));
        let ranker = Ranker::new(&gateway).with_pacing(PacingPolicy::disabled());

        let input = tracks(&["a.mp3", "b.mp3"]);
        assert_eq!(ranker.rank(&input, None), input);
        assert_eq!(gateway.rate(&Track::from("a.mp3")), 0);
    }

    #[test]
    fn test_progress_reports_every_track() {
        let source = Arc::new(TableSource::new(&[("A", "Alpha", 7)]));
        let gateway = RatingGateway::new(source, tags());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: RankProgressCallback =
            Box::new(move |p: &RankProgress<'_>| sink.lock().push(p.to_string()));

        Ranker::new(&gateway)
            .with_pacing(PacingPolicy::disabled())
            .rank(&tracks(&["a.mp3", "c.mp3"]), Some(&callback));

        assert_eq!(
            *seen.lock(),
            vec!["#1/2:\t7\tA - Alpha".to_string(), "#2/2:\t0\tC - Gamma".to_string()]
        );
    }

    #[test]
    fn test_rank_groups_counts_across_groups() {
        let source = Arc::new(TableSource::new(&[("A", "Alpha", 1), ("C", "Gamma", 9)]));
        let gateway = RatingGateway::new(source, tags());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: RankProgressCallback =
            Box::new(move |p: &RankProgress<'_>| sink.lock().push((p.position, p.total)));

        let ranked = Ranker::new(&gateway)
            .with_pacing(PacingPolicy::disabled())
            .rank_groups(
                &[tracks(&["a.mp3", "c.mp3"]), tracks(&["b.mp3"])],
                Some(&callback),
            );

        assert_eq!(ranked, vec![tracks(&["c.mp3", "a.mp3"]), tracks(&["b.mp3"])]);
        assert_eq!(*seen.lock(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_progress_pads_position() {
        let track = Track::from("x.mp3");
        let rating = Rating {
            artist: "X".into(),
            title: "Y".into(),
            value: Some(3),
        };
        let progress = RankProgress {
            position: 7,
            total: 120,
            track: &track,
            rating: &rating,
        };
        assert_eq!(progress.to_string(), "#007/120:\t3\tX - Y");
    }

    #[test]
    fn test_rank_pauses_after_every_n_tracks() {
        let gateway = RatingGateway::new(Arc::new(TableSource::new(&[])), tags());
        let ranker = Ranker::new(&gateway)
            .with_pacing(PacingPolicy::new(2, Duration::from_millis(50)));

        let start = Instant::now();
        ranker.rank(&tracks(&["a.mp3", "b.mp3", "c.mp3", "x.mp3", "y.mp3"]), None);

        assert_eq!(ranker.pauses(), 2);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_pacing_counts_across_calls() {
        let gateway = RatingGateway::new(Arc::new(TableSource::new(&[])), tags());
        let ranker = Ranker::new(&gateway)
            .with_pacing(PacingPolicy::new(2, Duration::from_millis(20)));

        ranker.rank(&tracks(&["a.mp3", "b.mp3"]), None);
        assert_eq!(ranker.pauses(), 1);
        ranker.rank(&tracks(&["c.mp3"]), None);
        assert_eq!(ranker.pauses(), 1);
        ranker.rank(&tracks(&["x.mp3"]), None);
        assert_eq!(ranker.pauses(), 2);
    }

    #[test]
    fn test_disabled_pacing_never_pauses() {
        let gateway = RatingGateway::new(Arc::new(TableSource::new(&[])), tags());
        let ranker = Ranker::new(&gateway).with_pacing(PacingPolicy::disabled());

        ranker.rank(&tracks(&["a.mp3", "b.mp3", "c.mp3"]), None);
        assert_eq!(ranker.pauses(), 0);
    }

    #[test]
    fn test_pacing_schedule() {
        let pacing = PacingPolicy::default();
        assert!(!pacing.is_due(99));
        assert!(pacing.is_due(100));
        assert!(pacing.is_due(200));
        assert!(!PacingPolicy::disabled().is_due(100));
    }
}
