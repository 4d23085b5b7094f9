//! Integration tests for rating lookups and ranking.
//!
//! A scripted HTTP client stands in for Last.fm so the whole stack (source,
//! bounded fetcher, cache, ranker) runs without network access.
//!
//! Run with: `cargo test --test rating_lookup`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lastmix::metadata::{StaticTagReader, TrackMetadata};
use lastmix::rating::{
    AttemptPolicy, HttpClient, LastFmApi, LastFmPage, LookupError, Metric, PacingPolicy, Ranker,
    RatingGateway,
};
use lastmix::Track;

// ============================================================================
// Helper Functions
// ============================================================================

/// Answers by URL substring, counting requests. Unknown URLs hang.
struct ScriptedClient {
    answers: HashMap<&'static str, String>,
    hang: Duration,
    requests: AtomicUsize,
}

impl ScriptedClient {
    fn new(answers: &[(&'static str, String)]) -> Self {
        Self {
            answers: answers.iter().cloned().collect(),
            hang: Duration::from_secs(60),
            requests: AtomicUsize::new(0),
        }
    }
}

impl HttpClient for ScriptedClient {
    fn get(&self, url: &str) -> Result<String, LookupError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.answers.iter().find(|(needle, _)| url.contains(*needle)) {
            Some((_, body)) => Ok(body.clone()),
            None => {
                thread::sleep(self.hang);
                Err(LookupError::Transport("hung up".to_string()))
            }
        }
    }
}

fn track_info(playcount: u64, listeners: u64) -> String {
    format!(
        "<lfm status=\"ok\"><track><listeners>{}</listeners>\
         <playcount>{}</playcount></track></lfm>",
        listeners, playcount
    )
}

fn tags() -> Arc<StaticTagReader> {
    Arc::new(
        StaticTagReader::new()
            .with("one.mp3", TrackMetadata::new("Band", "One"))
            .with("two.mp3", TrackMetadata::new("Band", "Two"))
            .with("two-live.mp3", TrackMetadata::new("Band", "Two"))
            .with("slow.mp3", TrackMetadata::new("Band", "Slow")),
    )
}

fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| Track::from(*id)).collect()
}

fn fast_policy() -> AttemptPolicy {
    AttemptPolicy::new(Duration::from_millis(25), 2)
}

// ============================================================================
// Web Service
// ============================================================================

#[test]
fn test_ranks_by_playcount_and_fetches_each_title_once() {
    let client = Arc::new(ScriptedClient::new(&[
        ("track=One", track_info(100, 5)),
        ("track=Two", track_info(900, 1)),
    ]));
    let source = Arc::new(LastFmApi::new(Arc::clone(&client), "secret"));
    let gateway = RatingGateway::new(source, tags()).with_policy(fast_policy());
    let ranker = Ranker::new(&gateway).with_pacing(PacingPolicy::disabled());

    let ranked = ranker.rank(&tracks(&["one.mp3", "two.mp3", "two-live.mp3"]), None);

    assert_eq!(ranked, tracks(&["two.mp3", "two-live.mp3", "one.mp3"]));
    assert_eq!(client.requests.load(Ordering::SeqCst), 2);
}

#[test]
fn test_ranks_by_listeners() {
    let client = Arc::new(ScriptedClient::new(&[
        ("track=One", track_info(100, 5)),
        ("track=Two", track_info(900, 1)),
    ]));
    let source = Arc::new(LastFmApi::new(client, "secret"));
    let gateway = RatingGateway::new(source, tags())
        .with_policy(fast_policy())
        .with_metric(Metric::Listeners);

    assert_eq!(gateway.rate(&Track::from("one.mp3")), 5);
    assert_eq!(gateway.rate(&Track::from("two.mp3")), 1);
}

#[test]
fn test_hanging_lookup_keeps_track_at_the_end() {
    let client = Arc::new(ScriptedClient::new(&[("track=One", track_info(3, 1))]));
    let source = Arc::new(LastFmApi::new(Arc::clone(&client), "secret"));
    let gateway = RatingGateway::new(source, tags()).with_policy(fast_policy());
    let ranker = Ranker::new(&gateway).with_pacing(PacingPolicy::disabled());

    let ranked = ranker.rank(&tracks(&["slow.mp3", "one.mp3", "unknown.mp3"]), None);

    assert_eq!(ranked, tracks(&["one.mp3", "slow.mp3", "unknown.mp3"]));
    // One request for "One", two timed-out attempts for "Slow", none for
    // the untagged track.
    assert_eq!(client.requests.load(Ordering::SeqCst), 3);
}

// ============================================================================
// Track Pages
// ============================================================================

#[test]
fn test_page_scraper_reads_scrobbles() {
    let page = r#"<li class="header-metadata-item scrobbles"><h4>Scrobbles</h4><p>12,345</p></li>"#;
    let client = Arc::new(ScriptedClient::new(&[("/Band/_/One", page.to_string())]));
    let gateway = RatingGateway::new(Arc::new(LastFmPage::new(client)), tags())
        .with_policy(fast_policy());

    assert_eq!(gateway.rate(&Track::from("one.mp3")), 12_345);
}
