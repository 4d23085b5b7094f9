//! Last.fm rating sources.
//!
//! Two sources answer the same question, "how popular is this track?":
//!
//! - [`LastFmApi`] calls the `track.getInfo` web service and needs an API key;
//! - [`LastFmPage`] scrapes the public track page and needs nothing.
//!
//! Both are synchronous and may block for as long as the HTTP client lets
//! them. Bounding the time spent on a lookup is the job of
//! [`BoundedFetcher`](super::worker::BoundedFetcher).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use super::error::LookupError;
use super::http::{HttpClient, ReqwestClient};

/// Default web service endpoint.
pub const API_ROOT: &str = "http://ws.audioscrobbler.com/2.0/";

/// Default root of the public track pages.
pub const PAGE_ROOT: &str = "http://www.last.fm/music";

/// Which statistic a rating is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// Total number of scrobbles.
    #[default]
    Playcount,
    /// Number of distinct listeners.
    Listeners,
}

impl Metric {
    /// Element name in the web service response.
    pub fn field(&self) -> &'static str {
        match self {
            Metric::Playcount => "playcount",
            Metric::Listeners => "listeners",
        }
    }

    /// CSS class of the list item holding the number on the track page.
    pub fn page_class(&self) -> &'static str {
        match self {
            Metric::Playcount => "scrobbles",
            Metric::Listeners => "listeners",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Something that can look up the popularity of a track.
pub trait RatingSource: Send + Sync {
    /// Returns the `metric` count for the track, or why it is unknown.
    ///
    /// Implementations return [`LookupError::MissingMetadata`] without any
    /// I/O when `artist` or `title` is empty.
    fn fetch(&self, artist: &str, title: &str, metric: Metric) -> Result<u64, LookupError>;
}

/// `track.getInfo` web service client.
pub struct LastFmApi<C: HttpClient = ReqwestClient> {
    client: C,
    api_key: String,
    root: String,
    autocorrect: bool,
}

impl<C: HttpClient> LastFmApi<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            root: API_ROOT.to_string(),
            autocorrect: true,
        }
    }

    /// Points the client at another endpoint.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Whether Last.fm may correct misspelled artist and track names.
    pub fn with_autocorrect(mut self, autocorrect: bool) -> Self {
        self.autocorrect = autocorrect;
        self
    }

    /// Builds the request URL for a track.
    pub fn url(&self, artist: &str, title: &str) -> String {
        format!(
            "{}?method=track.getInfo&api_key={}&artist={}&track={}&autocorrect={}",
            self.root,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(artist),
            urlencoding::encode(title),
            u8::from(self.autocorrect)
        )
    }
}

impl<C: HttpClient> RatingSource for LastFmApi<C> {
    fn fetch(&self, artist: &str, title: &str, metric: Metric) -> Result<u64, LookupError> {
        if artist.is_empty() || title.is_empty() {
            return Err(LookupError::MissingMetadata);
        }

        let body = self.client.get(&self.url(artist, title))?;
        trace!(artist, title, bytes = body.len(), "Web service response");
        parse_service_count(&body, metric)
    }
}

/// Public track page scraper, used when no API key is configured.
pub struct LastFmPage<C: HttpClient = ReqwestClient> {
    client: C,
    root: String,
}

impl<C: HttpClient> LastFmPage<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            root: PAGE_ROOT.to_string(),
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Builds the page URL for a track.
    pub fn url(&self, artist: &str, title: &str) -> String {
        format!(
            "{}/{}/_/{}",
            self.root,
            quote_plus(artist),
            quote_plus(title)
        )
    }
}

impl<C: HttpClient> RatingSource for LastFmPage<C> {
    fn fetch(&self, artist: &str, title: &str, metric: Metric) -> Result<u64, LookupError> {
        if artist.is_empty() || title.is_empty() {
            return Err(LookupError::MissingMetadata);
        }

        let body = self.client.get(&self.url(artist, title))?;
        trace!(artist, title, bytes = body.len(), "Track page response");
        parse_page_count(&body, metric)
    }
}

/// Form-style encoding: spaces become `+`.
fn quote_plus(text: &str) -> String {
    urlencoding::encode(text).replace("%20", "+")
}

fn element_pattern(metric: Metric) -> &'static Regex {
    static PLAYCOUNT: OnceLock<Regex> = OnceLock::new();
    static LISTENERS: OnceLock<Regex> = OnceLock::new();

    let (cell, name) = match metric {
        Metric::Playcount => (&PLAYCOUNT, "playcount"),
        Metric::Listeners => (&LISTENERS, "listeners"),
    };
    cell.get_or_init(|| {
        Regex::new(&format!(r"<{name}\s*>([^<]*)</{name}>|<{name}\s*/>")).unwrap()
    })
}

fn list_item_pattern(metric: Metric) -> &'static Regex {
    static SCROBBLES: OnceLock<Regex> = OnceLock::new();
    static LISTENERS: OnceLock<Regex> = OnceLock::new();

    let (cell, class) = match metric {
        Metric::Playcount => (&SCROBBLES, "scrobbles"),
        Metric::Listeners => (&LISTENERS, "listeners"),
    };
    cell.get_or_init(|| {
        Regex::new(&format!(
            r#"(?is)<li[^>]*\bclass\s*=\s*"(?:[^"]*\s)?{class}(?:\s[^"]*)?"[^>]*>(.*?)</li>"#
        ))
        .unwrap()
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9][0-9,]*").unwrap())
}

/// Reads the statistic out of a `track.getInfo` XML response.
///
/// A present but empty element counts as 0; a missing element (for example
/// in an error response) is [`LookupError::MissingField`].
pub fn parse_service_count(body: &str, metric: Metric) -> Result<u64, LookupError> {
    let captures = element_pattern(metric)
        .captures(body)
        .ok_or(LookupError::MissingField(metric.field()))?;

    let text = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| LookupError::MissingField(metric.field()))
}

/// Reads the statistic out of a track page.
///
/// Markup inside the list item is ignored and the number may be written
/// with thousands separators ("1,234"). A list item without digits counts
/// as 0.
pub fn parse_page_count(body: &str, metric: Metric) -> Result<u64, LookupError> {
    let captures = list_item_pattern(metric)
        .captures(body)
        .ok_or(LookupError::MissingField(metric.page_class()))?;

    let inner = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let text = tag_pattern().replace_all(inner, " ");
    match number_pattern().find(&text) {
        Some(m) => m
            .as_str()
            .replace(',', "")
            .parse()
            .map_err(|_| LookupError::MissingField(metric.page_class())),
        None => Ok(0),
    }
}
