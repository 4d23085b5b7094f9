//! Track ratings from Last.fm.
//!
//! A rating is a play count or listener count. Lookups go through three
//! layers:
//!
//! 1. a [`RatingSource`] that talks to Last.fm ([`LastFmApi`] with an API
//!    key, [`LastFmPage`] without);
//! 2. a [`BoundedFetcher`] that gives each lookup a deadline and a number of
//!    attempts;
//! 3. a [`RatingCache`] so each artist/title pair is looked up once per run.
//!
//! [`RatingGateway`] ties them to a [`TagReader`](crate::metadata::TagReader)
//! and [`Ranker`] uses it to order a playlist by popularity. Lookup failures
//! never fail a run: unknown ratings count as 0.

mod cache;
mod error;
mod http;
mod ranker;
mod source;
mod worker;

pub use cache::{RatingCache, RatingQuery};
pub use error::LookupError;
pub use http::{HttpClient, ReqwestClient, USER_AGENT};
pub use ranker::{
    PacingPolicy, RankProgress, RankProgressCallback, Ranker, Rating, RatingGateway,
    DEFAULT_PACE_EVERY, DEFAULT_PACE_SECS,
};
pub use source::{
    parse_page_count, parse_service_count, LastFmApi, LastFmPage, Metric, RatingSource, API_ROOT,
    PAGE_ROOT,
};
pub use worker::{AttemptPolicy, BoundedFetcher, DEFAULT_ATTEMPTS, DEFAULT_DEADLINE_SECS};
