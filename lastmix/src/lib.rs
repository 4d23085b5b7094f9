//! lastmix - playlist merging, grouping and Last.fm ranking
//!
//! This library combines M3U playlists (or directories of MP3 files) into a
//! single playlist. A run groups the input tracks, orders each group (for
//! example by Last.fm play count), and merges the groups with one of several
//! interleaving or set-algebra strategies.
//!
//! # Example
//!
//! ```
//! use lastmix::merge::WindowedMerge;
//!
//! let merged = WindowedMerge::interleave().merge(vec![
//!     vec!["a1", "a2"],
//!     vec!["b1", "b2"],
//! ]);
//! assert_eq!(merged, vec!["a1", "b1", "a2", "b2"]);
//! ```

pub mod config;
pub mod error;
pub mod fairness;
pub mod group;
pub mod logging;
pub mod merge;
pub mod metadata;
pub mod order;
pub mod pipeline;
pub mod playlist;
pub mod rating;
pub mod sequence;
pub mod track;

pub use error::{LastmixError, Result};
pub use group::GroupStrategy;
pub use merge::MergeStrategy;
pub use order::OrderStrategy;
pub use pipeline::{Pipeline, PipelineConfig, Preset, StrategyChoice};
pub use track::Track;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
