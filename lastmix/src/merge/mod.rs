//! Combining several playlists into one.
//!
//! Two families of merges share the same data model:
//!
//! - the windowed scheduler ([`WindowedMerge`]) interleaves playlists under a
//!   round-robin, fair-subrange or random policy;
//! - the set operators ([`union`], [`intersection`], ...) combine playlists
//!   with set semantics while keeping their order.
//!
//! [`MergeStrategy`] names every supported combination and dispatches to the
//! right implementation.
//!
//! # Example
//!
//! ```
//! use lastmix::merge::MergeStrategy;
//!
//! let strategy: MergeStrategy = "interleave".parse().unwrap();
//! let merged = strategy.apply(vec![vec!["a1", "a2"], vec!["b1"]], &mut rand::rng());
//! assert_eq!(merged, vec!["a1", "b1", "a2"]);
//! ```

mod scheduler;
mod set_ops;
mod strategy;

pub use scheduler::{WindowedMerge, DEFAULT_WINDOW};
pub use set_ops::{
    difference, difference_all, intersection, intersection_all, overlay, overlay_all,
    symmetric_difference, symmetric_difference_all, union, union_all,
};
pub use strategy::{join, MergeStrategy};
