//! Crate-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for lastmix operations.
pub type Result<T> = std::result::Result<T, LastmixError>;

/// Which family of strategy a name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Merge,
    Group,
    Order,
    Preset,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Merge => "merge",
            StrategyKind::Group => "group",
            StrategyKind::Order => "order",
            StrategyKind::Preset => "preset",
        };
        f.write_str(name)
    }
}

/// Errors that abort a run.
///
/// Rating lookups never surface here: a failed lookup degrades to a zero
/// rating and the track stays in the playlist.
#[derive(Debug, Error)]
pub enum LastmixError {
    /// A strategy name that is not registered.
    #[error("unknown {kind} strategy '{name}'")]
    UnknownStrategy { kind: StrategyKind, name: String },

    /// A window specification that is not `MxN` with positive sizes.
    #[error("invalid window '{0}': expected MxN, e.g. 5x5")]
    InvalidWindow(String),

    /// Failed to read a playlist file or directory.
    #[error("failed to read playlist {}: {source}", .path.display())]
    PlaylistRead { path: PathBuf, source: io::Error },

    /// Failed to write the output playlist.
    #[error("failed to write playlist {}: {source}", .path.display())]
    PlaylistWrite { path: PathBuf, source: io::Error },

    /// Invalid configuration file or value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to build the HTTP client for rating lookups.
    #[error("failed to set up rating lookups: {0}")]
    RatingSetup(#[source] crate::rating::LookupError),

    /// Failed to install the tracing subscriber.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl LastmixError {
    /// Shorthand for an unknown strategy name.
    pub fn unknown(kind: StrategyKind, name: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            kind,
            name: name.into(),
        }
    }
}
