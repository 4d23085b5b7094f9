//! Rating lookup errors.

use std::time::Duration;

use thiserror::Error;

/// Why a rating could not be determined.
///
/// None of these abort a run: the ranker logs them and rates the track 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Every attempt ran past its deadline.
    #[error("lookup timed out after {attempts} attempts of {deadline:?}")]
    Timeout { attempts: u32, deadline: Duration },

    /// The request failed or the server answered with an error status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The track has no artist or no title tag.
    #[error("track has no artist or title")]
    MissingMetadata,

    /// The response did not contain the requested statistic.
    #[error("response has no '{0}' field")]
    MissingField(&'static str),

    /// The worker thread went away without sending a result.
    #[error("lookup worker exited without a result")]
    WorkerLost,
}
