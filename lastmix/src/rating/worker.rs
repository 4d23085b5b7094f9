//! Bounded-time lookups.
//!
//! Every attempt runs on its own short-lived thread. The caller waits for at
//! most the deadline; a worker that is still busy afterwards is detached and
//! whatever it eventually produces is dropped with its channel.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::cache::RatingQuery;
use super::error::LookupError;
use super::source::RatingSource;

/// Default time allowed for one attempt (30 seconds).
pub const DEFAULT_DEADLINE_SECS: u64 = 30;

/// Default number of attempts per lookup.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// How long, and how many times, a lookup may run.
///
/// Only timeouts are retried. A source that answers with an error has
/// answered; asking again would hit the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub deadline: Duration,
    pub attempts: u32,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl AttemptPolicy {
    pub fn new(deadline: Duration, attempts: u32) -> Self {
        Self { deadline, attempts }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the attempt budget. Zero is treated as one.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    fn budget(&self) -> u32 {
        self.attempts.max(1)
    }
}

/// Runs [`RatingSource::fetch`] under an [`AttemptPolicy`].
#[derive(Clone)]
pub struct BoundedFetcher {
    source: Arc<dyn RatingSource>,
    policy: AttemptPolicy,
}

impl BoundedFetcher {
    pub fn new(source: Arc<dyn RatingSource>, policy: AttemptPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> AttemptPolicy {
        self.policy
    }

    pub fn source(&self) -> Arc<dyn RatingSource> {
        Arc::clone(&self.source)
    }

    /// Fetches the rating for `query`, giving up after the attempt budget.
    pub fn fetch(&self, query: &RatingQuery) -> Result<u64, LookupError> {
        let budget = self.policy.budget();

        for attempt in 1..=budget {
            let (tx, rx) = mpsc::sync_channel(1);
            let source = Arc::clone(&self.source);
            let job = query.clone();

            thread::Builder::new()
                .name("lastmix-lookup".to_string())
                .spawn(move || {
                    let result = source.fetch(&job.artist, &job.title, job.metric);
                    // The receiver is gone if the caller stopped waiting.
                    let _ = tx.send(result);
                })
                .map_err(|e| LookupError::Transport(format!("Failed to spawn worker: {}", e)))?;

            match rx.recv_timeout(self.policy.deadline) {
                Ok(result) => {
                    debug!(
                        artist = %query.artist,
                        title = %query.title,
                        attempt,
                        ok = result.is_ok(),
                        "Lookup finished"
                    );
                    return result;
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        artist = %query.artist,
                        title = %query.title,
                        attempt,
                        budget,
                        deadline_ms = self.policy.deadline.as_millis() as u64,
                        "Lookup timed out, abandoning worker"
                    );
                }
                Err(RecvTimeoutError::Disconnected) => return Err(LookupError::WorkerLost),
            }
        }

        Err(LookupError::Timeout {
            attempts: budget,
            deadline: self.policy.deadline,
        })
    }
}
