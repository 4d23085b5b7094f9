//! Per-run memo of rating lookups.

use std::collections::{HashMap, HashSet};

use parking_lot::{Condvar, Mutex};

use super::source::Metric;

/// What a rating lookup asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RatingQuery {
    pub artist: String,
    pub title: String,
    pub metric: Metric,
}

impl RatingQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>, metric: Metric) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            metric,
        }
    }
}

#[derive(Default)]
struct CacheState {
    ratings: HashMap<RatingQuery, Option<u64>>,
    in_flight: HashSet<RatingQuery>,
}

/// Memoizes lookups so each distinct query is fetched at most once.
///
/// Unknown results (`None`) are cached too, so a track whose lookup timed
/// out is not retried later in the same run. A caller that asks for a query
/// another thread is already fetching blocks until that fetch completes and
/// then reuses its result.
#[derive(Default)]
pub struct RatingCache {
    state: Mutex<CacheState>,
    ready: Condvar,
}

impl RatingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result, if the query has completed.
    pub fn get(&self, query: &RatingQuery) -> Option<Option<u64>> {
        self.state.lock().ratings.get(query).copied()
    }

    /// Returns the cached result for `query`, running `fetch` on a miss.
    pub fn get_or_fetch<F>(&self, query: &RatingQuery, fetch: F) -> Option<u64>
    where
        F: FnOnce() -> Option<u64>,
    {
        let mut state = self.state.lock();
        loop {
            if let Some(rating) = state.ratings.get(query) {
                return *rating;
            }
            if !state.in_flight.contains(query) {
                break;
            }
            self.ready.wait(&mut state);
        }
        state.in_flight.insert(query.clone());
        drop(state);

        let _guard = InFlightGuard { cache: self, query };
        let rating = fetch();
        self.state.lock().ratings.insert(query.clone(), rating);
        rating
    }

    /// Number of completed queries.
    pub fn len(&self) -> usize {
        self.state.lock().ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears the in-flight marker and wakes waiters, even if `fetch` panics.
struct InFlightGuard<'a> {
    cache: &'a RatingCache,
    query: &'a RatingQuery,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.cache.state.lock().in_flight.remove(self.query);
        self.cache.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fetches_once_per_query() {
        let cache = RatingCache::new();
        let calls = AtomicUsize::new(0);
        let query = RatingQuery::new("Cher", "Believe", Metric::Playcount);

        for _ in 0..3 {
            let rating = cache.get_or_fetch(&query, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(42)
            });
            assert_eq!(rating, Some(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&query), Some(Some(42)));
    }

    #[test]
    fn test_metric_is_part_of_the_key() {
        let cache = RatingCache::new();
        let plays = RatingQuery::new("Cher", "Believe", Metric::Playcount);
        let listeners = RatingQuery::new("Cher", "Believe", Metric::Listeners);

        assert_eq!(cache.get_or_fetch(&plays, || Some(10)), Some(10));
        assert_eq!(cache.get_or_fetch(&listeners, || Some(3)), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unknown_is_cached() {
        let cache = RatingCache::new();
        let query = RatingQuery::new("Nobody", "Nothing", Metric::Playcount);

        assert_eq!(cache.get_or_fetch(&query, || None), None);
        assert_eq!(cache.get_or_fetch(&query, || Some(1)), None);
    }

    #[test]
    fn test_concurrent_callers_share_one_fetch() {
        let cache = Arc::new(RatingCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = RatingQuery::new("Cher", "Believe", Metric::Playcount);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let query = query.clone();
                thread::spawn(move || {
                    cache.get_or_fetch(&query, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Some(7)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
