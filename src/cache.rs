//! Short-lived GET response cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::request::RawResponse;

/// Default validity window for cached responses.
pub const DEFAULT_CACHE_VALID_TIME: Duration = Duration::from_secs(60);

/// Why a lookup did not produce a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheMiss {
    Missing,
    Expired,
}

/// Response cache keyed by fully resolved request URL.
///
/// Entries are checked against the validity window when read; nothing is
/// evicted in the background.
#[derive(Debug)]
pub(crate) struct ResponseCache {
    valid_time: Duration,
    entries: HashMap<String, (Instant, RawResponse)>,
}

impl ResponseCache {
    pub(crate) fn new(valid_time: Duration) -> Self {
        Self {
            valid_time,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, url: &str) -> Result<RawResponse, CacheMiss> {
        self.get_at(url, Instant::now())
    }

    pub(crate) fn put(&mut self, url: &str, response: RawResponse) {
        self.put_at(url, response, Instant::now());
    }

    pub(crate) fn remove(&mut self, url: &str) {
        self.entries.remove(url);
    }

    fn get_at(&self, url: &str, now: Instant) -> Result<RawResponse, CacheMiss> {
        let (stored_at, response) = self.entries.get(url).ok_or(CacheMiss::Missing)?;
        if now.saturating_duration_since(*stored_at) > self.valid_time {
            return Err(CacheMiss::Expired);
        }
        Ok(response.clone())
    }

    fn put_at(&mut self, url: &str, response: RawResponse, now: Instant) {
        self.entries.insert(url.to_string(), (now, response));
    }
}
