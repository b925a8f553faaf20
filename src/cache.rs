use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use crate::models::{SearchParams, SearchResponse};

/// In-memory cache of search responses, keyed by the exact parameter
/// snapshot that produced them. An entry is served as long as it is younger
/// than the freshness TTL; identical snapshots must not hit the network
/// while a fresh entry exists.
pub struct SearchCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

struct CacheEntry {
    response: SearchResponse,
    /// Canonical query string, kept for stats/debugging.
    key_text: String,
    fetched_at: DateTime<Utc>,
}

impl SearchCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
            hits: 0,
            misses: 0,
        }
    }

    fn key(params: &SearchParams) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.cache_key().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a fresh entry for this exact snapshot.
    pub fn get(&mut self, params: &SearchParams) -> Option<&SearchResponse> {
        let key = Self::key(params);
        let fresh = match self.entries.get(&key) {
            Some(entry) => Utc::now() - entry.fetched_at < self.ttl,
            None => false,
        };
        if fresh {
            self.hits += 1;
            debug!(target: "cache", "hit for {}", params.cache_key());
            self.entries.get(&key).map(|e| &e.response)
        } else {
            self.misses += 1;
            // Stale entries stay until overwritten; they are tiny and the
            // key space is bounded by what the user actually searched.
            None
        }
    }

    pub fn insert(&mut self, params: &SearchParams, response: SearchResponse) {
        let key = Self::key(params);
        self.entries.insert(
            key,
            CacheEntry {
                response,
                key_text: params.cache_key(),
                fetched_at: Utc::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            oldest_entry: self.entries.values().map(|e| e.fetched_at).min(),
        }
    }

    /// Canonical key strings of everything currently cached.
    pub fn cached_queries(&self) -> Vec<&str> {
        self.entries.values().map(|e| e.key_text.as_str()).collect()
    }
}

#[derive(Debug)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchPatch;

    fn params(q: &str) -> SearchParams {
        let mut p = SearchParams::default();
        p.merge(SearchPatch {
            q: Some(q.to_string()),
            ..Default::default()
        });
        p
    }

    fn empty_response() -> SearchResponse {
        SearchResponse {
            hits: Vec::new(),
            limit: 24,
            cursor: None,
            processing_time_ms: Some(12),
            estimated_total_hits: Some(0),
            query: None,
        }
    }

    #[test]
    fn fresh_entry_is_served() {
        let mut cache = SearchCache::new(60);
        let p = params("fashion");
        assert!(cache.get(&p).is_none());
        cache.insert(&p, empty_response());
        assert!(cache.get(&p).is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn different_snapshot_is_a_miss() {
        let mut cache = SearchCache::new(60);
        cache.insert(&params("fashion"), empty_response());
        assert!(cache.get(&params("food")).is_none());
    }

    #[test]
    fn zero_ttl_means_nothing_is_fresh() {
        let mut cache = SearchCache::new(0);
        let p = params("fashion");
        cache.insert(&p, empty_response());
        assert!(cache.get(&p).is_none());
    }
}
