use regex::Regex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::api_client::{ApiClient, ApiError};
use crate::cache::SearchCache;
use crate::models::{SearchParams, SearchPatch, SearchResponse};

/// Quiescence-window timer. Each edit re-arms the window; the action fires
/// only once input has settled for the full window. Poll-driven to fit the
/// TUI event loop.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    last_edit: Option<Instant>,
    pending: bool,
}

impl Debounce {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            last_edit: None,
            pending: false,
        }
    }

    /// Register an edit, (re)starting the window.
    pub fn arm(&mut self) {
        self.last_edit = Some(Instant::now());
        self.pending = true;
    }

    /// True exactly once per armed window, after it has settled.
    pub fn settled(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        match self.last_edit {
            Some(at) if at.elapsed() >= self.window => {
                self.pending = false;
                self.last_edit = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Cancel a pending window without firing.
    pub fn cancel(&mut self) {
        self.pending = false;
        self.last_edit = None;
    }
}

/// What the search view should render.
#[derive(Debug, Clone)]
pub enum SearchState {
    /// Nothing to show: "start a search" empty state.
    Idle,
    /// A fetch is in flight: skeleton placeholders.
    Loading,
    /// 429 after retries: the dedicated rate-limit message.
    RateLimited,
    /// Any other failure, already formatted for display.
    Failed(String),
    /// An executed search returned zero hits. Distinct from `Idle`.
    NoResults,
    Results(SearchResponse),
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading)
    }
}

/// Turns parameter edits into at most one backend request per settled
/// parameter state.
///
/// Edits merge into the live params and re-arm the debounce window. Nothing
/// fires until `submit()` has been called at least once and a free-text
/// query or hashtag filter is present. Settled snapshots are resolved
/// through the cache first; only a cache miss reaches the network.
pub struct SearchController {
    params: SearchParams,
    debounce: Debounce,
    submitted: bool,
    cache: SearchCache,
    state: SearchState,
    /// A settled snapshot that missed the cache, waiting for the next tick
    /// so the skeleton state gets rendered before the blocking fetch.
    pending_fetch: Option<SearchParams>,
    /// Fetches issued since construction, for the status line.
    fetches: u64,
}

impl SearchController {
    pub fn new(debounce_ms: u64, cache_ttl_secs: u64) -> Self {
        Self {
            params: SearchParams::default(),
            debounce: Debounce::new(debounce_ms),
            submitted: false,
            cache: SearchCache::new(cache_ttl_secs),
            state: SearchState::Idle,
            pending_fetch: None,
            fetches: 0,
        }
    }

    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    /// Merge a partial update and re-arm the debounce window.
    pub fn patch(&mut self, patch: SearchPatch) {
        self.params.merge(patch);
        self.debounce.arm();
    }

    /// Open the execution gate. The first submit also arms the window so
    /// the request goes out once the current edits settle.
    pub fn submit(&mut self) {
        self.submitted = true;
        self.debounce.arm();
    }

    /// Cancel any pending window, e.g. when the view goes away.
    pub fn reset(&mut self) {
        self.debounce.cancel();
        self.pending_fetch = None;
    }

    /// True while edits are settling in the debounce window.
    pub fn is_settling(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }

    /// Drive the controller; call once per event-loop iteration. Returns
    /// true when the view state changed.
    pub fn tick(&mut self, client: &ApiClient) -> bool {
        if !self.gate_open() {
            // No executed search, or the query has been cleared: back to
            // the empty state, nothing in flight.
            self.debounce.cancel();
            self.pending_fetch = None;
            if !matches!(self.state, SearchState::Idle) {
                self.state = SearchState::Idle;
                return true;
            }
            return false;
        }

        // A snapshot queued on the previous tick has had its skeleton
        // frame; fetch it now.
        if let Some(snapshot) = self.pending_fetch.take() {
            self.fetch(client, &snapshot);
            return true;
        }

        if !self.debounce.settled() {
            return false;
        }

        // The settled snapshot is what goes to the backend; later edits
        // belong to the next window. Previous results stay on screen while
        // edits settle; skeletons appear only for an actual fetch.
        let snapshot = self.params.clone();
        if let Some(cached) = self.cache.get(&snapshot) {
            debug!(target: "search", "serving cached result for {}", snapshot.cache_key());
            self.state = Self::present(cached.clone());
        } else {
            self.state = SearchState::Loading;
            self.pending_fetch = Some(snapshot);
        }
        true
    }

    fn gate_open(&self) -> bool {
        self.submitted && self.params.has_query()
    }

    fn fetch(&mut self, client: &ApiClient, snapshot: &SearchParams) {
        info!(target: "search", "fetching {}", snapshot.cache_key());
        self.fetches += 1;
        match client.search_posts(snapshot) {
            Ok(response) => {
                self.cache.insert(snapshot, response.clone());
                self.state = Self::present(response);
            }
            Err(ApiError::RateLimited) => {
                self.state = SearchState::RateLimited;
            }
            Err(e) => {
                self.state = SearchState::Failed(e.to_string());
            }
        }
    }

    fn present(response: SearchResponse) -> SearchState {
        if response.hits.is_empty() {
            SearchState::NoResults
        } else {
            SearchState::Results(response)
        }
    }
}

/// Split free-text search input into a hashtag filter and remaining query
/// text: `"street style #fashion #ootd"` becomes q `"street style"` plus
/// hashtags `"fashion,ootd"`.
pub fn split_query_input(input: &str) -> SearchPatch {
    // Compiled per call; input parsing happens at keystroke rate, which is
    // well below any level where this matters.
    let hashtag = Regex::new(r"#([\p{L}\p{N}_]+)").expect("static pattern");

    let tags: Vec<String> = hashtag
        .captures_iter(input)
        .map(|c| c[1].to_string())
        .collect();
    let text = hashtag.replace_all(input, "");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    SearchPatch {
        q: Some(text),
        hashtags: Some(tags.join(",")),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn debounce_fires_once_after_settling() {
        let mut debounce = Debounce::new(10);
        debounce.arm();
        assert!(!debounce.settled());
        thread::sleep(Duration::from_millis(20));
        assert!(debounce.settled());
        assert!(!debounce.settled());
    }

    #[test]
    fn new_edit_reschedules_the_window() {
        let mut debounce = Debounce::new(30);
        debounce.arm();
        thread::sleep(Duration::from_millis(20));
        debounce.arm();
        assert!(!debounce.settled());
        thread::sleep(Duration::from_millis(35));
        assert!(debounce.settled());
    }

    #[test]
    fn cancel_discards_pending_window() {
        let mut debounce = Debounce::new(5);
        debounce.arm();
        debounce.cancel();
        thread::sleep(Duration::from_millis(10));
        assert!(!debounce.settled());
    }

    #[test]
    fn no_request_before_submit() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let mut controller = SearchController::new(1, 60);
        controller.patch(SearchPatch {
            q: Some("fashion".into()),
            ..Default::default()
        });
        thread::sleep(Duration::from_millis(5));
        controller.tick(&client);
        assert!(matches!(controller.state(), SearchState::Idle));
        assert_eq!(controller.fetch_count(), 0);
    }

    #[test]
    fn no_request_without_query_text() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let mut controller = SearchController::new(1, 60);
        controller.submit();
        thread::sleep(Duration::from_millis(5));
        controller.tick(&client);
        assert!(matches!(controller.state(), SearchState::Idle));
        assert_eq!(controller.fetch_count(), 0);
    }

    #[test]
    fn unreachable_backend_surfaces_failed_state() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let mut controller = SearchController::new(1, 60);
        controller.patch(SearchPatch {
            q: Some("fashion".into()),
            ..Default::default()
        });
        controller.submit();
        thread::sleep(Duration::from_millis(5));
        // First tick flips to Loading, the next resolves.
        while !matches!(
            controller.state(),
            SearchState::Failed(_) | SearchState::RateLimited
        ) {
            controller.tick(&client);
        }
        assert_eq!(controller.fetch_count(), 1);
        assert!(matches!(controller.state(), SearchState::Failed(_)));
    }

    #[test]
    fn split_query_extracts_hashtags() {
        let patch = split_query_input("street style #fashion #ootd");
        assert_eq!(patch.q.as_deref(), Some("street style"));
        assert_eq!(patch.hashtags.as_deref(), Some("fashion,ootd"));
    }

    #[test]
    fn split_query_without_tags_keeps_text() {
        let patch = split_query_input("coffee shops berlin");
        assert_eq!(patch.q.as_deref(), Some("coffee shops berlin"));
        assert_eq!(patch.hashtags.as_deref(), Some(""));
    }
}
