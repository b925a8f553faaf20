use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Social platforms the backend indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Instagram,
    Tiktok,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "instagram" => Some(Platform::Instagram),
            "tiktok" => Some(Platform::Tiktok),
            _ => None,
        }
    }

    /// Cycle through platforms (used by the TUI toggle).
    pub fn next(&self) -> Self {
        match self {
            Platform::Instagram => Platform::Tiktok,
            Platform::Tiktok => Platform::Instagram,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three fixed result orderings the search endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortKey {
    #[default]
    #[serde(rename = "score_trend:desc")]
    ScoreTrendDesc,
    #[serde(rename = "posted_at:desc")]
    PostedAtDesc,
    #[serde(rename = "like_count:desc")]
    LikeCountDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::ScoreTrendDesc => "score_trend:desc",
            SortKey::PostedAtDesc => "posted_at:desc",
            SortKey::LikeCountDesc => "like_count:desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "score_trend:desc" => Some(SortKey::ScoreTrendDesc),
            "posted_at:desc" => Some(SortKey::PostedAtDesc),
            "like_count:desc" => Some(SortKey::LikeCountDesc),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortKey::ScoreTrendDesc => SortKey::PostedAtDesc,
            SortKey::PostedAtDesc => SortKey::LikeCountDesc,
            SortKey::LikeCountDesc => SortKey::ScoreTrendDesc,
        }
    }

    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::ScoreTrendDesc => "trend",
            SortKey::PostedAtDesc => "recent",
            SortKey::LikeCountDesc => "likes",
        }
    }
}

/// Parameters for the post search endpoint.
///
/// Only non-empty fields are serialized onto the query string; `platform`,
/// `sort` and `limit` always have values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub hashtags: Option<String>,
    pub platform: Platform,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort: SortKey,
    pub limit: usize,
    pub cursor: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            q: None,
            hashtags: None,
            platform: Platform::Instagram,
            date_from: None,
            date_to: None,
            sort: SortKey::ScoreTrendDesc,
            limit: 24,
            cursor: None,
        }
    }
}

/// A partial update to `SearchParams`. Unset fields leave the current value
/// alone; `Some("")` on a text field clears it.
#[derive(Debug, Clone, Default)]
pub struct SearchPatch {
    pub q: Option<String>,
    pub hashtags: Option<String>,
    pub platform: Option<Platform>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort: Option<SortKey>,
    pub limit: Option<usize>,
    pub cursor: Option<Option<String>>,
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

impl SearchParams {
    pub fn merge(&mut self, patch: SearchPatch) {
        if let Some(q) = patch.q {
            self.q = non_empty(q);
        }
        if let Some(h) = patch.hashtags {
            self.hashtags = non_empty(h);
        }
        if let Some(p) = patch.platform {
            self.platform = p;
        }
        if let Some(d) = patch.date_from {
            self.date_from = non_empty(d);
        }
        if let Some(d) = patch.date_to {
            self.date_to = non_empty(d);
        }
        if let Some(s) = patch.sort {
            self.sort = s;
        }
        if let Some(l) = patch.limit {
            self.limit = l;
        }
        if let Some(c) = patch.cursor {
            self.cursor = c.and_then(non_empty);
        }
    }

    /// The execution gate cares about free text or a hashtag filter only.
    pub fn has_query(&self) -> bool {
        self.q.is_some() || self.hashtags.is_some()
    }

    /// Serialize the non-empty fields in a stable order, ready for
    /// `reqwest`'s `.query()`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(8);
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(h) = &self.hashtags {
            pairs.push(("hashtags", h.clone()));
        }
        pairs.push(("platform", self.platform.as_str().to_string()));
        if let Some(d) = &self.date_from {
            pairs.push(("date_from", d.clone()));
        }
        if let Some(d) = &self.date_to {
            pairs.push(("date_to", d.clone()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs.push(("limit", self.limit.to_string()));
        if let Some(c) = &self.cursor {
            pairs.push(("cursor", c.clone()));
        }
        pairs
    }

    /// Canonical text form of this exact parameter snapshot. Two snapshots
    /// with the same canonical form are the same cache entry.
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A single post returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostHit {
    pub id: String,
    pub platform: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub permalink: String,
    pub posted_at: String,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub score_trend: Option<f64>,
}

impl PostHit {
    /// What a "watch this author" action should track: the username when
    /// known, otherwise the post id.
    pub fn watch_value(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }
}

/// Search endpoint response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<PostHit>,
    pub limit: usize,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    #[serde(default, rename = "estimatedTotalHits")]
    pub estimated_total_hits: Option<u64>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Kinds of entities the watchlist tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchKind {
    Hashtag,
    User,
    Niche,
}

impl WatchKind {
    /// Prefix used when displaying a watched value.
    pub fn sigil(&self) -> &'static str {
        match self {
            WatchKind::Hashtag => "#",
            WatchKind::User => "@",
            WatchKind::Niche => "~",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hashtag" => Some(WatchKind::Hashtag),
            "user" => Some(WatchKind::User),
            "niche" => Some(WatchKind::Niche),
            _ => None,
        }
    }
}

/// One tracked entity. Duplicates are allowed; the list keeps insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchItem {
    pub kind: WatchKind,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for WatchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.sigil(), self.value)
    }
}

/// Profile object returned by `/api/v1/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_role() -> String {
    "user".to_string()
}

fn default_true() -> bool {
    true
}

/// An established session: the bearer token plus the profile it resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// Response of the login/register endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: UserProfile,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body for `POST /api/v1/projects`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtag_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_usernames: Option<Vec<String>>,
}

/// A tracked analytics project as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub creators_count: Option<u64>,
    #[serde(default)]
    pub posts_count: Option<u64>,
    #[serde(default)]
    pub signals_count: Option<u64>,
    #[serde(default)]
    pub last_run_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Liveness probe payload.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}
