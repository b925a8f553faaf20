use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::json;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{
    HealthResponse, Project, ProjectCreate, SearchParams, SearchResponse, TokenResponse,
    UserProfile,
};

/// Errors surfaced by the backend client. Rate limiting gets its own variant
/// so the UI can show a dedicated message.
#[derive(Debug)]
pub enum ApiError {
    /// HTTP 429 after the retry budget was exhausted.
    RateLimited,
    /// Any other non-2xx status.
    Status(u16, String),
    /// The request never completed (DNS, connect, timeout).
    Network(reqwest::Error),
    /// The response body was not the JSON we expected.
    Decode(reqwest::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RateLimited => write!(f, "rate limit reached, try again shortly"),
            ApiError::Status(code, body) => {
                if body.is_empty() {
                    write!(f, "server returned HTTP {}", code)
                } else {
                    write!(f, "server returned HTTP {}: {}", code, body)
                }
            }
            ApiError::Network(e) => write!(f, "network error: {}", e),
            ApiError::Decode(e) => write!(f, "unexpected response body: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }
}

/// Backoff schedule for rate-limited search requests: base delay doubling
/// per attempt, capped. Tests shrink the delays to keep runs fast.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): base * 2^attempt,
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Blocking client for the Insider Trends REST backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            token: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Search posts. Retries on HTTP 429 per the retry policy; any other
    /// non-2xx status fails immediately.
    pub fn search_posts(&self, params: &SearchParams) -> Result<SearchResponse, ApiError> {
        let url = self.url("/api/v1/posts/search");
        let pairs = params.to_query_pairs();

        let mut attempt = 0u32;
        loop {
            debug!(target: "api", "GET {} (attempt {})", url, attempt + 1);
            let response = self
                .authorize(self.client.get(&url).query(&pairs))
                .send()
                .map_err(ApiError::Network)?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.retry.max_retries {
                    warn!(target: "api", "search rate limited, retry budget exhausted");
                    return Err(ApiError::RateLimited);
                }
                let delay = self.retry.delay_for(attempt);
                warn!(
                    target: "api",
                    "search rate limited, retrying in {:?} ({}/{})",
                    delay,
                    attempt + 1,
                    self.retry.max_retries
                );
                thread::sleep(delay);
                attempt += 1;
                continue;
            }

            return Self::expect_json(response);
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .map_err(ApiError::Network)?;
        Self::expect_json(response)
    }

    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<TokenResponse, ApiError> {
        let mut body = json!({ "email": email, "password": password });
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        let response = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&body)
            .send()
            .map_err(ApiError::Network)?;
        Self::expect_json(response)
    }

    /// Resolve a bearer token to its profile. Takes the token explicitly so
    /// session bootstrap can probe candidate tokens before adopting one.
    pub fn get_me(&self, token: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .client
            .get(self.url("/api/v1/auth/me"))
            .bearer_auth(token)
            .send()
            .map_err(ApiError::Network)?;
        Self::expect_json(response)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self
            .authorize(self.client.get(self.url("/api/v1/projects")))
            .send()
            .map_err(ApiError::Network)?;
        Self::expect_json(response)
    }

    pub fn create_project(&self, project: &ProjectCreate) -> Result<Project, ApiError> {
        let response = self
            .authorize(self.client.post(self.url("/api/v1/projects")).json(project))
            .send()
            .map_err(ApiError::Network)?;
        Self::expect_json(response)
    }

    pub fn delete_project(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .authorize(
                self.client
                    .delete(self.url(&format!("/api/v1/projects/{}", id))),
            )
            .send()
            .map_err(ApiError::Network)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response))
        }
    }

    pub fn check_health(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .client
            .get(self.url("/api/healthz"))
            .send()
            .map_err(ApiError::Network)?;
        Self::expect_json(response)
    }

    fn expect_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(Self::status_error(response));
        }
        response.json().map_err(ApiError::Decode)
    }

    fn status_error(response: Response) -> ApiError {
        let code = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        // Error bodies are {"detail": "..."} on this backend; fall back to
        // the raw text when they are not.
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(body);
        ApiError::Status(code, detail.chars().take(200).collect())
    }
}
