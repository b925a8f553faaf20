#![allow(dead_code)]

//! In-process mock of the Insider Trends backend.
//!
//! The client under test uses blocking HTTP, so the axum router runs on a
//! real ephemeral port inside its own tokio runtime on a background thread.
//! Dropping the backend shuts the server down.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub const GOOD_TOKEN: &str = "tok-good";

#[derive(Default)]
pub struct BackendState {
    /// Query strings seen by the search endpoint, in order.
    pub search_requests: Mutex<Vec<String>>,
    /// How many search requests to answer with 429 before serving results.
    pub rate_limit_budget: AtomicUsize,
    /// When set, every search request fails with this status.
    pub search_error_status: Mutex<Option<u16>>,
    /// Hits the search endpoint returns once it answers 200.
    pub search_hits: Mutex<Value>,
    pub me_requests: AtomicUsize,
}

pub struct MockBackend {
    pub state: Arc<BackendState>,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MockBackend {
    pub fn start() -> Self {
        let state = Arc::new(BackendState {
            search_hits: Mutex::new(json!([sample_hit("p1", "chiara")])),
            ..Default::default()
        });

        let router = Router::new()
            .route("/api/v1/posts/search", get(search))
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/register", post(register))
            .route("/api/v1/auth/me", get(me))
            .route("/api/v1/projects", get(list_projects).post(create_project))
            .route("/api/v1/projects/:id", delete(delete_project))
            .route("/api/healthz", get(healthz))
            .with_state(state.clone());

        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral port");
                addr_tx
                    .send(listener.local_addr().expect("local addr"))
                    .expect("report addr");
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("serve");
            });
        });

        let addr = addr_rx.recv().expect("server never started");
        Self {
            state,
            addr,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn search_request_count(&self) -> usize {
        self.state.search_requests.lock().unwrap().len()
    }

    pub fn set_rate_limit_budget(&self, count: usize) {
        self.state.rate_limit_budget.store(count, Ordering::SeqCst);
    }

    pub fn set_search_hits(&self, hits: Value) {
        *self.state.search_hits.lock().unwrap() = hits;
    }

    pub fn set_search_error(&self, status: u16) {
        *self.state.search_error_status.lock().unwrap() = Some(status);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn sample_hit(id: &str, username: &str) -> Value {
    json!({
        "id": id,
        "platform": "instagram",
        "username": username,
        "caption": "spring looks #fashion",
        "hashtags": ["fashion"],
        "permalink": format!("https://example.com/p/{}", id),
        "posted_at": "2026-08-01T10:00:00Z",
        "like_count": 120,
        "comment_count": 8,
        "score_trend": 3.5
    })
}

async fn search(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    state.search_requests.lock().unwrap().push(pairs.join("&"));

    let budget = &state.rate_limit_budget;
    if budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"detail": "rate limit exceeded"})),
        );
    }

    if let Some(code) = *state.search_error_status.lock().unwrap() {
        let status = StatusCode::from_u16(code).expect("valid status code");
        return (status, Json(json!({"detail": "search backend error"})));
    }

    let hits = state.search_hits.lock().unwrap().clone();
    let total = hits.as_array().map(|a| a.len()).unwrap_or(0);
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(24);
    (
        StatusCode::OK,
        Json(json!({
            "hits": hits,
            "limit": limit,
            "processing_time_ms": 12,
            "estimatedTotalHits": total,
            "query": params.get("q").cloned().unwrap_or_default()
        })),
    )
}

fn profile() -> Value {
    json!({
        "id": 7,
        "email": "ana@example.com",
        "name": "Ana",
        "role": "user",
        "is_active": true,
        "created_at": "2026-01-15T09:30:00Z"
    })
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body.get("password").and_then(Value::as_str) == Some("secret") {
        (
            StatusCode::OK,
            Json(json!({
                "access_token": GOOD_TOKEN,
                "token_type": "bearer",
                "user": profile()
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "invalid credentials"})),
        )
    }
}

async fn register(Json(body): Json<Value>) -> impl IntoResponse {
    let email = body
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or("new@example.com")
        .to_string();
    let mut user = profile();
    user["email"] = json!(email);
    (
        StatusCode::CREATED,
        Json(json!({
            "access_token": GOOD_TOKEN,
            "token_type": "bearer",
            "user": user
        })),
    )
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> impl IntoResponse {
    state.me_requests.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", GOOD_TOKEN))
        .unwrap_or(false);
    if authorized {
        (StatusCode::OK, Json(profile()))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "could not validate credentials"})),
        )
    }
}

async fn list_projects() -> impl IntoResponse {
    Json(json!([{
        "id": 1,
        "user_id": 7,
        "name": "Spring campaign",
        "description": null,
        "status": "active",
        "platforms": ["instagram"],
        "created_at": "2026-02-01T00:00:00Z",
        "updated_at": "2026-02-01T00:00:00Z"
    }]))
}

async fn create_project(Json(body): Json<Value>) -> impl IntoResponse {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("unnamed")
        .to_string();
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 2,
            "user_id": 7,
            "name": name,
            "description": body.get("description").cloned().unwrap_or(Value::Null),
            "status": "active",
            "platforms": body.get("platforms").cloned().unwrap_or_else(|| json!([])),
            "created_at": "2026-02-01T00:00:00Z",
            "updated_at": "2026-02-01T00:00:00Z"
        })),
    )
}

async fn delete_project(Path(_id): Path<i64>) -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn healthz() -> impl IntoResponse {
    Json(json!({"status": "ok", "message": "healthy"}))
}
