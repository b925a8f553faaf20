mod common;

use common::MockBackend;
use std::time::{Duration, Instant};
use trends_cli::api_client::{ApiClient, ApiError, RetryPolicy};
use trends_cli::models::{SearchParams, SearchPatch};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(40),
    }
}

fn query() -> SearchParams {
    let mut params = SearchParams::default();
    params.merge(SearchPatch {
        q: Some("fashion".into()),
        ..Default::default()
    });
    params
}

#[test]
fn search_retries_through_transient_rate_limits() {
    let backend = MockBackend::start();
    backend.set_rate_limit_budget(2);
    let client = ApiClient::new(&backend.base_url()).with_retry_policy(fast_retry());

    let response = client.search_posts(&query()).unwrap();
    assert_eq!(response.hits.len(), 1);
    assert_eq!(backend.search_request_count(), 3);
}

#[test]
fn exhausted_retry_budget_reports_rate_limited() {
    let backend = MockBackend::start();
    backend.set_rate_limit_budget(100);
    let client = ApiClient::new(&backend.base_url()).with_retry_policy(fast_retry());

    let err = client.search_posts(&query()).unwrap_err();
    assert!(err.is_rate_limit());
    // Initial attempt plus three retries, then give up.
    assert_eq!(backend.search_request_count(), 4);
}

#[test]
fn retries_wait_between_attempts() {
    let backend = MockBackend::start();
    backend.set_rate_limit_budget(2);
    let client = ApiClient::new(&backend.base_url()).with_retry_policy(RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(200),
    });

    let started = Instant::now();
    client.search_posts(&query()).unwrap();
    // Two backoffs: 20ms + 40ms.
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[test]
fn server_errors_fail_immediately_without_retry() {
    let backend = MockBackend::start();
    backend.set_search_error(500);
    let client = ApiClient::new(&backend.base_url()).with_retry_policy(fast_retry());

    let err = client.search_posts(&query()).unwrap_err();
    match err {
        ApiError::Status(500, detail) => assert_eq!(detail, "search backend error"),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(backend.search_request_count(), 1);
}

#[test]
fn network_errors_fail_without_retry() {
    let backend = MockBackend::start();
    let client = ApiClient::new("http://127.0.0.1:9").with_retry_policy(fast_retry());

    let err = client.search_posts(&query()).unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(backend.search_request_count(), 0);
}

#[test]
fn status_errors_carry_the_backend_detail() {
    let backend = MockBackend::start();
    let client = ApiClient::new(&backend.base_url());

    let err = client.login("ana@example.com", "wrong").unwrap_err();
    match err {
        ApiError::Status(401, detail) => assert_eq!(detail, "invalid credentials"),
        other => panic!("unexpected error: {}", other),
    }
}
