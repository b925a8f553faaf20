mod common;

use common::{MockBackend, GOOD_TOKEN};
use std::sync::atomic::Ordering;
use tempfile::TempDir;
use trends_cli::api_client::ApiClient;
use trends_cli::session::{AuthState, CallbackParams, SessionManager};

#[test]
fn stored_token_resumes_the_session() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, GOOD_TOKEN).unwrap();

    let mut session = SessionManager::new(token_file);
    session.bootstrap(&mut client, None);

    let established = session.session().expect("session");
    assert_eq!(established.user.email, "ana@example.com");
    assert_eq!(established.token, GOOD_TOKEN);
    assert_eq!(client.token(), Some(GOOD_TOKEN));
}

#[test]
fn callback_token_wins_and_is_persisted_after_verification() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "tok-stale").unwrap();

    let callback = CallbackParams::parse(&format!(
        "https://app.example.com/auth/callback?token={}",
        GOOD_TOKEN
    ))
    .unwrap();
    let mut session = SessionManager::new(token_file.clone());
    session.bootstrap(&mut client, Some(&callback));

    assert!(session.state().is_authenticated());
    assert_eq!(std::fs::read_to_string(&token_file).unwrap(), GOOD_TOKEN);
}

#[test]
fn callback_error_short_circuits_without_touching_the_backend() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();

    let callback = CallbackParams::parse(
        "https://app.example.com/cb?error=access_denied&error_description=user%20refused",
    )
    .unwrap();
    let mut session = SessionManager::new(dir.path().join("token"));
    session.bootstrap(&mut client, Some(&callback));

    match session.state() {
        AuthState::Unauthenticated { error: Some(msg) } => {
            assert!(msg.contains("access_denied"));
        }
        other => panic!("unexpected state: {:?}", other),
    }
    assert_eq!(backend.state.me_requests.load(Ordering::SeqCst), 0);
}

#[test]
fn unverifiable_callback_identity_yields_degraded_session() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");

    // The backend rejects this token, but the callback carries identity.
    let callback = CallbackParams::parse(
        "https://app.example.com/cb?token=tok-bad&user_id=42&email=deg%40example.com&name=Deg",
    )
    .unwrap();
    let mut session = SessionManager::new(token_file.clone());
    session.bootstrap(&mut client, Some(&callback));

    let established = session.session().expect("degraded session");
    assert_eq!(established.user.id, 42);
    assert_eq!(established.user.email, "deg@example.com");
    assert_eq!(established.user.role, "user");
    // The unverified token must not be persisted.
    assert!(!token_file.exists());
}

#[test]
fn bad_stored_token_is_cleared() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "tok-expired").unwrap();

    let mut session = SessionManager::new(token_file.clone());
    session.bootstrap(&mut client, None);

    assert!(matches!(
        session.state(),
        AuthState::Unauthenticated { error: Some(_) }
    ));
    assert!(!token_file.exists());
    assert_eq!(client.token(), None);
}

#[test]
fn no_token_anywhere_stays_unauthenticated() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();

    let mut session = SessionManager::new(dir.path().join("token"));
    session.bootstrap(&mut client, None);

    assert!(matches!(
        session.state(),
        AuthState::Unauthenticated { error: None }
    ));
    assert_eq!(backend.state.me_requests.load(Ordering::SeqCst), 0);
}

#[test]
fn sign_out_clears_token_and_state() {
    let backend = MockBackend::start();
    let mut client = ApiClient::new(&backend.base_url());
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, GOOD_TOKEN).unwrap();

    let mut session = SessionManager::new(token_file.clone());
    session.bootstrap(&mut client, None);
    assert!(session.state().is_authenticated());

    session.sign_out(&mut client);
    assert!(!token_file.exists());
    assert_eq!(client.token(), None);
    assert!(matches!(
        session.state(),
        AuthState::Unauthenticated { error: None }
    ));
}
