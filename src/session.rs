use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Url;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api_client::ApiClient;
use crate::app_paths::AppPaths;
use crate::models::{Session, UserProfile};

/// Identity parameters carried by an OAuth callback URL.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Extract the known parameters from a callback URL's query string.
    /// Unknown parameters are ignored.
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).context("invalid callback URL")?;
        let mut params = CallbackParams::default();
        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "token" => params.token = Some(value),
                "user_id" => params.user_id = value.parse().ok(),
                "email" => params.email = Some(value),
                "name" => params.name = Some(value),
                "error" => params.error = Some(value),
                "error_description" => params.error_description = Some(value),
                _ => {}
            }
        }
        Ok(params)
    }

    fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| match &self.error_description {
            Some(desc) => format!("{}: {}", e, desc),
            None => e.clone(),
        })
    }
}

/// Where the auth bootstrap ended up for this process.
#[derive(Debug, Clone)]
pub enum AuthState {
    Unauthenticated { error: Option<String> },
    /// Transient: a token exists and the profile fetch is underway.
    Resolving,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Establishes a session from a persisted token or an OAuth callback and
/// owns the token file for the rest of the process.
pub struct SessionManager {
    token_file: PathBuf,
    state: AuthState,
}

impl SessionManager {
    pub fn with_default_path() -> Result<Self> {
        Ok(Self::new(AppPaths::token_file()?))
    }

    pub fn new(token_file: PathBuf) -> Self {
        Self {
            token_file,
            state: AuthState::Unauthenticated { error: None },
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// One bootstrap pass, run once per startup (and again after a callback
    /// URL is supplied).
    ///
    /// - A callback carrying `error` short-circuits to unauthenticated; the
    ///   backend is never called.
    /// - Otherwise the candidate token comes from the callback, then from
    ///   the token file. No token means unauthenticated.
    /// - With a token, `/api/v1/auth/me` decides: on success the token is
    ///   persisted and the server profile wins over anything in the URL; on
    ///   failure a callback with `user_id` and `email` still yields a
    ///   degraded session (not persisted), anything else clears the token.
    pub fn bootstrap(&mut self, client: &mut ApiClient, callback: Option<&CallbackParams>) {
        if let Some(cb) = callback {
            if let Some(message) = cb.error_message() {
                warn!(target: "auth", "OAuth callback returned an error: {}", message);
                self.state = AuthState::Unauthenticated {
                    error: Some(message),
                };
                return;
            }
        }

        let candidate = callback
            .and_then(|cb| cb.token.clone())
            .or_else(|| self.stored_token());

        let token = match candidate {
            Some(token) => token,
            None => {
                self.state = AuthState::Unauthenticated { error: None };
                return;
            }
        };

        self.state = AuthState::Resolving;
        match client.get_me(&token) {
            Ok(profile) => {
                if let Err(e) = fs::write(&self.token_file, &token) {
                    warn!(target: "auth", "could not persist token: {}", e);
                }
                client.set_token(&token);
                info!(target: "auth", "session established for {}", profile.email);
                self.state = AuthState::Authenticated(Session {
                    token,
                    user: profile,
                });
            }
            Err(e) => {
                if let Some(profile) = callback.and_then(Self::profile_from_callback) {
                    // Profile fetch failed but the callback carried enough
                    // identity to keep going. The token is deliberately not
                    // persisted on this path, so the next start re-verifies.
                    warn!(
                        target: "auth",
                        "profile fetch failed ({}), using callback identity for {}",
                        e, profile.email
                    );
                    client.set_token(&token);
                    self.state = AuthState::Authenticated(Session {
                        token,
                        user: profile,
                    });
                } else {
                    warn!(target: "auth", "profile fetch failed, clearing token: {}", e);
                    self.clear_token_file();
                    client.clear_token();
                    self.state = AuthState::Unauthenticated {
                        error: Some(e.to_string()),
                    };
                }
            }
        }
    }

    /// Adopt a freshly issued token+profile (login/register response).
    pub fn establish(&mut self, client: &mut ApiClient, token: String, user: UserProfile) {
        if let Err(e) = fs::write(&self.token_file, &token) {
            warn!(target: "auth", "could not persist token: {}", e);
        }
        client.set_token(&token);
        self.state = AuthState::Authenticated(Session { token, user });
    }

    pub fn sign_out(&mut self, client: &mut ApiClient) {
        self.clear_token_file();
        client.clear_token();
        self.state = AuthState::Unauthenticated { error: None };
        info!(target: "auth", "signed out");
    }

    fn stored_token(&self) -> Option<String> {
        match fs::read_to_string(&self.token_file) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(_) => None,
        }
    }

    fn clear_token_file(&self) {
        if self.token_file.exists() {
            if let Err(e) = fs::remove_file(&self.token_file) {
                warn!(target: "auth", "could not remove token file: {}", e);
            }
        }
    }

    fn profile_from_callback(cb: &CallbackParams) -> Option<UserProfile> {
        let id = cb.user_id?;
        let email = cb.email.clone()?;
        Some(UserProfile {
            id,
            email,
            name: cb.name.clone(),
            role: "user".to_string(),
            is_active: true,
            created_at: Utc::now(),
        })
    }
}
