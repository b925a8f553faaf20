//! Insider Trends terminal client: debounced post search with a snapshot
//! cache, a persisted watchlist, and token-based session bootstrap against
//! the Insider Trends REST API.

pub mod api_client;
pub mod app_paths;
pub mod cache;
pub mod config;
pub mod export;
pub mod health;
pub mod logging;
pub mod models;
pub mod notes;
pub mod search_controller;
pub mod session;
pub mod table_display;
pub mod tui_app;
pub mod watchlist;
pub mod widgets;
