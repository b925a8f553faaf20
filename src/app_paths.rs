use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Well-known locations for everything the client persists locally.
///
/// An override root (used by tests and the `TRENDS_CLI_HOME` variable) puts
/// all files under a single directory instead of the platform dirs.
pub struct AppPaths;

const APP_DIR: &str = "trends-cli";

impl AppPaths {
    fn override_root() -> Option<PathBuf> {
        std::env::var_os("TRENDS_CLI_HOME").map(PathBuf::from)
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dir = match Self::override_root() {
            Some(root) => root,
            None => dirs::data_dir()
                .context("cannot determine data directory")?
                .join(APP_DIR),
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let dir = match Self::override_root() {
            Some(root) => root,
            None => dirs::config_dir()
                .context("cannot determine config directory")?
                .join(APP_DIR),
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// The persisted watchlist, a JSON array of watch items.
    pub fn watchlist_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("watchlist.json"))
    }

    /// The bearer token, stored as a bare string.
    pub fn token_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("token"))
    }

    /// Free-form business notes.
    pub fn notes_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("notes.txt"))
    }
}
