use anyhow::Result;
use chrono::Utc;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::app_paths::AppPaths;
use crate::models::{WatchItem, WatchKind};

/// The persisted list of watched hashtags/users/niches.
///
/// The whole list lives in memory and is re-serialized to disk after every
/// mutation. Insertion order is the display order; removal is positional.
/// Duplicates are allowed.
pub struct WatchlistStore {
    items: Vec<WatchItem>,
    file: PathBuf,
    matcher: SkimMatcherV2,
}

/// A watchlist entry matched by a fuzzy filter, with its position in the
/// full list so removal still works on the filtered view.
#[derive(Debug, Clone)]
pub struct WatchMatch {
    pub index: usize,
    pub item: WatchItem,
    pub score: i64,
}

impl WatchlistStore {
    /// Load the store from the default location.
    pub fn load_default() -> Result<Self> {
        Ok(Self::open(AppPaths::watchlist_file()?))
    }

    /// Load the store from a specific file. A missing or malformed file
    /// yields an empty list; corruption is logged, never propagated.
    pub fn open(file: PathBuf) -> Self {
        let items = match fs::read_to_string(&file) {
            Ok(content) if !content.trim().is_empty() => {
                match serde_json::from_str::<Vec<WatchItem>>(&content) {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(target: "watchlist", "discarding malformed watchlist file: {}", e);
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        Self {
            items,
            file,
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Append an item stamped with the current time, then persist.
    pub fn add(&mut self, kind: WatchKind, value: &str) -> Result<&WatchItem> {
        self.items.push(WatchItem {
            kind,
            value: value.to_string(),
            created_at: Utc::now(),
        });
        self.save()?;
        Ok(self.items.last().expect("just pushed"))
    }

    /// Remove by position. Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) -> Result<Option<WatchItem>> {
        if index >= self.items.len() {
            return Ok(None);
        }
        let removed = self.items.remove(index);
        self.save()?;
        Ok(Some(removed))
    }

    pub fn items(&self) -> &[WatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fuzzy-filter the list on the watched value. An empty pattern returns
    /// everything in insertion order.
    pub fn filter(&self, pattern: &str) -> Vec<WatchMatch> {
        if pattern.is_empty() {
            return self
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| WatchMatch {
                    index,
                    item: item.clone(),
                    score: 0,
                })
                .collect();
        }

        let mut matches: Vec<WatchMatch> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                self.matcher
                    .fuzzy_match(&item.value, pattern)
                    .map(|score| WatchMatch {
                        index,
                        item: item.clone(),
                        score,
                    })
            })
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }

    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.file, content)?;
        Ok(())
    }
}
