use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::app_paths::AppPaths;

/// Free-form business notes kept next to the watchlist. Plain text, loaded
/// whole, written whole.
pub struct Notes {
    file: PathBuf,
    text: String,
}

impl Notes {
    pub fn load_default() -> Result<Self> {
        Ok(Self::open(AppPaths::notes_file()?))
    }

    pub fn open(file: PathBuf) -> Self {
        let text = fs::read_to_string(&file).unwrap_or_default();
        Self { file, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn append_line(&mut self, line: &str) -> Result<()> {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.text.push('\n');
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.file, &self.text)?;
        Ok(())
    }
}
