use anyhow::{Context, Result};
use std::path::Path;

use crate::models::PostHit;

/// Write search hits to a CSV file. Returns the number of rows written.
pub fn export_hits_csv(path: &Path, hits: &[PostHit]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    writer.write_record([
        "id",
        "platform",
        "username",
        "posted_at",
        "like_count",
        "comment_count",
        "view_count",
        "score_trend",
        "hashtags",
        "permalink",
        "caption",
    ])?;

    for hit in hits {
        writer.write_record([
            hit.id.as_str(),
            hit.platform.as_str(),
            hit.username.as_deref().unwrap_or(""),
            hit.posted_at.as_str(),
            &opt_count(hit.like_count),
            &opt_count(hit.comment_count),
            &opt_count(hit.view_count),
            &hit
                .score_trend
                .map(|s| s.to_string())
                .unwrap_or_default(),
            &hit.hashtags.join(","),
            hit.permalink.as_str(),
            &flatten(hit.caption.as_deref().unwrap_or("")),
        ])?;
    }

    writer.flush()?;
    Ok(hits.len())
}

fn opt_count(count: Option<u64>) -> String {
    count.map(|n| n.to_string()).unwrap_or_default()
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
