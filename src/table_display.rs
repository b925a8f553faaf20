use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::models::{PostHit, SearchResponse};

/// Classic-mode output for a search response: the table plus one summary
/// line, or the no-results message.
pub fn render_hits(response: &SearchResponse) -> String {
    if response.hits.is_empty() {
        return format!("{}", "No results found.".yellow());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["author", "posted", "likes", "comments", "trend", "caption"]
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for hit in &response.hits {
        table.add_row(vec![
            hit.username.clone().unwrap_or_else(|| "-".to_string()),
            hit.posted_at.clone(),
            count_cell(hit.like_count),
            count_cell(hit.comment_count),
            hit.score_trend
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "-".to_string()),
            caption_cell(hit),
        ]);
    }

    format!("{}\n{}", table, summary_line(response))
}

pub fn display_hits(response: &SearchResponse) {
    println!("{}", render_hits(response));
}

fn count_cell(count: Option<u64>) -> String {
    match count {
        Some(n) => n.to_string(),
        None => "-".to_string(),
    }
}

fn caption_cell(hit: &PostHit) -> String {
    let caption = hit.caption.as_deref().unwrap_or("");
    let flat = caption.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 60 {
        let truncated: String = flat.chars().take(57).collect();
        format!("{}...", truncated)
    } else {
        flat
    }
}

/// One-line result summary: count plus optional timing annotation.
pub fn summary_line(response: &SearchResponse) -> String {
    let count = response.hits.len();
    let mut line = format!("{} result{}", count, if count == 1 { "" } else { "s" });
    if let Some(total) = response.estimated_total_hits {
        if total as usize > count {
            line.push_str(&format!(" of ~{}", total));
        }
    }
    if let Some(ms) = response.processing_time_ms {
        line.push_str(&format!(" · {}ms", ms));
    }
    line
}
