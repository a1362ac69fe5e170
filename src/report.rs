//! Plain-text inventory of stored keyword rows, for checking what the
//! database holds without going through the web UI.

use std::fmt::Write;

use crate::db::KeywordRecord;
use crate::service::keywords::keyword_lines;

const PREVIEW_CHARS: usize = 100;

pub fn render(rows: &[KeywordRecord]) -> String {
    let mut out = String::from("\n=== Stored keyword data ===\n\n");
    if rows.is_empty() {
        out.push_str("No keyword data.\n");
        return out;
    }

    for row in rows {
        let count = keyword_lines(&row.keywords).count();
        let preview = if row.keywords.is_empty() {
            "(none)".to_string()
        } else {
            row.keywords.chars().take(PREVIEW_CHARS).collect()
        };
        // writing into a String cannot fail
        let _ = writeln!(out, "Exam: {}", row.exam_id);
        let _ = writeln!(out, "Subject: {}", row.subject);
        let _ = writeln!(out, "Keyword count: {count}");
        let _ = writeln!(out, "Preview: {preview}");
        out.push_str("---\n\n");
    }
    out
}
