use std::fmt::Write as _;

use super::record::HistoryRecord;
use crate::util::time;

const TITLE: &str = "BatchNote annotation record";
const RULE_WIDTH: usize = 50;

/// Plain text recap of a record, written next to the metadata for people browsing the folder.
pub fn render(record: &HistoryRecord) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "Created: {}", time::display_timestamp(&record.created_at));
    let _ = writeln!(out, "Entries: {}", record.entry_count);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out);

    for entry in &record.entries {
        let _ = writeln!(out, "[{}]", entry.index);
        if !entry.is_text_only {
            let file = entry.image_file_name.as_deref().unwrap_or("(none)");
            let _ = writeln!(out, "Image: {file}");
        }
        if !entry.comment.trim().is_empty() {
            let _ = writeln!(out, "Comment: {}", entry.comment);
        }
        let _ = writeln!(out);
    }
    out
}
