//! History list ordering and preview helpers.
use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime};

use crate::model::HistoryRecord;

/// Preview length of the answer text in the history list, in characters.
pub const PREVIEW_CHARS: usize = 30;

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a record timestamp. The backend writes local wall-clock time; RFC
/// 3339 stamps are accepted too and compared by their UTC instant.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|stamp| stamp.naive_utc())
        })
}

/// Sorts most recent first. Records whose timestamp does not parse keep their
/// relative order after all parseable ones.
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| {
        match (parse_timestamp(&a.timestamp), parse_timestamp(&b.timestamp)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// First `limit` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
