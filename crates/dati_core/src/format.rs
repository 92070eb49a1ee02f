//! Readability formatting for recognized answer text.
//!
//! The formatter produces segments instead of markup so every surface can
//! choose its own rendering. Emphasis is only ever searched for inside
//! [`Segment::Text`], which keeps inserted markers out of later passes.
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Option letter followed by an enumeration mark or whitespace.
static OPTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-D])(\s*[.、]|\s+)").expect("option pattern"));

/// Keyword labels followed by a half- or full-width colon.
static KEYWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(正确答案|答案|解析)[:：]").expect("keyword pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Emphasis(String),
    LineBreak,
    NonBreakingSpace,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedAnswer {
    segments: Vec<Segment>,
}

impl FormattedAnswer {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Emphasized spans, in order.
    pub fn emphasized(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Emphasis(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn line_breaks(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::LineBreak))
            .count()
    }

    /// HTML rendering: `<br>`, `&nbsp;` and `<strong>` markers, text escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(&escape_html(text)),
                Segment::Emphasis(text) => {
                    out.push_str("<strong>");
                    out.push_str(&escape_html(text));
                    out.push_str("</strong>");
                }
                Segment::LineBreak => out.push_str("<br>"),
                Segment::NonBreakingSpace => out.push_str("&nbsp;"),
            }
        }
        out
    }

    /// Terminal rendering. With `styled`, emphasis uses ANSI bold; without it,
    /// emphasis is wrapped in `*`.
    pub fn to_terminal(&self, styled: bool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Emphasis(text) if styled => {
                    out.push_str("\x1b[1m");
                    out.push_str(text);
                    out.push_str("\x1b[0m");
                }
                Segment::Emphasis(text) => {
                    out.push('*');
                    out.push_str(text);
                    out.push('*');
                }
                Segment::LineBreak => out.push('\n'),
                Segment::NonBreakingSpace => out.push('\u{a0}'),
            }
        }
        out
    }
}

/// Formats answer text: line breaks, whitespace pairs, option letters, then
/// keyword labels. The order of the passes is significant.
pub fn format_answer(answer: &str) -> FormattedAnswer {
    let mut segments = Vec::new();
    for (index, line) in answer.split('\n').enumerate() {
        if index > 0 {
            segments.push(Segment::LineBreak);
        }
        push_preserving_pairs(&mut segments, line);
    }

    let segments = emphasize(segments, &OPTION_PATTERN, |caps| {
        (caps[1].to_string(), caps[2].to_string())
    });
    let segments = emphasize(segments, &KEYWORD_PATTERN, |caps| {
        (caps[1].to_string(), ":".to_string())
    });

    FormattedAnswer { segments }
}

/// Replaces each left-to-right pair of whitespace characters with two
/// non-breaking spaces; a leftover single whitespace stays as text.
fn push_preserving_pairs(segments: &mut Vec<Segment>, line: &str) {
    let mut buffer = String::new();
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() && chars.peek().is_some_and(|next| next.is_whitespace()) {
            chars.next();
            push_text(segments, std::mem::take(&mut buffer));
            segments.push(Segment::NonBreakingSpace);
            segments.push(Segment::NonBreakingSpace);
        } else {
            buffer.push(ch);
        }
    }
    push_text(segments, buffer);
}

fn emphasize<F>(segments: Vec<Segment>, pattern: &Regex, split: F) -> Vec<Segment>
where
    F: Fn(&Captures<'_>) -> (String, String),
{
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let Segment::Text(text) = segment else {
            out.push(segment);
            continue;
        };
        let mut cursor = 0;
        for caps in pattern.captures_iter(&text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_text(&mut out, text[cursor..whole.start()].to_string());
            let (emphasis, suffix) = split(&caps);
            out.push(Segment::Emphasis(emphasis));
            push_text(&mut out, suffix);
            cursor = whole.end();
        }
        push_text(&mut out, text[cursor..].to_string());
    }
    out
}

/// Appends text, merging with a preceding text segment.
fn push_text(segments: &mut Vec<Segment>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(last)) = segments.last_mut() {
        last.push_str(&text);
    } else {
        segments.push(Segment::Text(text));
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
