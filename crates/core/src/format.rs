//! Display structure for generated text.
//!
//! Models answer in loose Markdown. The view does not render Markdown, so the
//! markers are stripped here and the only structure kept is whether a line
//! reads as a heading.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*").unwrap());
static BULLET_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\*\s*").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLine {
    pub kind: LineKind,
    pub text: String,
}

/// Removes bold, heading, bullet and stray emphasis markers.
pub fn strip_markup(text: &str) -> String {
    let text = text.replace("**", "");
    let text = HEADING_MARKER.replace_all(&text, "");
    let text = BULLET_MARKER.replace_all(&text, "");
    text.replace('*', "").trim().to_string()
}

fn is_heading(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("**") || NUMBERED.is_match(line)
}

/// Splits topic content into non-blank display lines.
///
/// A line is a heading when it starts with `#`, `**` or a `1.` style number.
pub fn topic_lines(content: &str) -> Vec<TopicLine> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let text = strip_markup(line);
            if text.is_empty() {
                return None;
            }
            let kind = if is_heading(line) {
                LineKind::Heading
            } else {
                LineKind::Body
            };
            Some(TopicLine { kind, text })
        })
        .collect()
}
