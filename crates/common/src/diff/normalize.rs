// Comparison-ready plain text from note snapshots.
//
// Prefers the canonical markdown source when present and non-blank;
// otherwise strips markup from the rendered content.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::NoteSnapshot;

/// Default preview length for compact one-line renderings.
pub const PREVIEW_LEN: usize = 220;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern should compile"))
}

/// Strip markup tags and decode the handful of entities rich-text editors
/// emit. Good enough for comparison text; never used for rendering.
pub fn strip_markup(markup: &str) -> String {
    tag_pattern()
        .replace_all(markup, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Derive the comparison text for a snapshot: the canonical markdown
/// source verbatim when it has any visible content, else the rendered
/// content with markup stripped.
pub fn comparable_text(snapshot: &NoteSnapshot) -> String {
    match snapshot.markdown_source.as_deref() {
        Some(source) if !source.trim().is_empty() => source.trim().to_string(),
        _ => strip_markup(&snapshot.content),
    }
}

/// Truncate for display. Empty input renders as a placeholder.
pub fn preview_text(input: &str, max_len: usize) -> String {
    if input.is_empty() {
        return "(empty)".to_string();
    }
    if input.chars().count() > max_len {
        let head: String = input.chars().take(max_len).collect();
        format!("{head}...")
    } else {
        input.to_string()
    }
}

/// Derive a title from rendered content: strip markup, keep the first 30
/// characters, preferring a break at punctuation or a space past 60% of
/// the limit. Returns None when the content has no visible text.
pub fn generate_title(content: &str) -> Option<String> {
    const MAX_LEN: usize = 30;

    let plain = strip_markup(content);
    let plain = plain.trim();
    if plain.is_empty() {
        return None;
    }

    let chars: Vec<char> = plain.chars().collect();
    if chars.len() <= MAX_LEN {
        return Some(plain.to_string());
    }

    let truncated = &chars[..MAX_LEN];
    let break_floor = MAX_LEN * 3 / 5;
    let last_punctuation = truncated
        .iter()
        .rposition(|ch| matches!(ch, '，' | '。' | '、' | ',' | '.'));
    let last_space = truncated.iter().rposition(|ch| *ch == ' ');

    let cut = match (last_punctuation, last_space) {
        (Some(p), _) if p > break_floor => p,
        (_, Some(s)) if s > break_floor => s,
        _ => MAX_LEN,
    };

    let head: String = truncated[..cut].iter().collect();
    Some(format!("{head}..."))
}
