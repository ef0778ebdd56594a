// Coarse change statistics for compact previews.
//
// Cheap alternative to a full block diff: character counts plus
// heading and list-item line counts per side.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::NoteSnapshot;

use super::normalize::comparable_text;

fn heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s").expect("heading pattern should compile"))
}

fn list_item_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*([-*+]|\d+\.)\s").expect("list item pattern should compile")
    })
}

/// Before/after statistics over two comparison texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub before_chars: usize,
    pub after_chars: usize,
    pub delta_chars: i64,
    pub before_headings: usize,
    pub after_headings: usize,
    pub before_list_items: usize,
    pub after_list_items: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chars {} -> {} ({:+}), headings {} -> {}, lists {} -> {}",
            self.before_chars,
            self.after_chars,
            self.delta_chars,
            self.before_headings,
            self.after_headings,
            self.before_list_items,
            self.after_list_items,
        )
    }
}

/// Summarize the change between two snapshots via their comparison text.
pub fn summarize_change(before: &NoteSnapshot, after: &NoteSnapshot) -> ChangeSummary {
    summarize_texts(&comparable_text(before), &comparable_text(after))
}

pub fn summarize_texts(before: &str, after: &str) -> ChangeSummary {
    let before_chars = before.chars().count();
    let after_chars = after.chars().count();
    ChangeSummary {
        before_chars,
        after_chars,
        delta_chars: after_chars as i64 - before_chars as i64,
        before_headings: heading_pattern().find_iter(before).count(),
        after_headings: heading_pattern().find_iter(after).count(),
        before_list_items: list_item_pattern().find_iter(before).count(),
        after_list_items: list_item_pattern().find_iter(after).count(),
    }
}
