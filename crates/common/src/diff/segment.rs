// Paragraph-granularity segmentation for diff alignment.
//
// Blocks split on blank-line runs. Two blocks whose normalized label
// keys match are treated as the same paragraph even when their bodies
// differ, so a rewritten paragraph surfaces as modified rather than as
// a removal plus an addition.

use std::sync::OnceLock;

use regex::Regex;

/// Labels longer than this are ellipsized.
const LABEL_MAX_LEN: usize = 40;

fn blank_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n{2,}").expect("blank line pattern should compile"))
}

/// One paragraph of comparison text. Ephemeral: lives for a single diff
/// call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Positional id: "b-0", "b-1", ...
    pub id: String,
    /// First non-blank line, ellipsized past 40 chars, or "Block N".
    pub label: String,
    pub text: String,
    /// Normalized label used for block alignment.
    pub key: String,
}

/// Lower-case a label and keep only letters, digits, whitespace, `#`
/// and `-`, then collapse whitespace runs.
pub fn normalize_key(label: &str) -> String {
    let filtered: String = label
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace() || *ch == '#' || *ch == '-')
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn label_for(text: &str, fallback: String) -> String {
    let first_line = text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("");
    if first_line.is_empty() {
        return fallback;
    }
    if first_line.chars().count() > LABEL_MAX_LEN {
        let head: String = first_line.chars().take(LABEL_MAX_LEN).collect();
        format!("{head}...")
    } else {
        first_line.to_string()
    }
}

/// Split comparison text into paragraph blocks. Line endings are
/// normalized and blank pieces dropped; empty input yields no blocks.
pub fn split_into_blocks(text: &str) -> Vec<TextBlock> {
    let normalized = text.replace("\r\n", "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return Vec::new();
    }

    blank_line_pattern()
        .split(normalized)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .map(|(idx, piece)| {
            let label = label_for(piece, format!("Block {}", idx + 1));
            TextBlock {
                id: format!("b-{idx}"),
                key: normalize_key(&label),
                label,
                text: piece.to_string(),
            }
        })
        .collect()
}
