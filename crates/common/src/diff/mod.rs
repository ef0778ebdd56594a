// Structured approval diff between two note snapshots.
//
// Favors human-readable paragraph grouping over a minimal edit script:
// blocks align by normalized label key, so a rewritten paragraph shows
// up as one modified block instead of a removal plus an addition. The
// ordered DiffBlockView list is the engine's only output; rendering is
// the presentation layer's problem.

pub mod align;
pub mod line;
pub mod normalize;
pub mod segment;
pub mod summary;

use serde::{Deserialize, Serialize};

use crate::types::NoteSnapshot;

use align::lcs_pairs;
use line::line_diff;
use normalize::{comparable_text, preview_text};
use segment::{split_into_blocks, TextBlock};

/// Preview length for unchanged blocks, which are never fully line-diffed.
const UNCHANGED_PREVIEW_LEN: usize = 280;

/// Per-line verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOp {
    Same,
    Add,
    Del,
}

/// Per-block verdict. Exhaustive; consumers must match all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffBlockKind {
    Unchanged,
    Modified,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub op: DiffOp,
    pub text: String,
}

/// One reviewable unit of the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBlockView {
    /// "b-1:b-2" for matched or paired blocks, "b-1:removed" for pure
    /// removals, "added:b-2" for pure additions. Stable within one call.
    pub id: String,
    pub label: String,
    pub kind: DiffBlockKind,
    pub lines: Vec<DiffLine>,
}

/// Diff two snapshots via their comparison text.
pub fn diff_snapshots(before: &NoteSnapshot, after: &NoteSnapshot) -> Vec<DiffBlockView> {
    structured_diff(&comparable_text(before), &comparable_text(after))
}

/// Build the block-structured diff between two comparison texts.
///
/// Every before-block appears exactly once as unchanged, modified or
/// removed; every after-block exactly once as unchanged, modified or
/// added.
pub fn structured_diff(before_text: &str, after_text: &str) -> Vec<DiffBlockView> {
    let before_blocks = split_into_blocks(before_text);
    let after_blocks = split_into_blocks(after_text);
    let before_keys: Vec<&str> = before_blocks.iter().map(|b| b.key.as_str()).collect();
    let after_keys: Vec<&str> = after_blocks.iter().map(|b| b.key.as_str()).collect();
    let pairs = lcs_pairs(&before_keys, &after_keys);

    let mut out = Vec::new();
    let mut bi = 0;
    let mut ai = 0;
    for (pb, pa) in pairs {
        if bi < pb || ai < pa {
            pair_segments(&before_blocks[bi..pb], &after_blocks[ai..pa], &mut out);
        }

        let b = &before_blocks[pb];
        let a = &after_blocks[pa];
        if b.text == a.text {
            out.push(DiffBlockView {
                id: format!("{}:{}", b.id, a.id),
                label: a.label.clone(),
                kind: DiffBlockKind::Unchanged,
                lines: vec![DiffLine {
                    op: DiffOp::Same,
                    text: preview_text(&a.text, UNCHANGED_PREVIEW_LEN),
                }],
            });
        } else {
            out.push(DiffBlockView {
                id: format!("{}:{}", b.id, a.id),
                label: a.label.clone(),
                kind: DiffBlockKind::Modified,
                lines: line_diff(&b.text, &a.text),
            });
        }
        bi = pb + 1;
        ai = pa + 1;
    }
    if bi < before_blocks.len() || ai < after_blocks.len() {
        pair_segments(&before_blocks[bi..], &after_blocks[ai..], &mut out);
    }
    out
}

/// Handle a run of unmatched blocks between (or after) key matches.
///
/// Blocks pair positionally as modified regardless of key similarity;
/// leftovers become pure removals or additions. Positional pairing reads
/// better than presenting every unmatched block as removed plus added.
fn pair_segments(before_run: &[TextBlock], after_run: &[TextBlock], out: &mut Vec<DiffBlockView>) {
    let paired = before_run.len().min(after_run.len());
    for idx in 0..paired {
        let b = &before_run[idx];
        let a = &after_run[idx];
        out.push(DiffBlockView {
            id: format!("{}:{}", b.id, a.id),
            label: a.label.clone(),
            kind: DiffBlockKind::Modified,
            lines: line_diff(&b.text, &a.text),
        });
    }
    for b in &before_run[paired..] {
        out.push(DiffBlockView {
            id: format!("{}:removed", b.id),
            label: b.label.clone(),
            kind: DiffBlockKind::Removed,
            lines: b
                .text
                .split('\n')
                .map(|line| DiffLine { op: DiffOp::Del, text: line.to_string() })
                .collect(),
        });
    }
    for a in &after_run[paired..] {
        out.push(DiffBlockView {
            id: format!("added:{}", a.id),
            label: a.label.clone(),
            kind: DiffBlockKind::Added,
            lines: a
                .text
                .split('\n')
                .map(|line| DiffLine { op: DiffOp::Add, text: line.to_string() })
                .collect(),
        });
    }
}
