// Heading outline extraction for the note navigation pane.
//
// Only levels 1-3 participate; deeper headings are navigation noise.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

const MAX_OUTLINE_LEVEL: u8 = 3;

/// One entry in a note's outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteHeading {
    /// Stable within one extraction: "heading-0", "heading-1", ...
    pub id: String,
    /// Heading level (1-3).
    pub level: u8,
    pub text: String,
    /// Byte offset of the heading start in the source text.
    pub start: usize,
}

/// Extract the level 1-3 headings from markdown, in document order.
pub fn extract_outline(markdown: &str) -> Vec<NoteHeading> {
    let mut headings = Vec::new();
    let mut current: Option<NoteHeading> = None;

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let level = level_to_u8(level);
                if level > MAX_OUTLINE_LEVEL {
                    current = None;
                    continue;
                }
                current = Some(NoteHeading {
                    id: format!("heading-{}", headings.len()),
                    level,
                    text: String::new(),
                    start: range.start,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.text = heading.text.trim().to_string();
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

/// The id of the heading whose section contains `cursor`, i.e. the last
/// heading starting at or before it. None when the cursor sits above the
/// first heading.
pub fn find_active_heading(headings: &[NoteHeading], cursor: usize) -> Option<&str> {
    headings
        .iter()
        .rev()
        .find(|heading| heading.start <= cursor)
        .map(|heading| heading.id.as_str())
}

fn level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
