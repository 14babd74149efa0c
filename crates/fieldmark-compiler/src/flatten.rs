/*
 * flatten.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Paragraph text flattening with position mapping.
//!
//! The recognizer matches against a paragraph's logical text, but edits are
//! made to the run tree. [`flatten_paragraph`] produces both at once: the
//! concatenated text of every visible run plus byte spans mapping each run
//! (and each content item inside it) back to its range in that text.
//!
//! Tabs flatten to `\t` and breaks to `\r`, one sentinel char each, so
//! byte offsets stay aligned with run content items; a match may span a
//! sentinel, in which case the marker lands inside the field content. Text
//! boxes and page hints contribute nothing. Deleted runs and field
//! containers are skipped entirely, so their content is invisible to
//! matching.

use fieldmark_doctree::{Inline, Paragraph, RunContent};

/// Byte range one run occupies in the flattened text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpan {
    /// Index of the run in the paragraph's inline list.
    pub inline: usize,
    pub start: usize,
    pub end: usize,
    /// One span per content item, in order. Indexes align with the run's
    /// content list; non-text items get zero-length spans.
    pub items: Vec<ItemSpan>,
}

/// Byte range one run content item occupies in the flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpan {
    pub start: usize,
    pub end: usize,
}

/// A paragraph's logical text plus the map from byte ranges back to runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedParagraph {
    pub text: String,
    pub spans: Vec<RunSpan>,
}

/// Flatten a paragraph's visible runs into logical text with position spans.
pub fn flatten_paragraph(paragraph: &Paragraph) -> FlattenedParagraph {
    let mut text = String::new();
    let mut spans = Vec::new();
    for (index, inline) in paragraph.inlines.iter().enumerate() {
        let Inline::Run(run) = inline else {
            continue;
        };
        if run.deleted {
            continue;
        }
        let start = text.len();
        let mut items = Vec::with_capacity(run.content.len());
        for content in &run.content {
            let item_start = text.len();
            match content {
                RunContent::Text(value) => text.push_str(value),
                RunContent::Tab => text.push('\t'),
                RunContent::Break => text.push('\r'),
                RunContent::TextBox(_) | RunContent::PageHint => {}
            }
            items.push(ItemSpan {
                start: item_start,
                end: text.len(),
            });
        }
        spans.push(RunSpan {
            inline: index,
            start,
            end: text.len(),
            items,
        });
    }
    FlattenedParagraph { text, spans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmark_doctree::{Block, FieldContainer, Run};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_concatenates_run_text() {
        let paragraph = Paragraph::new(vec![
            Inline::Run(Run::text("Hello ")),
            Inline::Run(Run::text("world")),
        ]);
        let flat = flatten_paragraph(&paragraph);
        assert_eq!(flat.text, "Hello world");
        assert_eq!(flat.spans.len(), 2);
        assert_eq!((flat.spans[0].start, flat.spans[0].end), (0, 6));
        assert_eq!((flat.spans[1].start, flat.spans[1].end), (6, 11));
        assert_eq!(flat.spans[1].inline, 1);
    }

    #[test]
    fn test_markers_flatten_to_sentinels() {
        let run = Run {
            props: None,
            deleted: false,
            content: vec![
                RunContent::Text("a".to_string()),
                RunContent::Tab,
                RunContent::Text("b".to_string()),
                RunContent::Break,
            ],
        };
        let flat = flatten_paragraph(&Paragraph::new(vec![Inline::Run(run)]));
        assert_eq!(flat.text, "a\tb\r");
        let items = &flat.spans[0].items;
        assert_eq!(items.len(), 4);
        assert_eq!(*items.get(1).unwrap(), ItemSpan { start: 1, end: 2 });
        assert_eq!(*items.get(3).unwrap(), ItemSpan { start: 3, end: 4 });
    }

    #[test]
    fn test_skips_deleted_runs_and_containers() {
        let deleted = Run {
            props: None,
            deleted: true,
            content: vec![RunContent::Text("gone".to_string())],
        };
        let container = FieldContainer {
            id: 1,
            runs: vec![Run::text("[Name]")],
        };
        let paragraph = Paragraph::new(vec![
            Inline::Run(Run::text("a")),
            Inline::Run(deleted),
            Inline::Field(container),
            Inline::Run(Run::text("b")),
        ]);
        let flat = flatten_paragraph(&paragraph);
        assert_eq!(flat.text, "ab");
        assert_eq!(flat.spans.len(), 2);
        assert_eq!(flat.spans[0].inline, 0);
        assert_eq!(flat.spans[1].inline, 3);
    }

    #[test]
    fn test_text_box_contributes_nothing() {
        let boxed = Run {
            props: None,
            deleted: false,
            content: vec![
                RunContent::Text("x".to_string()),
                RunContent::TextBox(vec![Block::Paragraph(Paragraph::new(vec![
                    Inline::Run(Run::text("inside")),
                ]))]),
                RunContent::Text("y".to_string()),
            ],
        };
        let flat = flatten_paragraph(&Paragraph::new(vec![Inline::Run(boxed)]));
        assert_eq!(flat.text, "xy");
        let items = &flat.spans[0].items;
        assert_eq!(*items.get(1).unwrap(), ItemSpan { start: 1, end: 1 });
    }

    #[test]
    fn test_empty_run_keeps_zero_length_span() {
        let empty = Run {
            props: None,
            deleted: false,
            content: vec![],
        };
        let paragraph = Paragraph::new(vec![Inline::Run(Run::text("a")), Inline::Run(empty)]);
        let flat = flatten_paragraph(&paragraph);
        assert_eq!(flat.spans.len(), 2);
        assert_eq!((flat.spans[1].start, flat.spans[1].end), (1, 1));
        assert!(flat.spans[1].items.is_empty());
    }

    #[test]
    fn test_offsets_are_byte_offsets() {
        let paragraph = Paragraph::new(vec![Inline::Run(Run::text("é")), Inline::Run(Run::text("x"))]);
        let flat = flatten_paragraph(&paragraph);
        assert_eq!((flat.spans[0].start, flat.spans[0].end), (0, 2));
        assert_eq!((flat.spans[1].start, flat.spans[1].end), (2, 3));
    }
}
