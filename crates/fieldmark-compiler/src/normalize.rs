/*
 * normalize.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Template normalization.
//!
//! Rewrites a document so every recognized field is wrapped in a uniform
//! [`FieldContainer`] carrying a sequential ID, without changing anything
//! else a reader would see. Field boundaries rarely align with run
//! boundaries in real documents (editors split text arbitrarily while
//! tracking spelling state and formatting), so each paragraph goes through
//! two phases: split runs so every match boundary lands exactly between two
//! runs, then replace each matched run range with its container. Both
//! phases rebuild the paragraph rather than mutating it in place.
//!
//! Containers already present pass through and re-register their content,
//! so normalizing an already-normalized document reproduces the same tree
//! and the same extracted-fields JSON.

use fieldmark_doctree::{
    Block, Document, FieldContainer, Inline, Paragraph, Run, RunContent, Table, TableCell,
    TableRow,
};
use tracing::debug;

use crate::accumulate::FieldAccumulator;
use crate::error::{CompileError, CompileResult};
use crate::flatten::{flatten_paragraph, FlattenedParagraph};
use crate::recognize::FieldRecognizer;

/// A normalized document plus its extracted-fields JSON.
#[derive(Debug, Clone)]
pub struct NormalizeResult {
    pub document: Document,
    pub extracted_fields: String,
    pub field_count: u32,
}

/// Normalize every paragraph of `document`, wrapping recognized fields in
/// ID-tagged containers and extracting their content in document order.
pub fn normalize_document(
    document: &Document,
    recognizer: &FieldRecognizer,
) -> CompileResult<NormalizeResult> {
    if has_tracked_revisions(&document.body) {
        return Err(CompileError::invalid_template(
            "Invalid template - contains tracked revisions",
        ));
    }
    let mut accumulator = FieldAccumulator::new();
    accumulator.begin_block();
    let body = normalize_blocks(&document.body, recognizer, &mut accumulator)?;
    accumulator.end_block()?;
    let extracted_fields = accumulator.to_json()?;
    debug!(fields = accumulator.field_count(), "normalized document");
    Ok(NormalizeResult {
        document: Document::new(body),
        extracted_fields,
        field_count: accumulator.field_count(),
    })
}

fn has_tracked_revisions(blocks: &[Block]) -> bool {
    blocks.iter().any(|block| match block {
        Block::Paragraph(paragraph) => paragraph.inlines.iter().any(|inline| match inline {
            Inline::Run(run) => run_has_tracked_revisions(run),
            Inline::Field(field) => field.runs.iter().any(run_has_tracked_revisions),
        }),
        Block::Table(table) => table
            .rows
            .iter()
            .any(|row| row.cells.iter().any(|cell| has_tracked_revisions(&cell.blocks))),
    })
}

fn run_has_tracked_revisions(run: &Run) -> bool {
    if run.deleted {
        return true;
    }
    run.content.iter().any(|item| match item {
        RunContent::TextBox(blocks) => has_tracked_revisions(blocks),
        _ => false,
    })
}

fn normalize_blocks(
    blocks: &[Block],
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Vec<Block>> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(paragraph) => {
                normalize_paragraph(paragraph, recognizer, accumulator).map(Block::Paragraph)
            }
            Block::Table(table) => normalize_table(table, recognizer, accumulator).map(Block::Table),
        })
        .collect()
}

fn normalize_table(
    table: &Table,
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Table> {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let cells = row
                .cells
                .iter()
                .map(|cell| {
                    normalize_blocks(&cell.blocks, recognizer, accumulator)
                        .map(|blocks| TableCell { blocks })
                })
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(TableRow { cells })
        })
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(Table { rows })
}

/// Each paragraph is one accumulator block, wherever it nests.
fn normalize_paragraph(
    paragraph: &Paragraph,
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Paragraph> {
    accumulator.begin_block();
    let normalized = normalize_paragraph_content(paragraph, recognizer, accumulator)?;
    accumulator.end_block()?;
    Ok(normalized)
}

fn normalize_paragraph_content(
    paragraph: &Paragraph,
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Paragraph> {
    let flat = flatten_paragraph(paragraph);
    if !flat.text.contains(recognizer.combined_begin()) {
        return rebuild_without_fields(paragraph, recognizer, accumulator);
    }
    let split = split_at_field_boundaries(paragraph, &flat, recognizer);
    let reflat = flatten_paragraph(&split);
    if reflat.text != flat.text {
        return Err(CompileError::internal(
            "run splitting changed the paragraph's flattened text",
        ));
    }
    let matches: Vec<(usize, usize)> = recognizer
        .pattern()
        .find_iter(&reflat.text)
        .map(|found| (found.start(), found.end()))
        .collect();
    if matches.is_empty() {
        return rebuild_without_fields(&split, recognizer, accumulator);
    }
    replace_fields(&split, &reflat, &matches, recognizer, accumulator)
}

/// Rebuild the paragraph so every match boundary falls between two runs.
///
/// Runs not intersected by a boundary are kept exactly as they are. A mixed
/// run (text interleaved with tab/break markers) is first decomposed into
/// one run per content item so only text fragments are ever range-split;
/// markers have no interior offsets and can never be cut.
fn split_at_field_boundaries(
    paragraph: &Paragraph,
    flat: &FlattenedParagraph,
    recognizer: &FieldRecognizer,
) -> Paragraph {
    let mut points: Vec<usize> = Vec::new();
    for found in recognizer.pattern().find_iter(&flat.text) {
        points.push(found.start());
        points.push(found.end());
    }
    points.sort_unstable();
    points.dedup();

    let mut inlines = Vec::with_capacity(paragraph.inlines.len());
    let mut spans = flat.spans.iter().peekable();
    for (index, inline) in paragraph.inlines.iter().enumerate() {
        let Inline::Run(run) = inline else {
            inlines.push(inline.clone());
            continue;
        };
        let Some(span) = spans.next_if(|span| span.inline == index) else {
            // deleted runs are invisible to matching
            inlines.push(inline.clone());
            continue;
        };
        if !points.iter().any(|&p| span.start < p && p < span.end) {
            inlines.push(inline.clone());
            continue;
        }
        if run.is_mixed() {
            for (item, item_span) in run.content.iter().zip(&span.items) {
                match item {
                    RunContent::Text(text) => {
                        split_text_item(text, item_span.start, &points, run, &mut inlines);
                    }
                    RunContent::PageHint => {}
                    other => inlines.push(Inline::Run(Run {
                        props: run.props.clone(),
                        deleted: run.deleted,
                        content: vec![other.clone()],
                    })),
                }
            }
        } else if let Some(RunContent::Text(text)) = run.content.first() {
            split_text_item(text, span.start, &points, run, &mut inlines);
        } else {
            inlines.push(inline.clone());
        }
    }
    Paragraph {
        props: paragraph.props.clone(),
        inlines,
    }
}

fn split_text_item(
    text: &str,
    start: usize,
    points: &[usize],
    run: &Run,
    inlines: &mut Vec<Inline>,
) {
    let end = start + text.len();
    let mut cut = 0;
    let mut fragments: Vec<&str> = Vec::new();
    for &point in points.iter().filter(|&&p| start < p && p < end) {
        let relative = point - start;
        if relative > cut {
            fragments.push(&text[cut..relative]);
        }
        cut = relative;
    }
    if cut < text.len() {
        fragments.push(&text[cut..]);
    }
    for fragment in fragments {
        inlines.push(Inline::Run(Run {
            props: run.props.clone(),
            deleted: run.deleted,
            content: vec![RunContent::Text(fragment.to_string())],
        }));
    }
}

/// Forward walk over a split paragraph: register every field (raw match or
/// pre-existing container) in document order so IDs follow reading order,
/// replacing each matched run range with its container as it is passed.
fn replace_fields(
    paragraph: &Paragraph,
    flat: &FlattenedParagraph,
    matches: &[(usize, usize)],
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Paragraph> {
    let mut span_of = vec![None; paragraph.inlines.len()];
    for span in &flat.spans {
        span_of[span.inline] = Some(span);
    }

    let mut inlines: Vec<Inline> = Vec::with_capacity(paragraph.inlines.len());
    let mut registered = 0u32;
    let mut raw_span: Option<(usize, usize)> = None;
    let mut pending = matches.iter().copied().peekable();
    let mut index = 0;
    while index < paragraph.inlines.len() {
        let run = match &paragraph.inlines[index] {
            Inline::Field(container) => {
                inlines.push(reregister_container(
                    container,
                    recognizer,
                    accumulator,
                    &mut registered,
                ));
                index += 1;
                continue;
            }
            Inline::Run(run) => run,
        };
        let begins = match (span_of[index], pending.peek()) {
            (Some(span), Some(&(start, _))) => span.start == start && span.end > span.start,
            _ => false,
        };
        let Some((start, end)) = (if begins { pending.next() } else { None }) else {
            inlines.push(Inline::Run(rebuild_run(run, recognizer, accumulator)?));
            index += 1;
            continue;
        };

        let stripped = recognizer.strip_embedding(&flat.text[start..end]);
        let Some(content) = recognizer.is_field(stripped) else {
            // a match that fails field validation is left as plain text
            inlines.push(Inline::Run(rebuild_run(run, recognizer, accumulator)?));
            index += 1;
            continue;
        };

        let field_id = accumulator.add_field(&content);
        registered += 1;
        raw_span = Some((start, end));
        let container_run = Run {
            props: run.props.clone(),
            deleted: false,
            content: vec![RunContent::Text(recognizer.wrap(&content))],
        };
        let mut boxed = run.has_text_box();
        let mut range_done = span_of[index].map(|span| span.end >= end).unwrap_or(false);
        let mut interior: Vec<&FieldContainer> = Vec::new();
        index += 1;
        while !range_done && index < paragraph.inlines.len() {
            match &paragraph.inlines[index] {
                Inline::Run(next) => match span_of[index] {
                    Some(next_span) if next_span.start < end && next_span.end > start => {
                        boxed = boxed || next.has_text_box();
                        range_done = next_span.end >= end;
                        index += 1;
                    }
                    _ => break,
                },
                Inline::Field(inner) => {
                    interior.push(inner);
                    index += 1;
                }
            }
        }
        if boxed {
            return Err(CompileError::invalid_template(
                "Invalid template - contains a text box inside a field",
            ));
        }
        inlines.push(Inline::Field(FieldContainer {
            id: field_id,
            runs: vec![container_run],
        }));
        for inner in interior {
            inlines.push(reregister_container(
                inner,
                recognizer,
                accumulator,
                &mut registered,
            ));
        }
    }
    if pending.peek().is_some() {
        return Err(CompileError::internal(
            "field match did not align with run boundaries after splitting",
        ));
    }

    // a paragraph holding exactly one field plus other visible text keeps
    // its block from collapsing to the bare field
    if registered == 1 {
        let non_field = match raw_span {
            Some((start, end)) => format!("{}{}", &flat.text[..start], &flat.text[end..]),
            None => flat.text.clone(),
        };
        if !non_field.trim().is_empty() {
            accumulator.register_other_content();
        }
    }

    Ok(Paragraph {
        props: paragraph.props.clone(),
        inlines: coalesce_runs(inlines),
    })
}

/// Re-register a pre-existing container's content so re-extraction yields
/// the same ID sequence. A container whose text no longer validates is kept
/// untouched and unregistered.
fn reregister_container(
    container: &FieldContainer,
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
    registered: &mut u32,
) -> Inline {
    let text: String = container
        .runs
        .iter()
        .flat_map(|run| run.content.iter())
        .filter_map(|item| match item {
            RunContent::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    match recognizer.is_field(&text) {
        Some(content) => {
            let id = accumulator.add_field(content);
            *registered += 1;
            Inline::Field(FieldContainer {
                id,
                runs: container.runs.clone(),
            })
        }
        None => Inline::Field(container.clone()),
    }
}

/// Rebuild an unmatched run: drop pagination hints and normalize text-box
/// content as nested independent units.
fn rebuild_run(
    run: &Run,
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Run> {
    let mut content = Vec::with_capacity(run.content.len());
    for item in &run.content {
        match item {
            RunContent::PageHint => {}
            RunContent::TextBox(blocks) => {
                content.push(RunContent::TextBox(normalize_blocks(
                    blocks,
                    recognizer,
                    accumulator,
                )?));
            }
            other => content.push(other.clone()),
        }
    }
    Ok(Run {
        props: run.props.clone(),
        deleted: run.deleted,
        content,
    })
}

/// No-field path: register non-whitespace text as other block content, pass
/// containers through (re-registering them), and still recurse into text
/// boxes.
fn rebuild_without_fields(
    paragraph: &Paragraph,
    recognizer: &FieldRecognizer,
    accumulator: &mut FieldAccumulator,
) -> CompileResult<Paragraph> {
    let mut reregistered = 0u32;
    let mut inlines = Vec::with_capacity(paragraph.inlines.len());
    for inline in &paragraph.inlines {
        match inline {
            Inline::Field(container) => {
                inlines.push(reregister_container(
                    container,
                    recognizer,
                    accumulator,
                    &mut reregistered,
                ));
            }
            Inline::Run(run) => {
                let has_text = run
                    .content
                    .iter()
                    .any(|item| matches!(item, RunContent::Text(text) if !text.trim().is_empty()));
                if has_text {
                    accumulator.register_other_content();
                }
                inlines.push(Inline::Run(rebuild_run(run, recognizer, accumulator)?));
            }
        }
    }
    Ok(Paragraph {
        props: paragraph.props.clone(),
        inlines,
    })
}

/// Merge adjacent runs with byte-identical properties and matching deletion
/// flags; adjacent text items inside the merged run fuse.
fn coalesce_runs(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        let Inline::Run(run) = inline else {
            merged.push(inline);
            continue;
        };
        match merged.last_mut() {
            Some(Inline::Run(last)) if last.props == run.props && last.deleted == run.deleted => {
                for item in run.content {
                    match (last.content.last_mut(), item) {
                        (Some(RunContent::Text(tail)), RunContent::Text(text)) => {
                            tail.push_str(&text);
                        }
                        (_, item) => last.content.push(item),
                    }
                }
            }
            _ => merged.push(Inline::Run(run)),
        }
    }
    merged
}
