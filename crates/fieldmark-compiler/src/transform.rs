/*
 * transform.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Normalized-template rewrites.
//!
//! [`atomize_template`] produces the compiled template: every field
//! container keeps its ID but its runs are replaced by a single run holding
//! the field's atomized rendition, so compiled output carries atoms instead
//! of author expressions. [`flat_preview`] goes the other way for human
//! review: containers are unwrapped back into their plain runs, paired with
//! a field map from ID to canonical field text.

use std::collections::BTreeMap;

use fieldmark_doctree::{
    Block, Document, FieldContainer, Inline, Paragraph, Run, RunContent, Table, TableCell,
    TableRow,
};

use crate::error::{CompileError, CompileResult};
use crate::parse::FieldDescriptor;

/// Rewrite a normalized document so each container holds its atomized
/// rendition, formatting preserved from the container's first run.
pub fn atomize_template(
    document: &Document,
    dictionary: &BTreeMap<u32, FieldDescriptor>,
) -> CompileResult<Document> {
    Ok(Document::new(atomize_blocks(&document.body, dictionary)?))
}

fn atomize_blocks(
    blocks: &[Block],
    dictionary: &BTreeMap<u32, FieldDescriptor>,
) -> CompileResult<Vec<Block>> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(paragraph) => {
                let inlines = paragraph
                    .inlines
                    .iter()
                    .map(|inline| atomize_inline(inline, dictionary))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Block::Paragraph(Paragraph {
                    props: paragraph.props.clone(),
                    inlines,
                }))
            }
            Block::Table(table) => {
                let rows = table
                    .rows
                    .iter()
                    .map(|row| {
                        let cells = row
                            .cells
                            .iter()
                            .map(|cell| {
                                atomize_blocks(&cell.blocks, dictionary)
                                    .map(|blocks| TableCell { blocks })
                            })
                            .collect::<CompileResult<Vec<_>>>()?;
                        Ok(TableRow { cells })
                    })
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Block::Table(Table { rows }))
            }
        })
        .collect()
}

fn atomize_inline(
    inline: &Inline,
    dictionary: &BTreeMap<u32, FieldDescriptor>,
) -> CompileResult<Inline> {
    match inline {
        Inline::Field(container) => {
            let Some(descriptor) = dictionary.get(&container.id) else {
                return Err(CompileError::internal(format!(
                    "field {} missing from the dictionary during template compilation",
                    container.id
                )));
            };
            let props = container.runs.first().and_then(|run| run.props.clone());
            Ok(Inline::Field(FieldContainer {
                id: container.id,
                runs: vec![Run::styled_text(descriptor.atomized_text(), props)],
            }))
        }
        Inline::Run(run) => {
            let content = run
                .content
                .iter()
                .map(|item| match item {
                    RunContent::TextBox(blocks) => {
                        atomize_blocks(blocks, dictionary).map(RunContent::TextBox)
                    }
                    other => Ok(other.clone()),
                })
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(Inline::Run(Run {
                props: run.props.clone(),
                deleted: run.deleted,
                content,
            }))
        }
    }
}

/// Unwrap every field container back into its runs, producing a plain
/// reviewer-friendly document.
pub fn flat_preview(document: &Document) -> Document {
    Document::new(preview_blocks(&document.body))
}

fn preview_blocks(blocks: &[Block]) -> Vec<Block> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(paragraph) => {
                let mut inlines = Vec::with_capacity(paragraph.inlines.len());
                for inline in &paragraph.inlines {
                    match inline {
                        Inline::Field(container) => {
                            inlines.extend(container.runs.iter().cloned().map(Inline::Run));
                        }
                        Inline::Run(run) => inlines.push(Inline::Run(preview_run(run))),
                    }
                }
                Block::Paragraph(Paragraph {
                    props: paragraph.props.clone(),
                    inlines,
                })
            }
            Block::Table(table) => Block::Table(Table {
                rows: table
                    .rows
                    .iter()
                    .map(|row| TableRow {
                        cells: row
                            .cells
                            .iter()
                            .map(|cell| TableCell {
                                blocks: preview_blocks(&cell.blocks),
                            })
                            .collect(),
                    })
                    .collect(),
            }),
        })
        .collect()
}

fn preview_run(run: &Run) -> Run {
    Run {
        props: run.props.clone(),
        deleted: run.deleted,
        content: run
            .content
            .iter()
            .map(|item| match item {
                RunContent::TextBox(blocks) => RunContent::TextBox(preview_blocks(blocks)),
                other => other.clone(),
            })
            .collect(),
    }
}

/// Field map accompanying the flat preview: ID to canonical field text.
pub fn preview_field_map(dictionary: &BTreeMap<u32, FieldDescriptor>) -> BTreeMap<u32, String> {
    dictionary
        .iter()
        .map(|(&id, descriptor)| (id, descriptor.text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_document;
    use crate::parse::{build_field_dictionary, parse_fields};
    use crate::recognize::FieldRecognizer;
    use pretty_assertions::assert_eq;

    fn prepared(text: &str) -> (Document, BTreeMap<u32, FieldDescriptor>) {
        let doc = Document::new(vec![Block::Paragraph(Paragraph::new(vec![Inline::Run(
            Run::text(text),
        )]))]);
        let recognizer = FieldRecognizer::standard().unwrap();
        let normalized = normalize_document(&doc, &recognizer).unwrap();
        let mut ast = parse_fields(&normalized.extracted_fields).unwrap();
        let dictionary = build_field_dictionary(&mut ast).unwrap();
        (normalized.document, dictionary)
    }

    fn container_texts(document: &Document) -> Vec<String> {
        let mut texts = Vec::new();
        for block in &document.body {
            let Block::Paragraph(para) = block else {
                continue;
            };
            for inline in &para.inlines {
                if let Inline::Field(container) = inline {
                    let text: String = container
                        .runs
                        .iter()
                        .flat_map(|run| run.content.iter())
                        .filter_map(|item| match item {
                            RunContent::Text(text) => Some(text.as_str()),
                            _ => None,
                        })
                        .collect();
                    texts.push(text);
                }
            }
        }
        texts
    }

    #[test]
    fn test_atomizes_container_content() {
        let (normalized, dictionary) = prepared("{[if x]}{[Name]}{[endif]}");
        let compiled = atomize_template(&normalized, &dictionary).unwrap();
        assert_eq!(container_texts(&compiled), vec!["if C1", "C2", "endif"]);
    }

    #[test]
    fn test_endlist_rendition_carries_list_atom() {
        let (normalized, dictionary) = prepared("{[list People]}{[Name]}{[endlist]}");
        let compiled = atomize_template(&normalized, &dictionary).unwrap();
        assert_eq!(
            container_texts(&compiled),
            vec!["list L1", "C2", "endlistL1"]
        );
    }

    #[test]
    fn test_atomized_container_keeps_id_and_props() {
        let doc = Document::new(vec![Block::Paragraph(Paragraph::new(vec![Inline::Run(
            Run::styled_text("{[Name]}", Some("<b/>".to_string())),
        )]))]);
        let recognizer = FieldRecognizer::standard().unwrap();
        let normalized = normalize_document(&doc, &recognizer).unwrap();
        let mut ast = parse_fields(&normalized.extracted_fields).unwrap();
        let dictionary = build_field_dictionary(&mut ast).unwrap();
        let compiled = atomize_template(&normalized.document, &dictionary).unwrap();
        let Block::Paragraph(para) = &compiled.body[0] else {
            panic!("expected paragraph");
        };
        let Inline::Field(container) = &para.inlines[0] else {
            panic!("expected container");
        };
        assert_eq!(container.id, 1);
        assert_eq!(
            container.runs,
            vec![Run::styled_text("C1", Some("<b/>".to_string()))]
        );
    }

    #[test]
    fn test_missing_dictionary_entry_is_internal() {
        let (normalized, mut dictionary) = prepared("{[Name]}");
        dictionary.clear();
        let err = atomize_template(&normalized, &dictionary).unwrap_err();
        assert_eq!(
            err.to_string(),
            "internal error: field 1 missing from the dictionary during template compilation"
        );
    }

    #[test]
    fn test_flat_preview_unwraps_containers() {
        let (normalized, _) = prepared("Hello {[Name]}!");
        let preview = flat_preview(&normalized);
        let Block::Paragraph(para) = &preview.body[0] else {
            panic!("expected paragraph");
        };
        assert!(para
            .inlines
            .iter()
            .all(|inline| matches!(inline, Inline::Run(_))));
        let text: String = para
            .inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::Run(run) => Some(run),
                Inline::Field(_) => None,
            })
            .flat_map(|run| run.content.iter())
            .filter_map(|item| match item {
                RunContent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Hello [Name]!");
    }

    #[test]
    fn test_preview_field_map_uses_canonical_text() {
        let (_, dictionary) = prepared("{[if x]}{[Name]}{[endif]}");
        let map = preview_field_map(&dictionary);
        assert_eq!(map.get(&1).map(String::as_str), Some("if x"));
        assert_eq!(map.get(&2).map(String::as_str), Some("Name"));
        assert_eq!(map.get(&3).map(String::as_str), Some("endif"));
    }
}
