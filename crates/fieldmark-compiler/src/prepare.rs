/*
 * prepare.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! One-call template preparation.
//!
//! Runs the full pipeline over a parsed document: normalize (extracting
//! fields), parse the extracted list into an AST, build the field
//! dictionary with atoms, compile the atomized template, and optionally
//! reduce the logic tree and render the flat preview. Everything a caller
//! needs comes back in one [`PrepareResult`].

use std::collections::BTreeMap;

use fieldmark_doctree::Document;
use tracing::info;

use crate::error::CompileResult;
use crate::logic::{build_logic_tree, FieldLogicNode};
use crate::normalize::normalize_document;
use crate::parse::{build_field_dictionary, parse_fields, FieldDescriptor};
use crate::recognize::FieldRecognizer;
use crate::transform::{atomize_template, flat_preview, preview_field_map};

/// Options for [`prepare_template`].
#[derive(Debug)]
pub struct PrepareOptions {
    pub recognizer: FieldRecognizer,
    /// Reduce and return the logic tree (on by default).
    pub generate_logic_tree: bool,
    /// Also render the container-free preview document and its field map.
    pub generate_flat_preview: bool,
}

impl PrepareOptions {
    /// Standard delimiters, logic tree on, preview off.
    pub fn standard() -> CompileResult<Self> {
        Ok(PrepareOptions {
            recognizer: FieldRecognizer::standard()?,
            generate_logic_tree: true,
            generate_flat_preview: false,
        })
    }
}

/// Everything produced by one [`prepare_template`] run.
#[derive(Debug)]
pub struct PrepareResult {
    /// The normalized template: every field wrapped in an ID-tagged
    /// container, author expressions intact.
    pub normalized: Document,
    /// The compiled template: containers carry atomized renditions.
    pub compiled: Document,
    /// Extracted-fields JSON in document order.
    pub extracted_fields: String,
    /// Field dictionary keyed by ID.
    pub dictionary: BTreeMap<u32, FieldDescriptor>,
    pub logic_tree: Option<Vec<FieldLogicNode>>,
    pub preview: Option<Document>,
    pub preview_fields: Option<BTreeMap<u32, String>>,
    pub field_count: u32,
}

/// Run the whole preparation pipeline over `document`.
pub fn prepare_template(
    document: &Document,
    options: &PrepareOptions,
) -> CompileResult<PrepareResult> {
    let normalized = normalize_document(document, &options.recognizer)?;
    info!(fields = normalized.field_count, "extracted template fields");

    let mut ast = parse_fields(&normalized.extracted_fields)?;
    let dictionary = build_field_dictionary(&mut ast)?;
    info!(entries = dictionary.len(), "built field dictionary");

    let compiled = atomize_template(&normalized.document, &dictionary)?;

    let logic_tree = if options.generate_logic_tree {
        let tree = build_logic_tree(&ast)?;
        info!(nodes = tree.len(), "reduced logic tree");
        Some(tree)
    } else {
        None
    };

    let (preview, preview_fields) = if options.generate_flat_preview {
        (
            Some(flat_preview(&normalized.document)),
            Some(preview_field_map(&dictionary)),
        )
    } else {
        (None, None)
    };

    Ok(PrepareResult {
        normalized: normalized.document,
        compiled,
        extracted_fields: normalized.extracted_fields,
        dictionary,
        logic_tree,
        preview,
        preview_fields,
        field_count: normalized.field_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmark_doctree::{Block, Inline, Paragraph, Run};
    use pretty_assertions::assert_eq;

    fn doc_of(texts: &[&str]) -> Document {
        Document::new(
            texts
                .iter()
                .map(|text| {
                    Block::Paragraph(Paragraph::new(vec![Inline::Run(Run::text(*text))]))
                })
                .collect(),
        )
    }

    #[test]
    fn test_prepare_produces_all_default_artifacts() {
        let doc = doc_of(&["{[list People]}", "{[Name]}", "{[endlist]}"]);
        let result = prepare_template(&doc, &PrepareOptions::standard().unwrap()).unwrap();
        assert_eq!(result.field_count, 3);
        assert_eq!(result.dictionary.len(), 3);
        let tree = result.logic_tree.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].expr.as_deref(), Some("People"));
        assert!(result.preview.is_none());
        assert!(result.preview_fields.is_none());
        assert_eq!(
            result.extracted_fields,
            "[{\"content\":\"list People\",\"id\":\"1\"},\
             {\"content\":\"Name\",\"id\":\"2\"},\
             {\"content\":\"endlist\",\"id\":\"3\"}]"
        );
    }

    #[test]
    fn test_prepare_without_logic_tree() {
        let mut options = PrepareOptions::standard().unwrap();
        options.generate_logic_tree = false;
        let result = prepare_template(&doc_of(&["{[Name]}"]), &options).unwrap();
        assert!(result.logic_tree.is_none());
        assert_eq!(result.field_count, 1);
    }

    #[test]
    fn test_prepare_with_preview() {
        let mut options = PrepareOptions::standard().unwrap();
        options.generate_flat_preview = true;
        let result = prepare_template(&doc_of(&["{[if x]}", "{[endif]}"]), &options).unwrap();
        let fields = result.preview_fields.unwrap();
        assert_eq!(fields.get(&1).map(String::as_str), Some("if x"));
        assert_eq!(fields.get(&2).map(String::as_str), Some("endif"));
        assert!(result.preview.is_some());
    }

    #[test]
    fn test_prepare_propagates_parse_errors() {
        let err = prepare_template(
            &doc_of(&["{[if x]}", "{[Name]}"]),
            &PrepareOptions::standard().unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "The If in field 1 has no matching EndIf");
    }
}
