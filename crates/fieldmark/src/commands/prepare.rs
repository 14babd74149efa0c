/*
 * prepare.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Prepare command implementation.
//!
//! Runs the full compilation pipeline over a template and writes the
//! compiled template plus its field artifacts next to the input:
//! `<stem>.compiled.xml`, `<stem>.fields.json`, `<stem>.logic.json`
//! (unless suppressed) and with `--preview` also `<stem>.preview.xml`
//! and `<stem>.preview-fields.json`.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use fieldmark_compiler::{prepare_template, PrepareOptions};
use fieldmark_doctree::write_document;

use super::{build_recognizer, load_document, sibling_path, write_artifact};

/// Arguments for the prepare command
#[derive(Debug)]
pub struct PrepareArgs {
    /// Input template path
    pub template: String,
    /// Field delimiter override
    pub delimiters: Option<String>,
    /// Embedding delimiter override ("" disables the layer)
    pub embedding: Option<String>,
    /// Compiled-template output path override
    pub output: Option<String>,
    /// Reduce and write the logic tree
    pub logic_tree: bool,
    /// Also write the flat preview and its field map
    pub preview: bool,
}

/// Execute the prepare command
pub fn execute(args: PrepareArgs) -> Result<()> {
    let template = PathBuf::from(&args.template);
    let document = load_document(&template)?;

    let options = PrepareOptions {
        recognizer: build_recognizer(args.delimiters.as_deref(), args.embedding.as_deref())?,
        generate_logic_tree: args.logic_tree,
        generate_flat_preview: args.preview,
    };
    let result = prepare_template(&document, &options)?;

    let compiled_path = match &args.output {
        Some(output) => PathBuf::from(output),
        None => sibling_path(&template, "compiled.xml"),
    };
    write_artifact(&compiled_path, &write_document(&result.compiled)?)?;

    let fields_json = serde_json::to_string_pretty(&result.dictionary)?;
    write_artifact(&sibling_path(&template, "fields.json"), &fields_json)?;

    if let Some(tree) = &result.logic_tree {
        let logic_json = serde_json::to_string_pretty(tree)?;
        write_artifact(&sibling_path(&template, "logic.json"), &logic_json)?;
    }

    if let Some(preview) = &result.preview {
        write_artifact(
            &sibling_path(&template, "preview.xml"),
            &write_document(preview)?,
        )?;
    }
    if let Some(map) = &result.preview_fields {
        write_artifact(
            &sibling_path(&template, "preview-fields.json"),
            &serde_json::to_string_pretty(map)?,
        )?;
    }

    info!(fields = result.field_count, "prepared {}", template.display());
    Ok(())
}
