/*
 * normalize.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Normalize command implementation.
//!
//! Rewrites a template so every field sits in its own ID-tagged container,
//! without atomizing it, and writes `<stem>.normalized.xml` plus
//! `<stem>.extracted.json` (the raw extracted-fields list).

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use fieldmark_compiler::normalize_document;
use fieldmark_doctree::write_document;

use super::{build_recognizer, load_document, sibling_path, write_artifact};

/// Arguments for the normalize command
#[derive(Debug)]
pub struct NormalizeArgs {
    /// Input template path
    pub template: String,
    /// Field delimiter override
    pub delimiters: Option<String>,
    /// Embedding delimiter override ("" disables the layer)
    pub embedding: Option<String>,
    /// Normalized-template output path override
    pub output: Option<String>,
}

/// Execute the normalize command
pub fn execute(args: NormalizeArgs) -> Result<()> {
    let template = PathBuf::from(&args.template);
    let document = load_document(&template)?;
    let recognizer = build_recognizer(args.delimiters.as_deref(), args.embedding.as_deref())?;

    let result = normalize_document(&document, &recognizer)?;

    let normalized_path = match &args.output {
        Some(output) => PathBuf::from(output),
        None => sibling_path(&template, "normalized.xml"),
    };
    write_artifact(&normalized_path, &write_document(&result.document)?)?;
    write_artifact(
        &sibling_path(&template, "extracted.json"),
        &result.extracted_fields,
    )?;

    info!(
        fields = result.field_count,
        "normalized {}",
        template.display()
    );
    Ok(())
}
