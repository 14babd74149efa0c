/*
 * fields.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Fields command implementation.
//!
//! Prints the extracted-fields JSON for a template to stdout, exactly as
//! the normalizer renders it (nested arrays mirroring block structure).

use std::path::Path;

use anyhow::Result;

use fieldmark_compiler::normalize_document;

use super::{build_recognizer, load_document};

/// Execute the fields command
pub fn execute(template: &str, delimiters: Option<&str>, embedding: Option<&str>) -> Result<()> {
    let document = load_document(Path::new(template))?;
    let recognizer = build_recognizer(delimiters, embedding)?;

    let result = normalize_document(&document, &recognizer)?;
    println!("{}", result.extracted_fields);
    Ok(())
}
