/*
 * logic.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Logic command implementation.
//!
//! Normalizes and parses a template, then prints the reduced logic tree
//! as JSON to stdout.

use std::path::Path;

use anyhow::Result;

use fieldmark_compiler::{build_field_dictionary, build_logic_tree, normalize_document, parse_fields};

use super::{build_recognizer, load_document};

/// Execute the logic command
pub fn execute(template: &str, delimiters: Option<&str>, embedding: Option<&str>) -> Result<()> {
    let document = load_document(Path::new(template))?;
    let recognizer = build_recognizer(delimiters, embedding)?;

    let normalized = normalize_document(&document, &recognizer)?;
    let mut ast = parse_fields(&normalized.extracted_fields)?;
    // Atoms must be assigned before reduction so tree nodes carry them.
    build_field_dictionary(&mut ast)?;
    let tree = build_logic_tree(&ast)?;

    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
