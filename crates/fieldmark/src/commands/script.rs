/*
 * script.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Script command implementation.
//!
//! Normalizes and parses a template, reduces the logic tree, then prints
//! the generated interview script to stdout.

use std::path::Path;

use anyhow::Result;

use fieldmark_compiler::{
    build_field_dictionary, build_logic_tree, generate_script, normalize_document, parse_fields,
};

use super::{build_recognizer, load_document};

/// Execute the script command
pub fn execute(template: &str, delimiters: Option<&str>, embedding: Option<&str>) -> Result<()> {
    let document = load_document(Path::new(template))?;
    let recognizer = build_recognizer(delimiters, embedding)?;

    let normalized = normalize_document(&document, &recognizer)?;
    let mut ast = parse_fields(&normalized.extracted_fields)?;
    build_field_dictionary(&mut ast)?;
    let tree = build_logic_tree(&ast)?;

    print!("{}", generate_script(&tree));
    Ok(())
}
