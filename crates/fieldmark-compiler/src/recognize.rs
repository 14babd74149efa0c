/*
 * recognize.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Field recognition over flattened text.
//!
//! A [`FieldRecognizer`] carries a validated delimiter scheme: an inner
//! "field" pair (default `[]`) and an optional outer "embedding" pair
//! (default `{}`) used when fields are wrapped in legacy markup. The
//! combined pattern locates candidate spans in flattened paragraph text;
//! [`FieldRecognizer::is_field`] validates a candidate and yields its
//! cleaned inner content. The recognizer is immutable once constructed and
//! safely reusable across structural units.

use crate::error::{CompileError, CompileResult};
use regex::Regex;

/// Default inner delimiter pair.
pub const DEFAULT_FIELD_DELIMITERS: &str = "[]";
/// Default embedding delimiter pair.
pub const DEFAULT_EMBED_DELIMITERS: &str = "{}";

/// Validated delimiter scheme plus the combined match pattern.
#[derive(Debug, Clone)]
pub struct FieldRecognizer {
    field_begin: String,
    field_end: String,
    embed_begin: String,
    embed_end: String,
    combined_begin: String,
    pattern: Regex,
}

impl FieldRecognizer {
    /// Build a recognizer from delimiter specifications.
    ///
    /// Each specification is split into equal begin/end halves, so it must
    /// have even length. The field specification must be non-empty; an empty
    /// embedding specification disables that layer.
    pub fn new(field_delimiters: &str, embed_delimiters: &str) -> CompileResult<Self> {
        if field_delimiters.is_empty() {
            return Err(CompileError::config(
                "Field recognizer requires non-empty field delimiters",
            ));
        }
        let (field_begin, field_end) = split_delimiters(field_delimiters, "field")?;
        let (embed_begin, embed_end) = if embed_delimiters.is_empty() {
            (String::new(), String::new())
        } else {
            split_delimiters(embed_delimiters, "embedding")?
        };

        let combined_begin = format!("{embed_begin}{field_begin}");
        let combined_end = format!("{field_end}{embed_end}");
        let pattern = Regex::new(&format!(
            "{}.*?{}",
            regex::escape(&combined_begin),
            regex::escape(&combined_end)
        ))
        .map_err(|e| CompileError::internal(format!("field pattern failed to compile: {e}")))?;

        Ok(FieldRecognizer {
            field_begin,
            field_end,
            embed_begin,
            embed_end,
            combined_begin,
            pattern,
        })
    }

    /// The default scheme: `[]` fields inside `{}` embedding markers.
    pub fn standard() -> CompileResult<Self> {
        FieldRecognizer::new(DEFAULT_FIELD_DELIMITERS, DEFAULT_EMBED_DELIMITERS)
    }

    /// Begin marker including the embedding layer. A unit whose flattened
    /// text lacks this marker contains no fields.
    pub fn combined_begin(&self) -> &str {
        &self.combined_begin
    }

    /// The combined pattern matching one whole field occurrence
    /// (embedding layer included).
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn field_begin(&self) -> &str {
        &self.field_begin
    }

    pub fn field_end(&self) -> &str {
        &self.field_end
    }

    /// Remove the embedding layer from a matched span, if present.
    pub fn strip_embedding<'t>(&self, text: &'t str) -> &'t str {
        if self.embed_begin.is_empty() && self.embed_end.is_empty() {
            return text;
        }
        if text.len() >= self.embed_begin.len() + self.embed_end.len()
            && text.starts_with(&self.embed_begin)
            && text.ends_with(&self.embed_end)
        {
            &text[self.embed_begin.len()..text.len() - self.embed_end.len()]
        } else {
            text
        }
    }

    /// Validate a candidate span and return its cleaned inner content.
    ///
    /// Succeeds iff the trimmed text starts with the field-begin marker and
    /// ends with the field-end marker. The inner content is trimmed, curly
    /// double quotes are normalized to straight ones and zero-width
    /// characters are stripped.
    pub fn is_field(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.len() < self.field_begin.len() + self.field_end.len()
            || !trimmed.starts_with(&self.field_begin)
            || !trimmed.ends_with(&self.field_end)
        {
            return None;
        }
        let inner = &trimmed[self.field_begin.len()..trimmed.len() - self.field_end.len()];
        Some(clean_field_content(inner.trim()))
    }

    /// Re-wrap cleaned field content in the field delimiters (the text a
    /// normalized field container carries).
    pub fn wrap(&self, content: &str) -> String {
        format!("{}{}{}", self.field_begin, content, self.field_end)
    }
}

fn split_delimiters(spec: &str, layer: &str) -> CompileResult<(String, String)> {
    let chars: Vec<char> = spec.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(CompileError::config(format!(
            "Field recognizer requires even-length {layer} delimiters"
        )));
    }
    let (begin, end) = chars.split_at(chars.len() / 2);
    Ok((begin.iter().collect(), end.iter().collect()))
}

/// Normalize curly double quotes and drop zero-width characters, which word
/// processors insert for wrapping purposes.
fn clean_field_content(content: &str) -> String {
    let mut cleaned = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '\u{201C}' | '\u{201D}' => cleaned.push('"'),
            '\u{200B}' | '\u{200C}' => {}
            _ => cleaned.push(ch),
        }
    }
    cleaned
}
