//! Command implementations for the fieldmark CLI
//!
//! Each command module handles the CLI interface and delegates to
//! fieldmark-compiler for the actual pipeline work.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use fieldmark_compiler::{FieldRecognizer, DEFAULT_EMBED_DELIMITERS, DEFAULT_FIELD_DELIMITERS};
use fieldmark_doctree::{parse_document, Document};

pub mod fields;
pub mod logic;
pub mod normalize;
pub mod prepare;
pub mod script;

/// Build a recognizer from the shared `--delimiters` / `--embedding` flags.
/// An explicit empty embedding string disables the embedding layer.
pub(crate) fn build_recognizer(
    delimiters: Option<&str>,
    embedding: Option<&str>,
) -> Result<FieldRecognizer> {
    let field = delimiters.unwrap_or(DEFAULT_FIELD_DELIMITERS);
    let embed = embedding.unwrap_or(DEFAULT_EMBED_DELIMITERS);
    FieldRecognizer::new(field, embed).context("invalid delimiter configuration")
}

/// Read and parse a template document.
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    let document = parse_document(&source)
        .with_context(|| format!("failed to parse template {}", path.display()))?;
    Ok(document)
}

/// Derive an artifact path next to the template: `letter.xml` with suffix
/// `fields.json` becomes `letter.fields.json`.
pub(crate) fn sibling_path(template: &Path, suffix: &str) -> PathBuf {
    let stem = template
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("template");
    template.with_file_name(format!("{stem}.{suffix}"))
}

/// Write one output artifact, logging its path.
pub(crate) fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path_replaces_extension() {
        let path = sibling_path(Path::new("dir/letter.xml"), "fields.json");
        assert_eq!(path, PathBuf::from("dir/letter.fields.json"));
    }

    #[test]
    fn test_sibling_path_without_extension() {
        let path = sibling_path(Path::new("letter"), "compiled.xml");
        assert_eq!(path, PathBuf::from("letter.compiled.xml"));
    }

    #[test]
    fn test_build_recognizer_defaults() {
        let recognizer = build_recognizer(None, None).unwrap();
        assert_eq!(recognizer.combined_begin(), "{[");
    }

    #[test]
    fn test_build_recognizer_empty_embedding_disables_layer() {
        let recognizer = build_recognizer(None, Some("")).unwrap();
        assert_eq!(recognizer.combined_begin(), "[");
    }

    #[test]
    fn test_build_recognizer_rejects_bad_spec() {
        assert!(build_recognizer(Some("["), None).is_err());
    }
}
