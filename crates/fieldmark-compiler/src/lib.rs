//! A compiler for template fields embedded in rich-text documents.
//!
//! ## Overview
//!
//! Authors write fields like `{[Name]}` or `{[if signed]}` directly in a
//! document's text, where they are subject to run splitting, styling
//! seams and revision tracking. This crate turns such a document into a
//! compiled template in several passes:
//!
//! 1. **Normalize** ([`normalize_document`]): find every field no matter
//!    how the editor fragmented it, rewrite each one into an ID-tagged
//!    container holding the bare field text, and extract the fields as
//!    nested JSON blocks mirroring the document structure.
//! 2. **Parse** ([`parse_fields`]): classify the extracted fields
//!    (content, `if`/`elseif`/`else`/`endif`, `list`/`endlist`) and pair
//!    the matching delimiters into an AST, rejecting malformed nesting.
//! 3. **Atomize** ([`build_field_dictionary`]): replace author
//!    expressions with short collision-free atoms so identical
//!    expressions share one name, and record the renditions per field ID.
//! 4. **Compile** ([`atomize_template`]): swap each container's text for
//!    its atomized rendition, yielding the template later fills are run
//!    against.
//! 5. Optionally **reduce** ([`build_logic_tree`]) the AST to the minimal
//!    logic tree an interviewer needs, and emit it as a JavaScript
//!    outline ([`generate_script`]).
//!
//! [`prepare_template`] runs the whole pipeline in one call.
//!
//! ## Example
//!
//! ```
//! use fieldmark_compiler::{prepare_template, PrepareOptions};
//! use fieldmark_doctree::parse_document;
//!
//! let source = "<document><body><p><r><t>Dear {[Name]}:</t></r></p></body></document>";
//! let doc = parse_document(source)?;
//!
//! let result = prepare_template(&doc, &PrepareOptions::standard()?)?;
//! assert_eq!(result.field_count, 1);
//! assert_eq!(result.extracted_fields, r#"[[{"content":"Name","id":"1"}]]"#);
//!
//! let tree = result.logic_tree.as_deref().unwrap_or_default();
//! assert_eq!(tree[0].expr.as_deref(), Some("Name"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accumulate;
pub mod ast;
pub mod atoms;
pub mod error;
pub mod flatten;
pub mod logic;
pub mod normalize;
pub mod parse;
pub mod prepare;
pub mod recognize;
pub mod script;
pub mod transform;

pub use ast::{FieldType, ParsedField};
pub use error::{CompileError, CompileResult};
pub use logic::{build_logic_tree, FieldLogicNode};
pub use normalize::{normalize_document, NormalizeResult};
pub use parse::{build_field_dictionary, parse_fields, FieldDescriptor};
pub use prepare::{prepare_template, PrepareOptions, PrepareResult};
pub use recognize::{FieldRecognizer, DEFAULT_EMBED_DELIMITERS, DEFAULT_FIELD_DELIMITERS};
pub use script::generate_script;
pub use transform::{atomize_template, flat_preview, preview_field_map};
