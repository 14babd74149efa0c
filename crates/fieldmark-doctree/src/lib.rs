//! A typed document tree with XML round-tripping.
//!
//! ## Overview
//!
//! This crate defines the abstract document model the fieldmark compiler
//! operates on: a body of paragraphs and tables, where paragraphs hold
//! styled runs, tracked deletions, text boxes and compiled field
//! containers. [`parse_document`] builds the tree from the flat XML
//! rendition and [`write_document`] serializes it back, preserving style
//! property fragments byte-for-byte.
//!
//! The model is deliberately narrow. It captures exactly the structure the
//! compiler needs to see (text, run boundaries, formatting seams, nesting)
//! and treats everything else as opaque pass-through data.
//!
//! ## Example
//!
//! ```
//! use fieldmark_doctree::{parse_document, write_document, Block, RunContent};
//!
//! let source = "<document><body><p><r><t>Hello</t></r></p></body></document>";
//! let doc = parse_document(source)?;
//!
//! let Block::Paragraph(para) = &doc.body[0] else { unreachable!() };
//! let text: String = para
//!     .runs()
//!     .flat_map(|run| run.content.iter())
//!     .filter_map(|item| match item {
//!         RunContent::Text(t) => Some(t.as_str()),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(text, "Hello");
//!
//! let xml = write_document(&doc)?;
//! assert!(xml.contains("<t>Hello</t>"));
//! # Ok::<(), fieldmark_doctree::Error>(())
//! ```

pub mod error;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::{Error, Result};
pub use reader::parse_document;
pub use types::{
    Block, Document, FieldContainer, Inline, Paragraph, Run, RunContent, Table, TableCell,
    TableRow,
};
pub use writer::write_document;
