/*
 * accumulate.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Field accumulation during normalization.
//!
//! The normalizer walks the document opening a block per structural unit
//! (the document itself, then each paragraph wherever it nests) and registers
//! every recognized field in document order. The [`FieldAccumulator`] assigns
//! the permanent field IDs from a single document-wide counter and records
//! the block nesting, collapsing trivial single-field blocks on close.
//!
//! [`FieldAccumulator::to_json`] renders the extracted-fields list: nested
//! JSON arrays mirroring block nesting with `{"content", "id"}` leaves. The
//! string is rendered by hand because the escaping is part of the interface:
//! carriage returns are removed and a line feed becomes a literal
//! backslash-n in the decoded value, which no standard serializer produces.

use crate::error::{CompileError, CompileResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Field { content: String, id: u32 },
    Block(Vec<Item>),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct BlockFrame {
    items: Vec<Item>,
    other_content: bool,
}

/// Assigns field IDs and records block-nested field order.
#[derive(Debug, Default)]
pub struct FieldAccumulator {
    root: BlockFrame,
    open: Vec<BlockFrame>,
    count: u32,
}

impl FieldAccumulator {
    pub fn new() -> Self {
        FieldAccumulator::default()
    }

    /// Open a nested block (one per structural unit).
    pub fn begin_block(&mut self) {
        self.open.push(BlockFrame::default());
    }

    /// Close the innermost open block.
    ///
    /// An empty block vanishes. A block holding exactly one item and no
    /// other registered content is spliced into its parent; anything else
    /// becomes a nested item. The document frame itself is never closed.
    pub fn end_block(&mut self) -> CompileResult<()> {
        let Some(frame) = self.open.pop() else {
            return Err(CompileError::internal(
                "field accumulator closed more blocks than it opened",
            ));
        };
        if frame.items.is_empty() {
            return Ok(());
        }
        let parent = match self.open.last_mut() {
            Some(open) => open,
            None => &mut self.root,
        };
        if frame.items.len() == 1 && !frame.other_content {
            parent.items.extend(frame.items);
        } else {
            parent.items.push(Item::Block(frame.items));
        }
        Ok(())
    }

    /// Register one recognized field and return its permanent ID.
    /// IDs start at 1 and increase in call order across the whole document.
    pub fn add_field(&mut self, content: impl Into<String>) -> u32 {
        self.count += 1;
        let id = self.count;
        let top = match self.open.last_mut() {
            Some(open) => open,
            None => &mut self.root,
        };
        top.items.push(Item::Field {
            content: content.into(),
            id,
        });
        id
    }

    /// Mark the innermost block as carrying non-field text, which prevents
    /// the single-item collapse on close.
    pub fn register_other_content(&mut self) {
        let top = match self.open.last_mut() {
            Some(open) => open,
            None => &mut self.root,
        };
        top.other_content = true;
    }

    pub fn field_count(&self) -> u32 {
        self.count
    }

    /// Render the extracted-fields JSON. All opened blocks must be closed.
    pub fn to_json(&self) -> CompileResult<String> {
        if !self.open.is_empty() {
            return Err(CompileError::internal(
                "field accumulator serialized with unclosed blocks",
            ));
        }
        let mut out = String::new();
        write_items(&self.root.items, &mut out);
        Ok(out)
    }
}

fn write_items(items: &[Item], out: &mut String) {
    out.push('[');
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        match item {
            Item::Field { content, id } => {
                out.push_str("{\"content\":\"");
                escape_content(content, out);
                out.push_str("\",\"id\":\"");
                out.push_str(&id.to_string());
                out.push_str("\"}");
            }
            Item::Block(children) => write_items(children, out),
        }
    }
    out.push(']');
}

/// Escaping matches the original interface exactly: backslash and quote are
/// escaped, carriage returns dropped, and a line feed becomes an escaped
/// backslash followed by `n` (not a JSON newline escape).
fn escape_content(content: &str, out: &mut String) {
    for ch in content.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => {}
            '\n' => out.push_str("\\\\n"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ids_increase_in_call_order() {
        let mut acc = FieldAccumulator::new();
        assert_eq!(acc.add_field("a"), 1);
        assert_eq!(acc.add_field("b"), 2);
        assert_eq!(acc.add_field("c"), 3);
        assert_eq!(acc.field_count(), 3);
        assert_eq!(
            acc.to_json().unwrap(),
            r#"[{"content":"a","id":"1"},{"content":"b","id":"2"},{"content":"c","id":"3"}]"#
        );
    }

    #[test]
    fn test_single_field_block_collapses() {
        let mut acc = FieldAccumulator::new();
        acc.begin_block();
        acc.add_field("only");
        acc.end_block().unwrap();
        assert_eq!(acc.to_json().unwrap(), r#"[{"content":"only","id":"1"}]"#);
    }

    #[test]
    fn test_other_content_prevents_collapse() {
        let mut acc = FieldAccumulator::new();
        acc.begin_block();
        acc.add_field("only");
        acc.register_other_content();
        acc.end_block().unwrap();
        assert_eq!(acc.to_json().unwrap(), r#"[[{"content":"only","id":"1"}]]"#);
    }

    #[test]
    fn test_multi_field_block_nests() {
        let mut acc = FieldAccumulator::new();
        acc.begin_block();
        acc.add_field("a");
        acc.add_field("b");
        acc.end_block().unwrap();
        acc.begin_block();
        acc.add_field("c");
        acc.end_block().unwrap();
        assert_eq!(
            acc.to_json().unwrap(),
            r#"[[{"content":"a","id":"1"},{"content":"b","id":"2"}],{"content":"c","id":"3"}]"#
        );
    }

    #[test]
    fn test_empty_block_vanishes() {
        let mut acc = FieldAccumulator::new();
        acc.begin_block();
        acc.register_other_content();
        acc.end_block().unwrap();
        acc.add_field("a");
        assert_eq!(acc.to_json().unwrap(), r#"[{"content":"a","id":"1"}]"#);
    }

    #[test]
    fn test_collapsed_item_may_be_a_block() {
        let mut acc = FieldAccumulator::new();
        acc.begin_block();
        acc.begin_block();
        acc.add_field("a");
        acc.add_field("b");
        acc.end_block().unwrap();
        acc.end_block().unwrap();
        assert_eq!(
            acc.to_json().unwrap(),
            r#"[[{"content":"a","id":"1"},{"content":"b","id":"2"}]]"#
        );
    }

    #[test]
    fn test_content_escaping() {
        let mut acc = FieldAccumulator::new();
        acc.add_field("say \"hi\"");
        acc.add_field("back\\slash");
        acc.add_field("line\r\nbreak");
        assert_eq!(
            acc.to_json().unwrap(),
            "[{\"content\":\"say \\\"hi\\\"\",\"id\":\"1\"},\
             {\"content\":\"back\\\\slash\",\"id\":\"2\"},\
             {\"content\":\"line\\\\nbreak\",\"id\":\"3\"}]"
        );
    }

    #[test]
    fn test_unbalanced_close_is_an_error() {
        let mut acc = FieldAccumulator::new();
        assert!(acc.end_block().is_err());
        acc.begin_block();
        acc.end_block().unwrap();
        assert!(acc.end_block().is_err());
    }

    #[test]
    fn test_serialize_with_open_block_is_an_error() {
        let mut acc = FieldAccumulator::new();
        acc.begin_block();
        assert!(acc.to_json().is_err());
    }
}
