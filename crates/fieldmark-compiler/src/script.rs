/*
 * script.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Legacy script generation.
//!
//! Serializes a logic tree into the small imperative vocabulary older
//! assembly hosts execute: `define`, `beginCondition`, `beginList`/`endList`
//! and `beginObject`/`endObject`. Emission is a mechanical recursive
//! descent, two-space indented per nesting level, so the output is
//! deterministic for a given tree.

use crate::ast::FieldType;
use crate::logic::FieldLogicNode;

/// Render a logic tree as an executable legacy script.
pub fn generate_script(tree: &[FieldLogicNode]) -> String {
    let mut script = String::new();
    write_body(&mut script, tree, 0);
    script
}

fn write_body(script: &mut String, nodes: &[FieldLogicNode], indent: usize) {
    for node in nodes {
        write_node(script, node, indent);
    }
}

fn write_node(script: &mut String, node: &FieldLogicNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let atom = node.atom.as_deref().unwrap_or("");
    let expr = node.expr.as_deref().unwrap_or("");
    match node.field_type {
        FieldType::Content => {
            // synthetic punctuation nodes are re-injected by the List
            // emission instead
            if node.first_field == 0 && expr == "_punc" {
                return;
            }
            script.push_str(&format!(
                "{pad}define('{}', '{}');\n",
                escape(atom),
                escape(expr)
            ));
        }
        FieldType::List => {
            script.push_str(&format!(
                "{pad}for (const {atom}_item of beginList('{}', '{}')) {{\n",
                escape(atom),
                escape(expr)
            ));
            script.push_str(&format!("{pad}  beginObject({atom}_item);\n"));
            write_body(script, &node.content, indent + 1);
            script.push_str(&format!("{pad}  define('{atom}_punc', '_punc');\n"));
            script.push_str(&format!("{pad}  endObject();\n"));
            script.push_str(&format!("{pad}}}\n"));
            script.push_str(&format!("{pad}endList('{}');\n", escape(atom)));
        }
        FieldType::If => {
            script.push_str(&format!(
                "{pad}if (beginCondition('{}', '{}')) {{\n",
                escape(atom),
                escape(expr)
            ));
            write_branches(script, &node.content, indent);
            script.push_str(&format!("{pad}}}\n"));
        }
        // branch continuations are emitted by write_branches; closers never
        // reach the logic tree
        FieldType::ElseIf | FieldType::Else | FieldType::EndIf | FieldType::EndList => {}
    }
}

/// Emits the children of one branch, continuing the `else if`/`else` chain
/// at the enclosing indent when a branch node is encountered. Branch nodes
/// only ever appear as the final child of the preceding branch.
fn write_branches(script: &mut String, nodes: &[FieldLogicNode], indent: usize) {
    let pad = "  ".repeat(indent);
    for node in nodes {
        match node.field_type {
            FieldType::ElseIf => {
                script.push_str(&format!(
                    "{pad}}} else if (beginCondition('{}', '{}')) {{\n",
                    escape(node.atom.as_deref().unwrap_or("")),
                    escape(node.expr.as_deref().unwrap_or(""))
                ));
                write_branches(script, &node.content, indent);
            }
            FieldType::Else => {
                script.push_str(&format!("{pad}}} else {{\n"));
                write_branches(script, &node.content, indent);
            }
            _ => write_node(script, node, indent + 1),
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
