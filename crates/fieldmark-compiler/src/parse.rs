/*
 * parse.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Field parser: extracted-fields JSON to the parsed-field AST, plus the
//! flat field dictionary.
//!
//! The extracted list is an array of `{content, id}` objects with nested
//! arrays for nested blocks. Each block is parsed independently: an
//! `If`/`List` directive consumes forward within its own block until its
//! closer, so a closer can never match an opener from another block. A
//! nested array must therefore be a balanced field sequence on its own; its
//! parsed nodes are spliced flat into the surrounding body.
//!
//! Classification tries the directive forms in a fixed order (`if`,
//! `elseif`, `else`, `endif`, `list`, `endlist`); order matters because the
//! `elseif` shorthand `:?` must win over the `else` shorthand `:`. Anything
//! unrecognized is plain content.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ast::{FieldType, ParsedField};
use crate::atoms::FieldAtomizer;
use crate::error::{CompileError, CompileResult};

static IF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:if\b|\?)\s*(.*)$").expect("Invalid regex pattern for if fields")
});
static ELSEIF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:elseif\b|:\?)\s*(.*)$").expect("Invalid regex pattern for elseif fields")
});
static ELSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:else\b|:)(.*)?$").expect("Invalid regex pattern for else fields")
});
static ENDIF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:endif\b|/\?)(?:.*)$").expect("Invalid regex pattern for endif fields")
});
static LIST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:list\b|#)\s*(.*)$").expect("Invalid regex pattern for list fields")
});
static ENDLIST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:endlist\b|/#)(.*)$").expect("Invalid regex pattern for endlist fields")
});

/// One entry of the extracted-fields list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExtractedItem {
    Field { content: String, id: String },
    Block(Vec<ExtractedItem>),
}

/// Parse an extracted-fields JSON document into the field AST.
///
/// The result is the document body: a flat list in which `If` and `List`
/// nodes carry their consumed body (closer included) as children.
pub fn parse_fields(extracted_json: &str) -> CompileResult<Vec<ParsedField>> {
    let items: Vec<ExtractedItem> = serde_json::from_str(extracted_json)?;
    parse_block(&items)
}

/// Parse one block. Directives must balance within it.
fn parse_block(items: &[ExtractedItem]) -> CompileResult<Vec<ParsedField>> {
    let mut body = Vec::new();
    let mut index = 0;
    while index < items.len() {
        let mut parsed = parse_item(items, &mut index)?;
        if parsed.len() == 1 {
            let node = &parsed[0];
            if matches!(
                node.field_type,
                FieldType::EndList | FieldType::EndIf | FieldType::Else | FieldType::ElseIf
            ) {
                return Err(no_matching_block(node));
            }
        }
        body.append(&mut parsed);
    }
    Ok(body)
}

/// Parse the item at `index`, advancing past everything it consumed. A
/// nested array parses as its own block and splices flat; a field object
/// yields one node (an `If`/`List` having consumed through its closer).
fn parse_item(items: &[ExtractedItem], index: &mut usize) -> CompileResult<Vec<ParsedField>> {
    match &items[*index] {
        ExtractedItem::Block(sub) => {
            *index += 1;
            parse_block(sub)
        }
        ExtractedItem::Field { content, id } => {
            *index += 1;
            let node = parse_field(items, index, content, id)?;
            Ok(vec![node])
        }
    }
}

fn parse_field(
    items: &[ExtractedItem],
    index: &mut usize,
    content: &str,
    id: &str,
) -> CompileResult<ParsedField> {
    let number = parse_field_id(id)?;
    if let Some(caps) = IF_PATTERN.captures(content) {
        let mut node = ParsedField::new(FieldType::If, captured_expr(&caps), number);
        node.children = parse_until_match(items, index, FieldType::EndIf, number, false)?;
        return Ok(node);
    }
    if let Some(caps) = ELSEIF_PATTERN.captures(content) {
        return Ok(ParsedField::new(
            FieldType::ElseIf,
            captured_expr(&caps),
            number,
        ));
    }
    if ELSE_PATTERN.is_match(content) {
        return Ok(ParsedField::new(FieldType::Else, None, number));
    }
    if ENDIF_PATTERN.is_match(content) {
        return Ok(ParsedField::new(FieldType::EndIf, None, number));
    }
    if let Some(caps) = LIST_PATTERN.captures(content) {
        let mut node = ParsedField::new(FieldType::List, captured_expr(&caps), number);
        node.children = parse_until_match(items, index, FieldType::EndList, number, false)?;
        return Ok(node);
    }
    if ENDLIST_PATTERN.is_match(content) {
        return Ok(ParsedField::new(FieldType::EndList, None, number));
    }
    Ok(ParsedField::new(
        FieldType::Content,
        Some(content.trim().to_string()),
        number,
    ))
}

/// Consume items until the matching closer. Branch directives (`Else`,
/// `ElseIf`) nest the remainder of the conditional inside themselves, so
/// the closer always ends up in the innermost open branch. `else_seen`
/// carries whether an `Else` already opened somewhere in this chain.
fn parse_until_match(
    items: &[ExtractedItem],
    index: &mut usize,
    target: FieldType,
    origin: u32,
    else_seen: bool,
) -> CompileResult<Vec<ParsedField>> {
    let mut body = Vec::new();
    loop {
        if *index >= items.len() {
            return Err(CompileError::field_syntax(format!(
                "The {} in field {} has no matching {}",
                opener_name(target),
                origin,
                target.name()
            )));
        }
        let mut parsed = parse_item(items, index)?;
        let single = if parsed.len() == 1 { parsed.pop() } else { None };
        let Some(node) = single else {
            // balanced sub-block splice
            body.append(&mut parsed);
            continue;
        };
        if node.field_type == target {
            if target == FieldType::EndList {
                body.push(ParsedField::punctuation());
            }
            body.push(node);
            return Ok(body);
        }
        match node.field_type {
            FieldType::ElseIf | FieldType::Else if target == FieldType::EndIf => {
                if else_seen {
                    return Err(CompileError::field_syntax(format!(
                        "The Else in field {} needs a matching EndIf prior to the {} in field {}",
                        origin,
                        node.field_type.name(),
                        node.number
                    )));
                }
                let next_else_seen = node.field_type == FieldType::Else;
                let mut branch = node;
                branch.children = parse_until_match(items, index, target, origin, next_else_seen)?;
                body.push(branch);
                return Ok(body);
            }
            FieldType::ElseIf | FieldType::Else => {
                return Err(CompileError::field_syntax(format!(
                    "The List in field {} needs a matching EndList prior to the {} in field {}",
                    origin,
                    node.field_type.name(),
                    node.number
                )));
            }
            FieldType::EndIf | FieldType::EndList => {
                return Err(CompileError::field_syntax(format!(
                    "Unexpected {} in field {} (could not locate the matching {})",
                    node.field_type.name(),
                    node.number,
                    opener_name(node.field_type)
                )));
            }
            _ => body.push(node),
        }
    }
}

fn no_matching_block(node: &ParsedField) -> CompileError {
    CompileError::field_syntax(format!(
        "The {} in field {} has no matching {}",
        node.field_type.name(),
        node.number,
        opener_name(node.field_type)
    ))
}

/// Opener keyword a closer-side type corresponds to.
fn opener_name(field_type: FieldType) -> &'static str {
    if field_type == FieldType::EndList {
        "List"
    } else {
        "If"
    }
}

// an empty capture stays a present (empty) expression; only the closer
// forms and Else carry no expression at all
fn captured_expr(caps: &regex::Captures) -> Option<String> {
    caps.get(1).map(|m| m.as_str().to_string())
}

fn parse_field_id(id: &str) -> CompileResult<u32> {
    id.parse::<u32>()
        .map_err(|_| CompileError::field_syntax(format!("field id is not numeric: {id}")))
}

/// Dictionary entry for one template field, keyed by field ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    #[serde(rename = "fieldType")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(rename = "atomizedExpr", skip_serializing_if = "Option::is_none")]
    pub atomized_expr: Option<String>,
    /// Field ID of the enclosing construct, for fields that carry no
    /// expression of their own. Zero (omitted) otherwise.
    #[serde(skip_serializing_if = "parent_is_root")]
    pub parent: u32,
}

fn parent_is_root(parent: &u32) -> bool {
    *parent == 0
}

impl FieldDescriptor {
    /// Canonical field text: keyword prefix plus the trimmed expression.
    pub fn text(&self) -> String {
        format!(
            "{}{}",
            self.field_type.prefix(),
            self.expr.as_deref().map(str::trim).unwrap_or("")
        )
    }

    /// Atomized rendition: keyword prefix plus the atom, the text a
    /// compiled template stores in place of the expression.
    pub fn atomized_text(&self) -> String {
        format!(
            "{}{}",
            self.field_type.prefix(),
            self.atomized_expr.as_deref().unwrap_or("")
        )
    }
}

/// Build the flat field dictionary from a parsed AST, assigning atoms.
///
/// Atoms are written back onto the AST nodes as a side effect; the
/// logic-tree reducer reads them from there. Expression-less fields record
/// their enclosing construct's ID instead, and an `EndList` additionally
/// carries its list's atom (list punctuation is resolved through it).
pub fn build_field_dictionary(
    body: &mut [ParsedField],
) -> CompileResult<BTreeMap<u32, FieldDescriptor>> {
    let mut dictionary = BTreeMap::new();
    let mut atoms = FieldAtomizer::new();
    walk_dictionary(body, &mut dictionary, &mut atoms, None)?;
    Ok(dictionary)
}

fn walk_dictionary(
    body: &mut [ParsedField],
    dictionary: &mut BTreeMap<u32, FieldDescriptor>,
    atoms: &mut FieldAtomizer,
    parent: Option<&ParsedField>,
) -> CompileResult<()> {
    for index in 0..body.len() {
        if !body[index].children.is_empty() {
            // children see this node as their enclosing construct; the
            // probe copies just the fields atom assignment reads
            let probe = ParsedField::new(
                body[index].field_type,
                body[index].expr.clone(),
                body[index].number,
            );
            walk_dictionary(&mut body[index].children, dictionary, atoms, Some(&probe))?;
        }
        let node = &mut body[index];
        if node.number == 0 {
            continue;
        }
        let mut descriptor = FieldDescriptor {
            field_type: node.field_type,
            expr: None,
            atomized_expr: None,
            parent: 0,
        };
        if node.expr.is_some() {
            descriptor.expr = node.expr.clone();
            let atom = atoms.atomize(node)?;
            node.atom = Some(atom.clone());
            descriptor.atomized_expr = Some(atom);
        } else {
            let Some(parent) = parent else {
                return Err(CompileError::internal(format!(
                    "field {} has no expression and no enclosing construct",
                    node.number
                )));
            };
            descriptor.parent = parent.number;
            if node.field_type == FieldType::EndList {
                descriptor.atomized_expr = Some(atoms.atomize(parent)?);
            }
        }
        dictionary.insert(node.number, descriptor);
    }
    Ok(())
}
