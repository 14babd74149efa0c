/*
 * logic.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Logic-tree reduction.
//!
//! Reduces a parsed-field AST to the minimal-ish tree a downstream
//! evaluator needs: closers are dropped, repeated `Content`/`List`
//! references inside one visible scope chain collapse into the first
//! occurrence (folding their field IDs into `idd`), and conditional
//! branches are always kept because their truth value is independent of
//! expression repetition.
//!
//! Scope visibility is deliberately asymmetric: a binding made in an
//! enclosing body suppresses repeats inside any branch, but a binding made
//! inside a branch never suppresses a later reference in the enclosing
//! body, and sibling branches do not see each other's bindings. List bodies
//! reduce in a wholly separate scope. One reduction pass cannot catch every
//! redundancy under these rules, so a final top-down sweep with flat
//! rebuilt scopes catches the stragglers. The sweep is a best-effort
//! reduction, not a minimality guarantee; its blind spots are long-standing
//! observable behavior.
//!
//! Nodes and scopes live in arenas during reduction. Scope frames chain
//! through parent indices: reads walk the chain, writes only touch the
//! addressed frame, which gives the live parent-chain visibility the
//! algorithm needs without aliasing node references across sibling
//! branches.

use std::collections::HashMap;
use std::mem;

use serde::Serialize;

use crate::ast::{FieldType, ParsedField};
use crate::error::{CompileError, CompileResult};

/// One node of the reduced logic tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLogicNode {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom: Option<String>,
    /// Field ID of the first occurrence. Zero for synthetic punctuation
    /// nodes, which never came from a field.
    #[serde(rename = "id", skip_serializing_if = "is_zero")]
    pub first_field: u32,
    /// Field IDs of collapsed later occurrences, in collapse order.
    #[serde(rename = "idd", skip_serializing_if = "Vec::is_empty")]
    pub other_fields: Vec<u32>,
    #[serde(rename = "contentArray", skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<FieldLogicNode>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Reduce a parsed AST (atoms already assigned) to its logic tree.
pub fn build_logic_tree(body: &[ParsedField]) -> CompileResult<Vec<FieldLogicNode>> {
    let mut reducer = Reducer::default();
    let root_scope = reducer.new_scope(None);
    let root = reducer.reduce_body(body, Vec::new(), root_scope, None)?;
    let root = reducer.simplify(root, &mut HashMap::new());
    Ok(reducer.materialize(&root))
}

/// Node under construction, addressed by arena index.
#[derive(Debug)]
struct BuildNode {
    field_type: FieldType,
    expr: Option<String>,
    atom: Option<String>,
    first_field: u32,
    other_fields: Vec<u32>,
    children: Vec<usize>,
    /// Scope frame a `List` body was reduced in, kept for merge revisits.
    scope: Option<usize>,
}

impl BuildNode {
    fn is_punctuation(&self) -> bool {
        self.first_field == 0
            && self.field_type == FieldType::Content
            && self.expr.as_deref() == Some("_punc")
    }
}

/// Binding environment frame. Reads walk the parent chain; writes stay in
/// the frame they address.
#[derive(Debug, Default)]
struct ScopeFrame {
    bindings: HashMap<String, usize>,
    parent: Option<usize>,
}

#[derive(Debug, Default)]
struct Reducer {
    nodes: Vec<BuildNode>,
    scopes: Vec<ScopeFrame>,
}

impl Reducer {
    fn new_scope(&mut self, parent: Option<usize>) -> usize {
        self.scopes.push(ScopeFrame {
            bindings: HashMap::new(),
            parent,
        });
        self.scopes.len() - 1
    }

    fn new_node(&mut self, field: &ParsedField) -> usize {
        self.nodes.push(BuildNode {
            field_type: field.field_type,
            expr: field.expr.clone(),
            atom: field.atom.clone(),
            first_field: field.number,
            other_fields: Vec::new(),
            children: Vec::new(),
            scope: None,
        });
        self.nodes.len() - 1
    }

    fn lookup(&self, scope: usize, key: &str) -> Option<usize> {
        let mut current = Some(scope);
        while let Some(frame_id) = current {
            let frame = &self.scopes[frame_id];
            if let Some(&node) = frame.bindings.get(key) {
                return Some(node);
            }
            current = frame.parent;
        }
        None
    }

    fn contains(&self, scope: usize, key: &str) -> bool {
        self.lookup(scope, key).is_some()
    }

    fn bind(&mut self, scope: usize, key: String, node: usize) {
        self.scopes[scope].bindings.insert(key, node);
    }

    /// Reduce `ast` appending into `body` (non-empty when revisiting an
    /// already-reduced list). `parent_scope` is set while reducing inside a
    /// conditional branch and names the nearest non-branch frame.
    fn reduce_body(
        &mut self,
        ast: &[ParsedField],
        mut body: Vec<usize>,
        scope: usize,
        parent_scope: Option<usize>,
    ) -> CompileResult<Vec<usize>> {
        for node in ast {
            if let Some(reduced) = self.reduce_node(node, &body, scope, parent_scope)? {
                body.push(reduced);
            }
        }
        Ok(body)
    }

    fn reduce_node(
        &mut self,
        ast: &ParsedField,
        body: &[usize],
        scope: usize,
        parent_scope: Option<usize>,
    ) -> CompileResult<Option<usize>> {
        match ast.field_type {
            FieldType::EndIf | FieldType::EndList => Ok(None),
            FieldType::Content => {
                if ast.is_punctuation() {
                    // keep the first punctuation node per body; it never
                    // enters any scope
                    if body.iter().any(|&id| self.nodes[id].is_punctuation()) {
                        return Ok(None);
                    }
                    return Ok(Some(self.new_node(ast)));
                }
                let Some(expr) = ast.expr.as_deref() else {
                    return Err(CompileError::internal(format!(
                        "content field {} has no expression in the logic reducer",
                        ast.number
                    )));
                };
                if let Some(existing) = self.lookup(scope, expr) {
                    if ast.number > 0 {
                        self.nodes[existing].other_fields.push(ast.number);
                    }
                    return Ok(None);
                }
                let id = self.new_node(ast);
                self.bind(scope, expr.to_string(), id);
                Ok(Some(id))
            }
            FieldType::List => {
                let Some(expr) = ast.expr.as_deref() else {
                    return Err(CompileError::internal(format!(
                        "list field {} has no expression in the logic reducer",
                        ast.number
                    )));
                };
                if let Some(existing) = self.lookup(scope, expr) {
                    // merge this occurrence's body into the first one,
                    // reducing in the scope that body was built with
                    let Some(existing_scope) = self.nodes[existing].scope else {
                        return Err(CompileError::internal(format!(
                            "merged list {expr} has no retained scope"
                        )));
                    };
                    let children = mem::take(&mut self.nodes[existing].children);
                    let children =
                        self.reduce_body(&ast.children, children, existing_scope, None)?;
                    self.nodes[existing].children = children;
                    if ast.number > 0 {
                        self.nodes[existing].other_fields.push(ast.number);
                    }
                    Ok(None)
                } else {
                    // list bodies get a wholly separate scope with no parent
                    let list_scope = self.new_scope(None);
                    let children = self.reduce_body(&ast.children, Vec::new(), list_scope, None)?;
                    let id = self.new_node(ast);
                    self.nodes[id].children = children;
                    self.nodes[id].scope = Some(list_scope);
                    self.bind(scope, expr.to_string(), id);
                    Ok(Some(id))
                }
            }
            FieldType::If | FieldType::ElseIf | FieldType::Else => {
                let id = self.new_node(ast);
                let pscope = parent_scope.unwrap_or(scope);
                if matches!(ast.field_type, FieldType::If | FieldType::ElseIf) {
                    let marker = format!("if${}", ast.expr.as_deref().unwrap_or(""));
                    if !self.contains(pscope, &marker) {
                        self.bind(pscope, marker, id);
                    }
                }
                let branch_scope = self.new_scope(Some(pscope));
                let children =
                    self.reduce_body(&ast.children, Vec::new(), branch_scope, Some(pscope))?;
                self.nodes[id].children = children;
                Ok(Some(id))
            }
        }
    }

    /// Final top-down sweep with flat scopes rebuilt from scratch. Returns
    /// the surviving node IDs for `body`.
    fn simplify(&mut self, body: Vec<usize>, scope: &mut HashMap<String, usize>) -> Vec<usize> {
        let initial = scope.clone();
        let mut kept = Vec::with_capacity(body.len());
        for id in body {
            let node = &self.nodes[id];
            if node.field_type != FieldType::Content || node.is_punctuation() {
                kept.push(id);
                continue;
            }
            let Some(expr) = node.expr.clone() else {
                kept.push(id);
                continue;
            };
            let first_field = node.first_field;
            if let Some(&existing) = scope.get(&expr) {
                // collapsed duplicates keep only their first field ID; any
                // IDs already folded into the duplicate are dropped with it
                if first_field > 0 {
                    self.nodes[existing].other_fields.push(first_field);
                }
            } else {
                scope.insert(expr, id);
                kept.push(id);
            }
        }
        for &id in &kept {
            match self.nodes[id].field_type {
                FieldType::List => {
                    if let Some(expr) = self.nodes[id].expr.clone() {
                        scope.entry(expr).or_insert(id);
                    }
                    let children = mem::take(&mut self.nodes[id].children);
                    let children = self.simplify(children, &mut HashMap::new());
                    self.nodes[id].children = children;
                }
                FieldType::If => {
                    let children = mem::take(&mut self.nodes[id].children);
                    let children = self.simplify(children, &mut scope.clone());
                    self.nodes[id].children = children;
                }
                FieldType::ElseIf | FieldType::Else => {
                    let children = mem::take(&mut self.nodes[id].children);
                    let children = self.simplify(children, &mut initial.clone());
                    self.nodes[id].children = children;
                }
                _ => {}
            }
        }
        kept
    }

    fn materialize(&self, body: &[usize]) -> Vec<FieldLogicNode> {
        body.iter()
            .map(|&id| {
                let node = &self.nodes[id];
                FieldLogicNode {
                    field_type: node.field_type,
                    expr: node.expr.clone(),
                    atom: node.atom.clone(),
                    first_field: node.first_field,
                    other_fields: node.other_fields.clone(),
                    content: self.materialize(&node.children),
                }
            })
            .collect()
    }
}
