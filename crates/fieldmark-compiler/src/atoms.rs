/*
 * atoms.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Atom assignment for field expressions.
//!
//! An atom is a short symbolic name standing in for a field expression in
//! compiled templates and generated code. Atoms are memoized per distinct
//! expression string, so every repeat of an expression shares the first
//! occurrence's atom. The name is the field ID of that first occurrence
//! prefixed with `L` for lists and `C` for everything else.

use std::collections::HashMap;

use crate::ast::{FieldType, ParsedField};
use crate::error::{CompileError, CompileResult};

/// Memoized expression-to-atom table.
#[derive(Debug, Default)]
pub struct FieldAtomizer {
    atoms: HashMap<String, String>,
}

impl FieldAtomizer {
    pub fn new() -> Self {
        FieldAtomizer::default()
    }

    /// Atom for the given field, assigning one on first sight of its
    /// expression. A field without an expression cannot be atomized; the
    /// dictionary builder only asks for expression-bearing fields, so that
    /// case is an internal error.
    pub fn atomize(&mut self, field: &ParsedField) -> CompileResult<String> {
        let Some(expr) = field.expr.as_deref() else {
            return Err(CompileError::internal(
                "cannot atomize a field with no expression",
            ));
        };
        if let Some(atom) = self.atoms.get(expr) {
            return Ok(atom.clone());
        }
        let marker = if field.field_type == FieldType::List {
            'L'
        } else {
            'C'
        };
        let atom = format!("{marker}{}", field.number);
        self.atoms.insert(expr.to_string(), atom.clone());
        Ok(atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_atoms_use_first_occurrence_number() {
        let mut atomizer = FieldAtomizer::new();
        let first = ParsedField::new(FieldType::Content, Some("Name".to_string()), 2);
        let repeat = ParsedField::new(FieldType::Content, Some("Name".to_string()), 7);
        assert_eq!(atomizer.atomize(&first).unwrap(), "C2");
        assert_eq!(atomizer.atomize(&repeat).unwrap(), "C2");
    }

    #[test]
    fn test_list_atoms_use_l_marker() {
        let mut atomizer = FieldAtomizer::new();
        let list = ParsedField::new(FieldType::List, Some("People".to_string()), 1);
        assert_eq!(atomizer.atomize(&list).unwrap(), "L1");
    }

    #[test]
    fn test_distinct_expressions_get_distinct_atoms() {
        let mut atomizer = FieldAtomizer::new();
        let a = ParsedField::new(FieldType::Content, Some("A".to_string()), 1);
        let b = ParsedField::new(FieldType::Content, Some("B".to_string()), 2);
        assert_eq!(atomizer.atomize(&a).unwrap(), "C1");
        assert_eq!(atomizer.atomize(&b).unwrap(), "C2");
    }

    #[test]
    fn test_expressionless_field_is_an_error() {
        let mut atomizer = FieldAtomizer::new();
        let endif = ParsedField::new(FieldType::EndIf, None, 3);
        assert!(atomizer.atomize(&endif).is_err());
    }
}
