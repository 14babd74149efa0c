/*
 * ast.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Parsed-field AST types.
//!
//! This module defines the node shape shared by the field parser, the
//! dictionary builder and the logic-tree reducer. A node keeps the field's
//! classified type, its expression (for the forms that carry one), the
//! permanent field ID it came from, and the nested body for block-opening
//! forms.

use serde::Serialize;

/// Classification of one field's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    /// Plain merge content (any text not recognized as a directive).
    Content,
    /// `if <expr>` / `? <expr>` — opens a conditional block.
    If,
    /// `elseif <expr>` / `:? <expr>` — continues a conditional chain.
    ElseIf,
    /// `else` / `:` — final branch of a conditional chain.
    Else,
    /// `endif` / `/?` — closes a conditional block.
    EndIf,
    /// `list <expr>` / `# <expr>` — opens a repeated block.
    List,
    /// `endlist` / `/#` — closes a repeated block.
    EndList,
}

impl FieldType {
    /// Keyword prefix used when reconstructing field text. Expression-bearing
    /// forms keep their trailing space.
    pub fn prefix(&self) -> &'static str {
        match self {
            FieldType::Content => "",
            FieldType::If => "if ",
            FieldType::ElseIf => "elseif ",
            FieldType::Else => "else",
            FieldType::EndIf => "endif",
            FieldType::List => "list ",
            FieldType::EndList => "endlist",
        }
    }

    /// Display name, as used in parse error messages and serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Content => "Content",
            FieldType::If => "If",
            FieldType::ElseIf => "ElseIf",
            FieldType::Else => "Else",
            FieldType::EndIf => "EndIf",
            FieldType::List => "List",
            FieldType::EndList => "EndList",
        }
    }
}

/// One parsed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    /// Classified field type.
    pub field_type: FieldType,
    /// Expression text as captured (leading whitespace consumed by the
    /// keyword match, trailing whitespace kept; plain content is trimmed).
    /// `None` only for the forms that never carry one (`Else`, `EndIf`,
    /// `EndList`); a directive written with an empty expression keeps the
    /// empty string.
    pub expr: Option<String>,
    /// Permanent field ID this node came from. Zero marks synthetic nodes
    /// injected by the parser (list punctuation).
    pub number: u32,
    /// Atom assigned by the dictionary builder, once atomized.
    pub atom: Option<String>,
    /// Nested body for block-opening forms (`If`, `ElseIf`, `Else`, `List`),
    /// including the closing field. Empty for leaves.
    pub children: Vec<ParsedField>,
}

impl ParsedField {
    pub fn new(field_type: FieldType, expr: Option<String>, number: u32) -> Self {
        ParsedField {
            field_type,
            expr,
            number,
            atom: None,
            children: Vec::new(),
        }
    }

    /// The synthetic list-punctuation node injected before every `EndList`.
    pub fn punctuation() -> Self {
        ParsedField::new(FieldType::Content, Some("_punc".to_string()), 0)
    }

    /// True for synthetic list-punctuation nodes.
    pub fn is_punctuation(&self) -> bool {
        self.number == 0
            && self.field_type == FieldType::Content
            && self.expr.as_deref() == Some("_punc")
    }

    /// Canonical field text: keyword prefix plus the trimmed expression.
    pub fn text(&self) -> String {
        format!(
            "{}{}",
            self.field_type.prefix(),
            self.expr.as_deref().map(str::trim).unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefixes() {
        assert_eq!(FieldType::Content.prefix(), "");
        assert_eq!(FieldType::If.prefix(), "if ");
        assert_eq!(FieldType::ElseIf.prefix(), "elseif ");
        assert_eq!(FieldType::Else.prefix(), "else");
        assert_eq!(FieldType::EndIf.prefix(), "endif");
        assert_eq!(FieldType::List.prefix(), "list ");
        assert_eq!(FieldType::EndList.prefix(), "endlist");
    }

    #[test]
    fn test_type_serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&FieldType::ElseIf).unwrap(),
            "\"ElseIf\""
        );
    }

    #[test]
    fn test_canonical_text() {
        let field = ParsedField::new(FieldType::If, Some("x > 3".to_string()), 1);
        assert_eq!(field.text(), "if x > 3");
        let field = ParsedField::new(FieldType::EndIf, None, 2);
        assert_eq!(field.text(), "endif");
        let field = ParsedField::new(FieldType::If, None, 3);
        assert_eq!(field.text(), "if ");
    }

    #[test]
    fn test_punctuation_node() {
        let punc = ParsedField::punctuation();
        assert!(punc.is_punctuation());
        assert_eq!(punc.number, 0);
        assert_eq!(punc.text(), "_punc");
        let real = ParsedField::new(FieldType::Content, Some("_punc".to_string()), 5);
        assert!(!real.is_punctuation());
    }
}
