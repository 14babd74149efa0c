/*
 * error.rs
 * Copyright (c) 2025 Fieldmark contributors
 */

//! Error types for template compilation.

use thiserror::Error;

/// Errors that can occur while compiling a template.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The template document itself is unusable (tracked revisions,
    /// a text box inside a field span, and similar structural faults).
    #[error("{message}")]
    InvalidTemplate { message: String },

    /// A field uses the mini-language incorrectly (unmatched If/List,
    /// stray closers, a branch after Else). The display strings are
    /// load-bearing; downstream tooling matches on them.
    #[error("{message}")]
    FieldSyntax { message: String },

    /// Rejected recognizer configuration (bad delimiter specification).
    #[error("{message}")]
    Config { message: String },

    /// Document tree reading or writing failed.
    #[error(transparent)]
    Document(#[from] fieldmark_doctree::Error),

    /// Serialization failure for one of the JSON interfaces.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A compiler invariant was violated. Always a defect, never a
    /// template-content problem.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub(crate) fn invalid_template(message: impl Into<String>) -> Self {
        CompileError::InvalidTemplate {
            message: message.into(),
        }
    }

    pub(crate) fn field_syntax(message: impl Into<String>) -> Self {
        CompileError::FieldSyntax {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        CompileError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for template compilation.
pub type CompileResult<T> = Result<T, CompileError>;
