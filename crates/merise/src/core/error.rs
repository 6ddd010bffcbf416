//! Core error types for diagram editing
//!
//! This module defines the error types surfaced by the state manager, the
//! edit sessions and the persistence layer.

use std::fmt;

use thiserror::Error;

/// Core error types for diagram editing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Deserialize error: {message}")]
    Deserialize { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Confirmation required: {}", join_warnings(.warnings))]
    Unconfirmed { warnings: Vec<ValidationWarning> },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create a new deserialize error
    pub fn deserialize_error(message: impl Into<String>) -> Self {
        Self::Deserialize {
            message: message.into(),
        }
    }

    /// Create a new persistence error
    pub fn persistence_error(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a new lookup error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Blocking problems found while validating an edit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} name cannot be empty")]
    EmptyName { kind: String },

    #[error("duplicate attribute names: {}", .names.join(", "))]
    DuplicateAttributes { names: Vec<String> },
}

/// Non-blocking problems that need the user's confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The entity defines no primary key attribute
    MissingPrimaryKey,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::MissingPrimaryKey => write!(f, "no primary key defined"),
        }
    }
}

fn join_warnings(warnings: &[ValidationWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
