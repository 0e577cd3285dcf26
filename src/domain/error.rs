//! Domain-level errors (no external dependencies)

use std::collections::TryReserveError;
use std::fmt;

use generational_arena::Index;
use thiserror::Error;

/// Which operand of a combination an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Domain errors represent tree construction violations.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{side} operand already has a parent: {text}")]
    AlreadyAttached { side: Side, text: String },

    #[error("node still has a parent: {text}")]
    HasParent { text: String },

    #[error("allocation failed while {context}")]
    Allocation {
        context: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("node handle no longer valid: {0:?}")]
    StaleHandle(Index),
}

impl DomainError {
    pub fn is_attachment(&self) -> bool {
        matches!(
            self,
            DomainError::AlreadyAttached { .. } | DomainError::HasParent { .. }
        )
    }
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
