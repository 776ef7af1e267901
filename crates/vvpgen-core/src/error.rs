//! Fatal error type for code generation.
//!
//! Errors here abort generation. Recoverable problems (unsupported
//! constructs, multiple drivers on a single-driver net) are not errors in
//! this sense: they are recorded as diagnostics and generation continues.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CodegenError
//! ├── InvariantViolation - the design graph breaks an assumption
//! ├── ResourceExhausted  - a word or flag pool ran out
//! ├── Internal           - a generator bug, e.g. unbalanced stacks
//! └── Io                 - writing the program failed
//! ```

use thiserror::Error;

use crate::Span;

/// A fatal code-generation error.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The input design violates an assumption the generator relies on.
    #[error("at {span}: invariant violation: {message}")]
    InvariantViolation { message: String, span: Span },

    /// A fixed-size register pool has no free entries.
    #[error("{pool} pool exhausted ({capacity} entries)")]
    ResourceExhausted { pool: &'static str, capacity: usize },

    /// The generator reached an inconsistent internal state.
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Writing the program text failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    /// Build an invariant violation.
    pub fn invariant(message: impl Into<String>, span: Span) -> Self {
        Self::InvariantViolation {
            message: message.into(),
            span,
        }
    }

    /// Build an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result alias used throughout code generation.
pub type CodegenResult<T> = std::result::Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileId;

    #[test]
    fn invariant_display_includes_location() {
        let err = CodegenError::invariant("mux has 2 inputs", Span::new(FileId::new(1), 9));
        assert_eq!(
            err.to_string(),
            "at 1:9: invariant violation: mux has 2 inputs"
        );
    }

    #[test]
    fn exhaustion_display() {
        let err = CodegenError::ResourceExhausted {
            pool: "flag",
            capacity: 504,
        };
        assert_eq!(err.to_string(), "flag pool exhausted (504 entries)");
    }
}
