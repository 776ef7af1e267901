//! Recoverable problems found during generation.
//!
//! A diagnostic does not stop generation: the offending construct is
//! replaced by a well-formed placeholder and the run continues, so one pass
//! reports every problem. The error count decides the final exit status.

use std::fmt;

use tracing::{error, warn};
use vvpgen_core::{Design, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn keyword(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    /// Render with the file name resolved against the design.
    pub fn render(&self, design: &Design) -> String {
        let kind = self.severity.keyword();
        if self.span.is_known() {
            format!(
                "{}:{}: {kind}: {}",
                design.file_name(self.span.file),
                self.span.line,
                self.message
            )
        } else {
            format!("{kind}: {}", self.message)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.severity.keyword();
        write!(f, "{}: {kind}: {}", self.span, self.message)
    }
}

/// Collected diagnostics of one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    errors: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        let message = message.into();
        error!(%span, "{message}");
        self.errors += 1;
        self.items.push(Diagnostic {
            severity: Severity::Error,
            span,
            message,
        });
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        let message = message.into();
        warn!(%span, "{message}");
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            span,
            message,
        });
    }

    /// Additional context for the preceding diagnostic.
    pub fn note(&mut self, span: Span, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Note,
            span,
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
