//! Source location tracking for diagnostics and line directives.
//!
//! Provides [`Span`], the file/line pair every design object and statement
//! carries back to its origin in the HDL source.

use std::fmt;

use crate::FileId;

/// A source location: the file index into the design's file table plus a
/// 1-indexed line number.
///
/// Line 0 means "no location" and is what [`Span::default`] produces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Index into [`Design::files`](crate::Design::files).
    pub file: FileId,
    /// Line number (1-indexed, 0 when unknown).
    pub line: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(file: FileId, line: u32) -> Self {
        Self { file, line }
    }

    /// Whether this span points at a real source line.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.index(), self.line)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.index(), self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        let span = Span::new(FileId::new(2), 17);
        assert_eq!(format!("{}", span), "2:17");
    }

    #[test]
    fn default_span_is_unknown() {
        assert!(!Span::default().is_known());
        assert!(Span::new(FileId::new(0), 1).is_known());
    }
}
