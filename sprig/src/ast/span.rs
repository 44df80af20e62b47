//! Source location tracking

use serde::{Deserialize, Serialize};

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`
    pub fn point(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// A node paired with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        assert_eq!(Span::new(0, 5).merge(Span::new(10, 15)), Span::new(0, 15));
        assert_eq!(Span::new(10, 20).merge(Span::new(5, 15)), Span::new(5, 20));
        assert_eq!(Span::new(0, 100).merge(Span::new(20, 30)), Span::new(0, 100));
    }

    #[test]
    fn test_span_point() {
        let span = Span::point(7);
        assert_eq!(span.start, 7);
        assert_eq!(span.end, 7);
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(42, 99).to_string(), "42..99");
    }

    #[test]
    fn test_span_range_conversions() {
        let range: std::ops::Range<usize> = Span::new(5, 15).into();
        assert_eq!(range, 5..15);
        let span: Span = (3..4).into();
        assert_eq!(span, Span::new(3, 4));
    }

    #[test]
    fn test_spanned_map_keeps_span() {
        let s = Spanned::new("abc".to_string(), Span::new(1, 4));
        let mapped = s.map(|text| text.len());
        assert_eq!(mapped.node, 3);
        assert_eq!(mapped.span, Span::new(1, 4));
    }
}
