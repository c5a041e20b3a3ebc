//! Rendered report types shared by the formatter and the report panel

use serde::Serialize;

/// Half-open byte range `[start, end)` into a rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Report text plus the spans to highlight in it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedReport {
    pub text: String,
    pub highlights: Vec<Span>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        assert_eq!(Span::new(4, 9).len(), 5);
        assert!(Span::new(3, 3).is_empty());
    }
}
