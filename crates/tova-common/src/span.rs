use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// All positions in the Tova compiler are byte offsets into the original
/// UTF-8 source string. Human-readable line/column pairs are computed on
/// demand via [`LineIndex`] when a diagnostic is rendered. Lines and
/// columns are both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// A zero-length span at a single offset.
    pub fn point(offset: u32) -> Self {
        Self { start: offset, end: offset }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `offset` falls inside this span (start inclusive, end exclusive;
    /// an offset equal to `end` counts for empty spans so point lookups work).
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && (offset < self.end || (self.is_empty() && offset == self.end))
    }
}

/// Pre-computed index of line start offsets for on-demand line/column lookup.
///
/// Built once per source file; converts byte offsets to 1-based
/// (line, column) pairs via binary search. A `\r` is ordinary whitespace
/// with no effect on columns, so CRLF and LF sources agree on positions.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index by scanning the source text for newlines.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    ///
    /// Column is measured in bytes from the start of the line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = self.line_starts.partition_point(|&start| start <= offset);
        let line_idx = line_idx.saturating_sub(1);
        let line = (line_idx as u32) + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(5, 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert!(span.contains(5));
        assert!(span.contains(9));
        assert!(!span.contains(10));
    }

    #[test]
    fn span_point_is_empty() {
        let span = Span::point(3);
        assert!(span.is_empty());
        assert!(span.contains(3));
    }

    #[test]
    fn span_merge_covers_both() {
        let merged = Span::new(5, 10).merge(Span::new(8, 15));
        assert_eq!(merged, Span::new(5, 15));
    }

    #[test]
    fn line_index_multi_line() {
        let idx = LineIndex::new("fn add() {\n  1\n}");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(3), (1, 4));
        // '1' on the second line is at offset 13.
        assert_eq!(idx.line_col(13), (2, 3));
        // closing brace on line 3.
        assert_eq!(idx.line_col(15), (3, 1));
        assert_eq!(idx.line_count(), 3);
    }

    #[test]
    fn line_index_crlf_counts_cr_as_line_content() {
        // CR is part of line 1; only LF starts a new line.
        let idx = LineIndex::new("ab\r\ncd");
        assert_eq!(idx.line_col(2), (1, 3)); // the \r
        assert_eq!(idx.line_col(4), (2, 1)); // 'c'
    }
}
