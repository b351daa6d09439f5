/*
 * ==========================================================================
 * PSEUDO - Structured Pseudocode Interpreter
 * ==========================================================================
 * 
 * Author:   Sam Wilcox
 * 
 * License:
 * This file is part of the PSEUDO interpreter project.
 * 
 * PSEUDO is dual-licensed under the terms of:
 *   - The MIT license
 *   - The Apache License, Version 2.0
 * 
 * You may choose either license to govern your use of this software.
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * 
 * ==========================================================================
 */

use serde::Serialize;

/// A half-open byte range `[start, end)` into the source text.
///
/// Every symbol, token, expression node and statement records the span it
/// was produced from so that diagnostics can point back at the exact text
/// the user wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Offset of the first byte covered by this span.
    pub start: usize,

    /// Offset one past the last byte covered by this span.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the smallest span covering every span in the iterator,
    /// or `None` if the iterator is empty.
    pub fn union_all<I: IntoIterator<Item = Span>>(spans: I) -> Option<Span> {
        spans.into_iter().reduce(Span::merge)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts the start offset into a 1-based line and 0-based column
    /// (counted in characters) within `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let start = self.start.min(source.len());
        let before = source.get(..start).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(idx) => before[idx + 1..].chars().count(),
            None => before.chars().count(),
        };
        (line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both_ranges() {
        let merged = Span::new(4, 6).merge(Span::new(1, 3));
        assert_eq!(merged, Span::new(1, 6));
    }

    #[test]
    fn line_col_counts_from_last_newline() {
        let source = "DECLARE x: INTEGER\nx <- 5";
        let span = Span::new(source.find("<-").unwrap(), source.len());
        assert_eq!(span.line_col(source), (2, 2));
    }
}
