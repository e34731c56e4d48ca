// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

/// A range of host source text.
///
/// Offsets are whatever unit the caller used when it decoded the string
/// literal into `DecodedChar`s (usually byte offsets into the source file).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,  // The offset of the first unit covered
    pub length: usize, // The number of units covered; 0 for a single position
}

impl Span {
    /// Create a new `Span` representing a range of text.
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a new `Span` representing a single position.
    pub fn new_position(start: usize) -> Self {
        Self { start, length: 0 }
    }

    /// Create a `Span` from a start offset and an (exclusive) end offset.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// Combine two ranges into a single `Span` running from the start
    /// of the first to the end of the second.
    pub fn from_range_pair(range_start: &Span, range_end: &Span) -> Self {
        Self::from_bounds(range_start.start, range_end.end())
    }

    /// The (exclusive) end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Get the starting position of a range as a zero-length `Span`.
    pub fn get_position_by_range_start(&self) -> Self {
        Self::new_position(self.start)
    }

    /// Get the ending position of a range as a zero-length `Span`.
    pub fn get_position_by_range_end(&self) -> Self {
        Self::new_position(self.end())
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Span;

    #[test]
    fn test_span_constructors() {
        {
            let span = Span::from_bounds(3, 7);
            assert_eq!(span, Span::new(3, 4));
            assert_eq!(span.end(), 7);
            assert_eq!(span.to_string(), "3..7");
        }

        {
            let first = Span::new(2, 2);
            let last = Span::new(10, 6);
            assert_eq!(Span::from_range_pair(&first, &last), Span::new(2, 14));
        }

        {
            let span = Span::new(5, 3);
            assert_eq!(span.get_position_by_range_start(), Span::new_position(5));
            assert_eq!(span.get_position_by_range_end(), Span::new_position(8));
            assert!(span.get_position_by_range_end().is_empty());
            assert!(span.contains(7));
            assert!(!span.contains(8));
        }
    }
}
