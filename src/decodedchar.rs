// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::ops::Index;

use crate::{location::Span, RegexError};

/// One logical pattern character together with the host source text it
/// was decoded from, e.g. the `a` produced by the escape `\u0061` spans
/// all six source characters.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct DecodedChar {
    pub value: char,
    pub span: Span,
}

impl DecodedChar {
    pub fn new(value: char, span: Span) -> Self {
        Self { value, span }
    }
}

impl PartialEq<char> for DecodedChar {
    fn eq(&self, other: &char) -> bool {
        self.value == *other
    }
}

/// The decoded pattern: an ordered run of `DecodedChar` whose spans are
/// contiguous and strictly increasing.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct DecodedChars {
    chars: Vec<DecodedChar>,

    // host offset of the pattern, kept for an empty pattern
    start: usize,
}

impl DecodedChars {
    /// Checks the span invariant of a caller supplied decoding.
    pub fn new(chars: Vec<DecodedChar>) -> Result<Self, RegexError> {
        for (index, decoded_char) in chars.iter().enumerate() {
            if decoded_char.span.is_empty() {
                return Err(RegexError::EmptySpan(index));
            }

            if index > 0 && chars[index - 1].span.end() != decoded_char.span.start {
                return Err(RegexError::DiscontiguousSpan(index));
            }
        }

        let start = chars.first().map_or(0, |first| first.span.start);
        Ok(Self { chars, start })
    }

    /// Decodes plain text one-to-one, i.e. with no host escapes.
    /// Spans are UTF-8 byte offsets starting at `offset`.
    pub fn from_text(text: &str, offset: usize) -> Self {
        let chars = text
            .char_indices()
            .map(|(index, value)| {
                DecodedChar::new(value, Span::new(offset + index, value.len_utf8()))
            })
            .collect();

        Self {
            chars,
            start: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DecodedChar> {
        self.chars.get(index)
    }

    pub fn as_slice(&self) -> &[DecodedChar] {
        &self.chars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodedChar> {
        self.chars.iter()
    }

    /// The logical pattern string.
    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.value).collect()
    }

    /// The host span covered by the chars in `start..end`.
    /// An empty range yields a zero-length span at the position it denotes.
    pub fn span_of_range(&self, start: usize, end: usize) -> Span {
        if start < end {
            Span::from_range_pair(&self.chars[start].span, &self.chars[end - 1].span)
        } else {
            self.position_span(start)
        }
    }

    /// A zero-length span located before the char at `index`, or after
    /// the last char when `index` is at the end.
    pub fn position_span(&self, index: usize) -> Span {
        match self.chars.get(index) {
            Some(decoded_char) => decoded_char.span.get_position_by_range_start(),
            None => match self.chars.last() {
                Some(last) => last.span.get_position_by_range_end(),
                None => Span::new_position(self.start),
            },
        }
    }
}

impl Index<usize> for DecodedChars {
    type Output = DecodedChar;

    fn index(&self, index: usize) -> &Self::Output {
        &self.chars[index]
    }
}

impl<'a> IntoIterator for &'a DecodedChars {
    type Item = &'a DecodedChar;
    type IntoIter = std::slice::Iter<'a, DecodedChar>;

    fn into_iter(self) -> Self::IntoIter {
        self.chars.iter()
    }
}
