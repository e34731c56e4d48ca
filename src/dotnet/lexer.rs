// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Scanning rules:
//
// - Every token is a single char. Punctuation chars get their own kind,
//   everything else (including digits and letters) is a text token.
// - Runs such as numbers, capture names, inline options, escape categories
//   and hex/octal digits are only scanned when the parser asks for them,
//   since whether they form a unit depends on the surrounding construct.
// - Trivia is only scanned when the parser allows it before the next token:
//   - `(?#...)` comments are always trivia.
//   - With `IgnorePatternWhitespace`, `#` to end of line and runs of blanks
//     are trivia too.

use crate::{
    decodedchar::{DecodedChar, DecodedChars},
    diagnostic::{
        unknown_property_named, Diagnostic, CAPTURE_NUMBER_TOO_LARGE,
        INSUFFICIENT_HEXADECIMAL_DIGITS, UNTERMINATED_COMMENT,
    },
    location::Span,
    options::RegexOptions,
};

use super::{
    charclass::{
        is_blank, is_boundary_word_char, is_escape_category, is_escape_category_char,
        is_octal_digit,
    },
    token::{Token, TokenKind, TokenValue, Trivia, TriviaKind},
};

/// Scan cursor over the decoded pattern. Owned by exactly one parser,
/// which moves `position` back and forth while trying alternatives.
pub struct Lexer<'a> {
    text: &'a DecodedChars,
    pub position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a DecodedChars) -> Self {
        Self { text, position: 0 }
    }

    pub fn text(&self) -> &'a DecodedChars {
        self.text
    }

    pub fn peek_char(&self, offset: usize) -> Option<char> {
        self.text.get(self.position + offset).map(|c| c.value)
    }

    pub fn peek_char_and_equals(&self, offset: usize, expected_char: char) -> bool {
        matches!(self.peek_char(offset), Some(c) if c == expected_char)
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    /// The number of chars not yet scanned.
    pub fn remaining(&self) -> usize {
        self.text.len().saturating_sub(self.position)
    }

    /// Whether the unscanned text starts with `s`.
    pub fn is_at(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(offset, c)| self.peek_char_and_equals(offset, c))
    }

    pub fn sub_pattern(&self, start: usize, end: usize) -> Vec<DecodedChar> {
        self.text.as_slice()[start..end].to_vec()
    }

    fn sub_pattern_to_current_position(&self, start: usize) -> Vec<DecodedChar> {
        self.sub_pattern(start, self.position)
    }

    pub fn span_of(&self, start: usize, end: usize) -> Span {
        self.text.span_of_range(start, end)
    }

    /// A zero-length span just after the last char of the pattern.
    pub fn end_position_span(&self) -> Span {
        self.text.position_span(self.text.len())
    }
}

impl Lexer<'_> {
    pub fn scan_next_token(&mut self, allow_trivia: bool, options: RegexOptions) -> Token {
        let trivia = self.scan_trivia(allow_trivia, options);

        match self.peek_char(0) {
            Some(c) => {
                self.position += 1;
                Token::new(
                    TokenKind::from_char(c),
                    trivia,
                    self.sub_pattern(self.position - 1, self.position),
                )
            }
            None => Token::new(TokenKind::EndOfFile, trivia, vec![]),
        }
    }

    fn scan_trivia(&mut self, allow_trivia: bool, options: RegexOptions) -> Vec<Trivia> {
        let mut trivia = vec![];
        if !allow_trivia {
            return trivia;
        }

        while !self.is_at_end() {
            if let Some(comment) = self.scan_comment(options) {
                trivia.push(comment);
                continue;
            }

            if let Some(whitespace) = self.scan_whitespace(options) {
                trivia.push(whitespace);
                continue;
            }

            break;
        }

        trivia
    }

    pub fn scan_comment(&mut self, options: RegexOptions) -> Option<Trivia> {
        if self.is_at_end() {
            return None;
        }

        // # ...\n
        // ^     ^__ to here (the new line is not part of the comment)
        // |________ current char
        if options.contains(RegexOptions::IGNORE_PATTERN_WHITESPACE)
            && self.peek_char_and_equals(0, '#')
        {
            let start = self.position;
            while matches!(self.peek_char(0), Some(c) if c != '\n') {
                self.position += 1;
            }

            return Some(Trivia::new(
                TriviaKind::Comment,
                self.sub_pattern_to_current_position(start),
            ));
        }

        // (?# ... )
        // ^       ^__ to here
        // |__________ current char
        if self.is_at("(?#") {
            let start = self.position;
            while matches!(self.peek_char(0), Some(c) if c != ')') {
                self.position += 1;
            }

            if self.is_at_end() {
                let diagnostic =
                    Diagnostic::new(UNTERMINATED_COMMENT, self.span_of(start, self.position));
                return Some(Trivia::with_diagnostic(
                    TriviaKind::Comment,
                    self.sub_pattern_to_current_position(start),
                    diagnostic,
                ));
            }

            self.position += 1; // consume ')'
            return Some(Trivia::new(
                TriviaKind::Comment,
                self.sub_pattern_to_current_position(start),
            ));
        }

        None
    }

    fn scan_whitespace(&mut self, options: RegexOptions) -> Option<Trivia> {
        if !options.contains(RegexOptions::IGNORE_PATTERN_WHITESPACE) {
            return None;
        }

        let start = self.position;
        while matches!(self.peek_char(0), Some(c) if is_blank(c)) {
            self.position += 1;
        }

        if self.position > start {
            Some(Trivia::new(
                TriviaKind::Whitespace,
                self.sub_pattern_to_current_position(start),
            ))
        } else {
            None
        }
    }

    /// Scans a run of decimal digits. The value wraps like a 32-bit signed
    /// integer, and a wrapped value is flagged on the token.
    pub fn try_scan_number(&mut self) -> Option<Token> {
        const MAX_VALUE_DIV_10: i32 = i32::MAX / 10;
        const MAX_VALUE_MOD_10: i32 = i32::MAX % 10;

        let start = self.position;
        let mut value: i32 = 0;
        let mut overflow = false;

        while let Some(digit) = self.peek_char(0).and_then(|c| c.to_digit(10)) {
            let digit = digit as i32;
            if value > MAX_VALUE_DIV_10 || (value == MAX_VALUE_DIV_10 && digit > MAX_VALUE_MOD_10)
            {
                overflow = true;
            }

            value = value.wrapping_mul(10).wrapping_add(digit);
            self.position += 1;
        }

        if self.position == start {
            return None;
        }

        let mut token = Token::new(
            TokenKind::Number,
            vec![],
            self.sub_pattern_to_current_position(start),
        )
        .with_value(TokenValue::Number(value));

        if overflow {
            token.add_diagnostic_if_none(Diagnostic::new(
                CAPTURE_NUMBER_TOO_LARGE,
                self.span_of(start, self.position),
            ));
        }

        Some(token)
    }

    pub fn try_scan_capture_name(&mut self) -> Option<Token> {
        let start = self.position;
        while matches!(self.peek_char(0), Some(c) if is_boundary_word_char(c)) {
            self.position += 1;
        }

        if self.position == start {
            return None;
        }

        let chars = self.sub_pattern_to_current_position(start);
        let name = chars.iter().map(|c| c.value).collect();
        Some(Token::new(TokenKind::CaptureName, vec![], chars).with_value(TokenValue::Name(name)))
    }

    pub fn try_scan_number_or_capture_name(&mut self) -> Option<Token> {
        self.try_scan_number()
            .or_else(|| self.try_scan_capture_name())
    }

    /// Scans an inline option run, e.g. `i-sx` of `(?i-sx:...)`.
    pub fn try_scan_options(&mut self) -> Option<Token> {
        let start = self.position;
        while matches!(self.peek_char(0), Some(c) if c == '+' || c == '-' || RegexOptions::from_inline_code(c).is_some())
        {
            self.position += 1;
        }

        if self.position == start {
            None
        } else {
            Some(Token::new(
                TokenKind::Options,
                vec![],
                self.sub_pattern_to_current_position(start),
            ))
        }
    }

    /// Scans the name of `\p{name}`. An unknown name is still a category
    /// token, carrying a diagnostic.
    pub fn try_scan_escape_category(&mut self) -> Option<Token> {
        let start = self.position;
        while matches!(self.peek_char(0), Some(c) if is_escape_category_char(c)) {
            self.position += 1;
        }

        if self.position == start {
            return None;
        }

        let mut token = Token::new(
            TokenKind::EscapeCategory,
            vec![],
            self.sub_pattern_to_current_position(start),
        );

        let name = token.text();
        if !is_escape_category(&name) {
            token.add_diagnostic_if_none(Diagnostic::new(
                unknown_property_named(&name),
                self.span_of(start, self.position),
            ));
        }

        Some(token)
    }

    /// Scans exactly `count` hex digits following `\x` or `\u`.
    pub fn scan_hex_characters(&mut self, count: usize) -> Token {
        let start = self.position;
        let before_slash = start.saturating_sub(2);

        for _ in 0..count {
            if matches!(self.peek_char(0), Some(c) if c.is_ascii_hexdigit()) {
                self.position += 1;
            } else {
                break;
            }
        }

        let mut token = Token::new(
            TokenKind::Text,
            vec![],
            self.sub_pattern_to_current_position(start),
        );

        if self.position - start != count {
            token.add_diagnostic_if_none(Diagnostic::new(
                INSUFFICIENT_HEXADECIMAL_DIGITS,
                self.span_of(before_slash, self.position),
            ));
        }

        token
    }

    /// Scans up to three octal digits. ECMAScript stops as soon as the
    /// value reaches 0x20.
    pub fn scan_octal_characters(&mut self, options: RegexOptions) -> Token {
        const MAX_CHARS: usize = 3;

        let start = self.position;
        let mut value = 0;

        for _ in 0..MAX_CHARS {
            match self.peek_char(0) {
                Some(c) if is_octal_digit(c) => {
                    value = value * 8 + (c as u32 - '0' as u32);
                    self.position += 1;

                    if options.contains(RegexOptions::ECMA_SCRIPT) && value >= 0x20 {
                        break;
                    }
                }
                _ => break,
            }
        }

        Token::new(
            TokenKind::Text,
            vec![],
            self.sub_pattern_to_current_position(start),
        )
    }
}
