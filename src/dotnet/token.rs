// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::{decodedchar::DecodedChar, diagnostic::Diagnostic, location::Span};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EndOfFile,

    Bar,          // |
    Asterisk,     // *
    Plus,         // +
    Question,     // ?
    OpenBrace,    // {
    CloseBrace,   // }
    Comma,        // ,
    OpenParen,    // (
    CloseParen,   // )
    OpenBracket,  // [
    CloseBracket, // ]
    Backslash,    // \
    Dot,          // .
    Caret,        // ^
    Dollar,       // $
    Minus,        // -
    Colon,        // :
    Equals,       // =
    Exclamation,  // !
    GreaterThan,  // >
    LessThan,     // <
    SingleQuote,  // '
    Hash,         // #

    Text,
    Number,         // value: TokenValue::Number
    CaptureName,    // value: TokenValue::Name
    Options,        // e.g. `i-sx` in `(?i-sx)`
    EscapeCategory, // e.g. `Lu` in `\p{Lu}`
}

impl TokenKind {
    /// The kind a single pattern char scans as.
    pub fn from_char(c: char) -> TokenKind {
        match c {
            '|' => TokenKind::Bar,
            '*' => TokenKind::Asterisk,
            '+' => TokenKind::Plus,
            '?' => TokenKind::Question,
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            ',' => TokenKind::Comma,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            '\\' => TokenKind::Backslash,
            '.' => TokenKind::Dot,
            '^' => TokenKind::Caret,
            '$' => TokenKind::Dollar,
            '-' => TokenKind::Minus,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            '!' => TokenKind::Exclamation,
            '>' => TokenKind::GreaterThan,
            '<' => TokenKind::LessThan,
            '\'' => TokenKind::SingleQuote,
            '#' => TokenKind::Hash,
            _ => TokenKind::Text,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TriviaKind {
    Whitespace,
    Comment,
}

/// Text that carries no meaning for matching. Always attached in front
/// of the token that follows it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub chars: Vec<DecodedChar>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Trivia {
    pub fn new(kind: TriviaKind, chars: Vec<DecodedChar>) -> Self {
        Self {
            kind,
            chars,
            diagnostics: vec![],
        }
    }

    pub fn with_diagnostic(kind: TriviaKind, chars: Vec<DecodedChar>, diagnostic: Diagnostic) -> Self {
        Self {
            kind,
            chars,
            diagnostics: vec![diagnostic],
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenValue {
    Number(i32),
    Name(String),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub leading_trivia: Vec<Trivia>,
    pub chars: Vec<DecodedChar>,
    pub diagnostics: Vec<Diagnostic>,
    pub value: Option<TokenValue>,
}

impl Token {
    pub fn new(kind: TokenKind, leading_trivia: Vec<Trivia>, chars: Vec<DecodedChar>) -> Self {
        Self {
            kind,
            leading_trivia,
            chars,
            diagnostics: vec![],
            value: None,
        }
    }

    /// A token synthesized where the pattern lacks one.
    pub fn missing(kind: TokenKind) -> Self {
        Self::new(kind, vec![], vec![])
    }

    pub fn is_missing(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn with_kind(self, kind: TokenKind) -> Self {
        Self { kind, ..self }
    }

    pub fn with_value(self, value: TokenValue) -> Self {
        Self {
            value: Some(value),
            ..self
        }
    }

    /// Attaches `diagnostic` unless the token already carries one.
    /// The first problem found on a token is the one reported.
    pub fn add_diagnostic_if_none(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.is_empty() {
            self.diagnostics.push(diagnostic);
        }
    }

    pub fn with_diagnostic_if_none(mut self, diagnostic: Diagnostic) -> Self {
        self.add_diagnostic_if_none(diagnostic);
        self
    }

    /// The span of the token's own chars, `None` when missing.
    pub fn span(&self) -> Option<Span> {
        match (self.chars.first(), self.chars.last()) {
            (Some(first), Some(last)) => Some(Span::from_range_pair(&first.span, &last.span)),
            _ => None,
        }
    }

    /// The span including leading trivia.
    pub fn full_span(&self) -> Option<Span> {
        let first = self
            .leading_trivia
            .iter()
            .flat_map(|trivia| trivia.chars.first())
            .next()
            .or(self.chars.first());

        let last = self
            .chars
            .last()
            .or_else(|| self.leading_trivia.iter().rev().flat_map(|t| t.chars.last()).next());

        match (first, last) {
            (Some(first), Some(last)) => Some(Span::from_range_pair(&first.span, &last.span)),
            _ => None,
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.value).collect()
    }

    pub fn first_char(&self) -> Option<char> {
        self.chars.first().map(|c| c.value)
    }

    /// Whether this is a text token consisting of exactly `expected_char`.
    pub fn is_text_char(&self, expected_char: char) -> bool {
        self.kind == TokenKind::Text && self.chars.len() == 1 && self.chars[0] == expected_char
    }

    pub fn number(&self) -> Option<i32> {
        match &self.value {
            Some(TokenValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Name(s)) => Some(s),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::EndOfFile => "EndOfFile",
            TokenKind::Bar => "BarToken",
            TokenKind::Asterisk => "AsteriskToken",
            TokenKind::Plus => "PlusToken",
            TokenKind::Question => "QuestionToken",
            TokenKind::OpenBrace => "OpenBraceToken",
            TokenKind::CloseBrace => "CloseBraceToken",
            TokenKind::Comma => "CommaToken",
            TokenKind::OpenParen => "OpenParenToken",
            TokenKind::CloseParen => "CloseParenToken",
            TokenKind::OpenBracket => "OpenBracketToken",
            TokenKind::CloseBracket => "CloseBracketToken",
            TokenKind::Backslash => "BackslashToken",
            TokenKind::Dot => "DotToken",
            TokenKind::Caret => "CaretToken",
            TokenKind::Dollar => "DollarToken",
            TokenKind::Minus => "MinusToken",
            TokenKind::Colon => "ColonToken",
            TokenKind::Equals => "EqualsToken",
            TokenKind::Exclamation => "ExclamationToken",
            TokenKind::GreaterThan => "GreaterThanToken",
            TokenKind::LessThan => "LessThanToken",
            TokenKind::SingleQuote => "SingleQuoteToken",
            TokenKind::Hash => "HashToken",
            TokenKind::Text => "TextToken",
            TokenKind::Number => "NumberToken",
            TokenKind::CaptureName => "CaptureNameToken",
            TokenKind::Options => "OptionsToken",
            TokenKind::EscapeCategory => "EscapeCategoryToken",
        };
        f.write_str(name)
    }
}

impl Display for TriviaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriviaKind::Whitespace => f.write_str("WhitespaceTrivia"),
            TriviaKind::Comment => f.write_str("CommentTrivia"),
        }
    }
}
