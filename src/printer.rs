// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::{Display, Formatter, Result};

use crate::{
    ast::{Node, NodeKind, NodeOrToken},
    dotnet::token::{Token, TokenKind, TokenValue, Trivia},
    tree::RegexTree,
};

const INDENT: &str = "  ";

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:?}", self)
    }
}

impl Display for TokenValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TokenValue::Number(number) => write!(f, "{}", number),
            TokenValue::Name(name) => f.write_str(name),
        }
    }
}

impl Display for Node {
    // one line per node, token and trivia, children indented by two spaces
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_node(f, self, 0)
    }
}

impl Display for RegexTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_node(f, &self.root, 0)?;

        writeln!(f, "diagnostics:")?;
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}{}", INDENT, diagnostic)?;
        }

        writeln!(f, "captures:")?;
        for (number, span) in &self.capture_numbers_to_span {
            writeln!(f, "{}{} @{}", INDENT, number, span)?;
        }
        for (name, span) in &self.capture_names_to_span {
            writeln!(f, "{}{} @{}", INDENT, name, span)?;
        }

        Ok(())
    }
}

fn write_node(f: &mut Formatter<'_>, node: &Node, level: usize) -> Result {
    writeln!(f, "{}{}", INDENT.repeat(level), node.kind())?;

    for child in node.children() {
        match child {
            NodeOrToken::Node(child) => write_node(f, child, level + 1)?,
            NodeOrToken::Token(token) => write_token(f, token, level + 1)?,
        }
    }

    Ok(())
}

fn write_token(f: &mut Formatter<'_>, token: &Token, level: usize) -> Result {
    let indent = INDENT.repeat(level);

    for trivia in &token.leading_trivia {
        write_trivia(f, trivia, &indent)?;
    }

    if token.kind == TokenKind::EndOfFile {
        return writeln!(f, "{}{}", indent, token.kind);
    }

    if token.is_missing() {
        return writeln!(f, "{}{} (missing)", indent, token.kind);
    }

    write!(f, "{}{} {:?}", indent, token.kind, token.text())?;
    if let Some(value) = &token.value {
        write!(f, " = {}", value)?;
    }
    writeln!(f)
}

fn write_trivia(f: &mut Formatter<'_>, trivia: &Trivia, indent: &str) -> Result {
    let text: String = trivia.chars.iter().map(|c| c.value).collect();
    writeln!(f, "{}{} {:?}", indent, trivia.kind, text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::NodeKind,
        decodedchar::DecodedChars,
        dotnet::token::TokenValue,
        options::RegexOptions,
        tree::RegexTree,
    };

    fn print_tree(pattern: &str, options: RegexOptions) -> String {
        let chars = DecodedChars::from_text(pattern, 0);
        RegexTree::try_parse(&chars, options).unwrap().to_string()
    }

    #[test]
    fn test_print_kinds_and_values() {
        assert_eq!(NodeKind::CompilationUnit.to_string(), "CompilationUnit");
        assert_eq!(
            NodeKind::ClosedRangeNumericQuantifier.to_string(),
            "ClosedRangeNumericQuantifier"
        );
        assert_eq!(TokenValue::Number(12).to_string(), "12");
        assert_eq!(TokenValue::Name("year".to_owned()).to_string(), "year");
    }

    #[test]
    fn test_print_tree() {
        assert_eq!(
            print_tree("(?<x>a)\\1", RegexOptions::empty()),
            r#"CompilationUnit
  Sequence
    CaptureGrouping
      OpenParenToken "("
      QuestionToken "?"
      LessThanToken "<"
      CaptureNameToken "x" = x
      GreaterThanToken ">"
      Sequence
        Text
          TextToken "a"
      CloseParenToken ")"
    BackreferenceEscape
      BackslashToken "\\"
      NumberToken "1" = 1
  EndOfFile
diagnostics:
captures:
  0 @0..9
  1 @0..7
  x @0..7
"#
        );
    }

    #[test]
    fn test_print_problems() {
        assert_eq!(
            print_tree("(a", RegexOptions::empty()),
            r#"CompilationUnit
  Sequence
    SimpleGrouping
      OpenParenToken "("
      Sequence
        Text
          TextToken "a"
      CloseParenToken (missing)
  EndOfFile
diagnostics:
  Not enough )'s @2..2
captures:
  0 @0..2
  1 @0..2
"#
        );
    }

    #[test]
    fn test_print_trivia() {
        assert_eq!(
            print_tree("a #x", RegexOptions::IGNORE_PATTERN_WHITESPACE),
            r##"CompilationUnit
  Sequence
    Text
      TextToken "a"
  WhitespaceTrivia " "
  CommentTrivia "#x"
  EndOfFile
diagnostics:
captures:
  0 @0..4
"##
        );
    }
}
