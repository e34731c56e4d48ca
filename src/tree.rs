// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::{BTreeMap, HashSet};

use crate::{
    ast::Node,
    captureinfo::{self, CaptureMaps},
    config::ParserConfig,
    decodedchar::DecodedChars,
    diagnostic::Diagnostic,
    dotnet::parser::Parser,
    location::Span,
    options::RegexOptions,
    RegexError,
};

/// A parsed pattern.
///
/// The tree always covers the whole pattern, problems are reported as
/// diagnostics rather than failing the parse.
///
/// ```
/// use embedded_regex::{DecodedChars, RegexOptions, RegexTree};
///
/// let text = DecodedChars::from_text("(?<year>\\d{4})-\\k<month>", 0);
/// let tree = RegexTree::try_parse(&text, RegexOptions::empty()).unwrap();
///
/// assert_eq!(tree.diagnostics.len(), 1);
/// assert_eq!(
///     tree.diagnostics[0].message,
///     "Reference to undefined group name month"
/// );
/// assert_eq!(tree.capture_numbers_to_span.len(), 2);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RegexTree {
    pub chars: DecodedChars,
    pub root: Node,

    /// In tree order, without duplicates.
    pub diagnostics: Vec<Diagnostic>,

    pub capture_names_to_span: BTreeMap<String, Span>,
    pub capture_numbers_to_span: BTreeMap<i32, Span>,
}

impl RegexTree {
    pub fn try_parse(chars: &DecodedChars, options: RegexOptions) -> Result<Self, RegexError> {
        Self::try_parse_with_config(chars, &ParserConfig::from(options))
    }

    /// Fails only when the pattern nests deeper than
    /// `config.max_recursion_depth`.
    pub fn try_parse_with_config(
        chars: &DecodedChars,
        config: &ParserConfig,
    ) -> Result<Self, RegexError> {
        // A reference may come before the group it refers to, e.g. `\1(a)`,
        // so the first pass only collects the captures and the second pass
        // checks the references against them.
        let empty = CaptureMaps::default();
        let raw_root = Parser::new(chars, config, &empty).parse_compilation_unit()?;
        let captures = captureinfo::analyze(chars, &raw_root, config.options);

        let root = Parser::new(chars, config, &captures).parse_compilation_unit()?;
        let diagnostics = collect_diagnostics(&root);

        Ok(Self {
            chars: chars.clone(),
            root,
            diagnostics,
            capture_names_to_span: captures.names_to_span,
            capture_numbers_to_span: captures.numbers_to_span,
        })
    }

    /// The logical pattern text.
    pub fn text(&self) -> String {
        self.chars.text()
    }
}

// The same problem is often reached along several recovery paths, e.g.
// every unclosed group reports the missing `)` at the end of the pattern.
fn collect_diagnostics(root: &Node) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut diagnostics = vec![];

    root.for_each_token(&mut |token| {
        let trivia_diagnostics = token
            .leading_trivia
            .iter()
            .flat_map(|trivia| trivia.diagnostics.iter());

        for diagnostic in trivia_diagnostics.chain(token.diagnostics.iter()) {
            if seen.insert(diagnostic.clone()) {
                diagnostics.push(diagnostic.clone());
            }
        }
    });

    diagnostics
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::{Node, NodeKind},
        config::ParserConfig,
        decodedchar::{DecodedChar, DecodedChars},
        location::Span,
        options::RegexOptions,
        RegexError,
    };

    use super::RegexTree;

    fn parse(pattern: &str, options: RegexOptions) -> RegexTree {
        let chars = DecodedChars::from_text(pattern, 0);
        RegexTree::try_parse(&chars, options).unwrap()
    }

    /// Diagnostics as `message @start..end` lines.
    fn diagnostics(pattern: &str, options: RegexOptions) -> Vec<String> {
        parse(pattern, options)
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.to_string())
            .collect()
    }

    fn top_level_kinds(tree: &RegexTree) -> Vec<NodeKind> {
        match &tree.root {
            Node::CompilationUnit(unit) => match &unit.expression {
                Node::Sequence(sequence) => sequence.children.iter().map(Node::kind).collect(),
                other => vec![other.kind()],
            },
            _ => vec![],
        }
    }

    fn rebuild_text(tree: &RegexTree) -> String {
        let mut text = String::new();
        tree.root.for_each_token(&mut |token| {
            for trivia in &token.leading_trivia {
                text.extend(trivia.chars.iter().map(|c| c.value));
            }
            text.push_str(&token.text());
        });
        text
    }

    #[test]
    fn test_numbered_captures() {
        let tree = parse("(a)(b)", RegexOptions::empty());
        assert!(tree.diagnostics.is_empty());
        assert!(tree.capture_names_to_span.is_empty());
        assert_eq!(
            tree.capture_numbers_to_span.into_iter().collect::<Vec<_>>(),
            vec![
                (0, Span::new(0, 6)),
                (1, Span::new(0, 3)),
                (2, Span::new(3, 3)),
            ]
        );
    }

    #[test]
    fn test_named_backreference() {
        {
            let tree = parse(r"(?<x>a)\k<x>", RegexOptions::empty());
            assert!(tree.diagnostics.is_empty());
            assert_eq!(
                tree.capture_names_to_span.into_iter().collect::<Vec<_>>(),
                vec![("x".to_owned(), Span::new(0, 7))]
            );
            assert_eq!(
                tree.capture_numbers_to_span.into_iter().collect::<Vec<_>>(),
                vec![(0, Span::new(0, 12)), (1, Span::new(0, 7))]
            );
        }

        {
            let tree = parse(r"\k<y>", RegexOptions::empty());
            assert_eq!(top_level_kinds(&tree), vec![NodeKind::KCaptureEscape]);
            assert_eq!(
                diagnostics(r"\k<y>", RegexOptions::empty()),
                vec!["Reference to undefined group name y @3..4"]
            );
        }

        assert_eq!(
            diagnostics(r"\k", RegexOptions::empty()),
            vec![r"Malformed \k<...> named back reference @0..2"]
        );
    }

    #[test]
    fn test_forward_references() {
        // resolved by the second pass
        assert!(diagnostics(r"\1(a)", RegexOptions::empty()).is_empty());
        assert!(diagnostics(r"\k<x>(?<x>a)", RegexOptions::empty()).is_empty());

        assert_eq!(
            diagnostics(r"\1", RegexOptions::empty()),
            vec!["Reference to undefined group number 1 @1..2"]
        );

        // a name condition is a capture test only when the capture exists
        {
            let tree = parse("(?(x)a)(?<x>b)", RegexOptions::empty());
            assert!(tree.diagnostics.is_empty());
            assert_eq!(
                top_level_kinds(&tree),
                vec![NodeKind::ConditionalCaptureGrouping, NodeKind::CaptureGrouping]
            );
        }

        {
            let tree = parse("(?(x)a)", RegexOptions::empty());
            assert!(tree.diagnostics.is_empty());
            assert_eq!(
                top_level_kinds(&tree),
                vec![NodeKind::ConditionalExpressionGrouping]
            );
        }
    }

    #[test]
    fn test_quantifier_diagnostics() {
        {
            let tree = parse("a{5,2}", RegexOptions::empty());
            assert_eq!(
                top_level_kinds(&tree),
                vec![NodeKind::ClosedRangeNumericQuantifier]
            );
            assert_eq!(
                diagnostics("a{5,2}", RegexOptions::empty()),
                vec!["Illegal {x,y} with x > y @4..5"]
            );
        }

        {
            let tree = parse("{0,1}", RegexOptions::empty());
            assert_eq!(rebuild_text(&tree), "{0,1}");
            assert_eq!(
                diagnostics("{0,1}", RegexOptions::empty()),
                vec!["Quantifier {x,y} following nothing @0..1"]
            );
        }

        // not a quantifier, so plain text
        assert!(diagnostics("{0, 1}", RegexOptions::empty()).is_empty());
        assert!(diagnostics("a{,1}", RegexOptions::empty()).is_empty());

        assert_eq!(
            diagnostics("*a", RegexOptions::empty()),
            vec!["Quantifier {x,y} following nothing @0..1"]
        );
        assert_eq!(
            diagnostics("a**", RegexOptions::empty()),
            vec!["Nested quantifier * @2..3"]
        );
        assert_eq!(
            diagnostics("a*??", RegexOptions::empty()),
            vec!["Nested quantifier ? @3..4"]
        );
        assert_eq!(
            diagnostics("(?i)+", RegexOptions::empty()),
            vec!["Quantifier {x,y} following nothing @4..5"]
        );
    }

    #[test]
    fn test_paren_diagnostics() {
        assert_eq!(
            diagnostics("(a", RegexOptions::empty()),
            vec!["Not enough )'s @2..2"]
        );

        // both groups report the same missing `)`
        assert_eq!(
            diagnostics("((a", RegexOptions::empty()),
            vec!["Not enough )'s @3..3"]
        );

        assert_eq!(
            diagnostics("a)", RegexOptions::empty()),
            vec!["Too many )'s @1..2"]
        );

        assert_eq!(
            diagnostics("(?)", RegexOptions::empty()),
            vec!["Quantifier {x,y} following nothing @1..2"]
        );

        assert_eq!(
            diagnostics("(?a)", RegexOptions::empty()),
            vec![
                "Unrecognized grouping construct @0..1",
                "Quantifier {x,y} following nothing @1..2",
            ]
        );
    }

    #[test]
    fn test_grouping_diagnostics() {
        assert_eq!(
            diagnostics("(?<a-b>c)", RegexOptions::empty()),
            vec!["Reference to undefined group name b @5..6"]
        );
        assert!(diagnostics("(?<b>x)(?<a-b>c)", RegexOptions::empty()).is_empty());

        assert_eq!(
            diagnostics("(?<0>a)", RegexOptions::empty()),
            vec!["Capture number cannot be zero @3..4"]
        );

        assert_eq!(
            diagnostics("(?<>a)", RegexOptions::empty()),
            vec!["Invalid group name: Group names must begin with a word character @3..4"]
        );

        assert_eq!(
            diagnostics("(?(a)b|c|d)", RegexOptions::empty()),
            vec!["Too many | in (?()|) @8..9"]
        );

        assert_eq!(
            diagnostics("(?(1)a)", RegexOptions::empty()),
            vec!["Reference to undefined group @3..4"]
        );

        assert_eq!(
            diagnostics("(?(?<x>a)b)", RegexOptions::empty()),
            vec!["Alternation conditions do not capture and cannot be named @0..1"]
        );

        // the comment is then parsed as an unrecognized grouping
        assert_eq!(
            diagnostics("(?(?#c)b)", RegexOptions::empty()),
            vec![
                "Alternation conditions cannot be comments @0..1",
                "Unrecognized grouping construct @2..3",
                "Quantifier {x,y} following nothing @3..4",
            ]
        );

        // inline options are a valid condition
        {
            let tree = parse("(?(?i))", RegexOptions::empty());
            assert!(tree.diagnostics.is_empty());
            assert_eq!(
                tree.capture_numbers_to_span.into_iter().collect::<Vec<_>>(),
                vec![(0, Span::new(0, 7))]
            );
        }

        // a plain group as the condition captures
        {
            let tree = parse("(?(cat)|", RegexOptions::empty());
            assert_eq!(
                tree.diagnostics
                    .iter()
                    .map(|diagnostic| diagnostic.to_string())
                    .collect::<Vec<_>>(),
                vec!["Not enough )'s @8..8"]
            );
            assert_eq!(
                tree.capture_numbers_to_span.into_iter().collect::<Vec<_>>(),
                vec![(0, Span::new(0, 8)), (1, Span::new(2, 5))]
            );
        }

        // lookbehind conditions are fine
        assert!(diagnostics("(?(?<=a)b)", RegexOptions::empty()).is_empty());
    }

    #[test]
    fn test_character_class_diagnostics() {
        assert!(diagnostics("[a-z-[aeiou]]", RegexOptions::empty()).is_empty());

        {
            let tree = parse("[a-z-[aeiou]x]", RegexOptions::empty());
            assert_eq!(top_level_kinds(&tree), vec![NodeKind::CharacterClass]);
            assert_eq!(
                diagnostics("[a-z-[aeiou]x]", RegexOptions::empty()),
                vec!["A subtraction must be the last element in a character class @4..4"]
            );
        }

        assert_eq!(
            diagnostics("[z-a]", RegexOptions::empty()),
            vec!["[x-y] range in reverse order @2..3"]
        );

        assert_eq!(
            diagnostics(r"[\x41-\x40]", RegexOptions::empty()),
            vec!["[x-y] range in reverse order @5..6"]
        );

        assert!(diagnostics(r"[\n-\r]", RegexOptions::empty()).is_empty());

        assert_eq!(
            diagnostics(r"[a-\d]", RegexOptions::empty()),
            vec![r"Cannot include class \d in character range @3..5"]
        );

        assert_eq!(
            diagnostics("[a", RegexOptions::empty()),
            vec!["Unterminated [] set @2..2"]
        );

        // the first `]` is content
        assert_eq!(
            diagnostics("[]", RegexOptions::empty()),
            vec!["Unterminated [] set @2..2"]
        );
        assert!(diagnostics("[]]", RegexOptions::empty()).is_empty());
    }

    #[test]
    fn test_escape_diagnostics() {
        assert_eq!(
            diagnostics(r"\x4", RegexOptions::empty()),
            vec!["Insufficient hexadecimal digits @0..3"]
        );

        assert_eq!(
            diagnostics(r"\q", RegexOptions::empty()),
            vec![r"Unrecognized escape sequence \q @1..2"]
        );
        assert!(diagnostics(r"\q", RegexOptions::ECMA_SCRIPT).is_empty());

        assert_eq!(
            diagnostics("a\\", RegexOptions::empty()),
            vec![r"Illegal \ at end of pattern @1..2"]
        );

        assert_eq!(
            diagnostics(r"\c", RegexOptions::empty()),
            vec!["Missing control character @1..2"]
        );
        assert_eq!(
            diagnostics(r"\c!", RegexOptions::empty()),
            vec!["Unrecognized control character @2..3"]
        );

        assert_eq!(
            diagnostics(r"\p{Foo}", RegexOptions::empty()),
            vec!["Unknown property 'Foo' @3..6"]
        );
        assert_eq!(
            diagnostics(r"\p{}a", RegexOptions::empty()),
            vec!["Unknown property @0..2"]
        );
        assert_eq!(
            diagnostics(r"\pL", RegexOptions::empty()),
            vec![r"Incomplete \p{X} character escape @0..2"]
        );
        assert_eq!(
            diagnostics(r"\pLuu", RegexOptions::empty()),
            vec![r"Malformed \p{X} character escape @0..2"]
        );

        assert_eq!(
            diagnostics("(?#x", RegexOptions::empty()),
            vec!["Unterminated (?#...) comment @0..4"]
        );

        // only letters, non-spacing marks, decimal digits and connectors
        // are word chars
        assert!(diagnostics("\\²", RegexOptions::empty()).is_empty());
        assert!(diagnostics("\\½", RegexOptions::empty()).is_empty());
        assert_eq!(
            diagnostics("\\é", RegexOptions::empty()),
            vec!["Unrecognized escape sequence \\é @1..3"]
        );
    }

    #[test]
    fn test_names_with_combining_marks() {
        let tree = parse("(?<e\u{0301}>x)\\k<e\u{0301}>", RegexOptions::empty());
        assert!(tree.diagnostics.is_empty());
        assert_eq!(
            tree.capture_names_to_span.into_iter().collect::<Vec<_>>(),
            vec![("e\u{0301}".to_owned(), Span::new(0, 9))]
        );
    }

    #[test]
    fn test_backreferences_and_octal() {
        {
            let tree = parse(r"(a)\11", RegexOptions::empty());
            assert_eq!(
                top_level_kinds(&tree),
                vec![NodeKind::SimpleGrouping, NodeKind::OctalEscape]
            );
        }

        // ECMAScript takes the longest prefix naming a known capture.
        // Captures are looked up in the table of the whole pattern rather
        // than only those scanned so far; this approximation is inherited
        // engine-compatibility behavior, not a verified algorithm.
        {
            let tree = parse(r"(a)\11", RegexOptions::ECMA_SCRIPT);
            assert!(tree.diagnostics.is_empty());
            assert_eq!(
                top_level_kinds(&tree),
                vec![
                    NodeKind::SimpleGrouping,
                    NodeKind::BackreferenceEscape,
                    NodeKind::Text
                ]
            );

            // the number carries the value of the digits it spans
            let Node::CompilationUnit(unit) = &tree.root else {
                panic!("not a compilation unit");
            };
            let Node::Sequence(sequence) = &unit.expression else {
                panic!("not a sequence");
            };
            let Node::BackreferenceEscape(escape) = &sequence.children[1] else {
                panic!("not a backreference");
            };
            assert_eq!(escape.number.text(), "1");
            assert_eq!(escape.number.number(), Some(1));
        }
    }

    #[test]
    fn test_trivia_and_round_trip() {
        let pattern = "(?x) a # note\n (?<n> b ) \\k<n> [ ]";
        let tree = parse(pattern, RegexOptions::empty());
        assert!(tree.diagnostics.is_empty());
        assert_eq!(rebuild_text(&tree), pattern);
        assert_eq!(tree.text(), pattern);
    }

    #[test]
    fn test_host_spans() {
        // `a(` in host source, decoded to "a("
        let chars = DecodedChars::new(vec![
            DecodedChar::new('a', Span::new(1, 6)),
            DecodedChar::new('(', Span::new(7, 1)),
        ])
        .unwrap();

        let tree = RegexTree::try_parse(&chars, RegexOptions::empty()).unwrap();
        assert_eq!(
            tree.diagnostics
                .iter()
                .map(|diagnostic| diagnostic.to_string())
                .collect::<Vec<_>>(),
            vec!["Not enough )'s @8..8"]
        );
        assert_eq!(
            tree.capture_numbers_to_span.into_iter().collect::<Vec<_>>(),
            vec![(0, Span::new(1, 7)), (1, Span::new(7, 1))]
        );

        // an empty pattern is located at its host offset
        {
            let chars = DecodedChars::from_text("", 10);
            let tree = RegexTree::try_parse(&chars, RegexOptions::empty()).unwrap();
            assert_eq!(
                tree.capture_numbers_to_span.into_iter().collect::<Vec<_>>(),
                vec![(0, Span::new_position(10))]
            );
        }
    }

    #[test]
    fn test_recursion_limit() {
        {
            let pattern = "(".repeat(10_000);
            let chars = DecodedChars::from_text(&pattern, 0);
            assert_eq!(
                RegexTree::try_parse(&chars, RegexOptions::empty()),
                Err(RegexError::RecursionLimitExceeded(256))
            );
        }

        {
            let config = ParserConfig::builder().max_recursion_depth(8).build();
            let chars = DecodedChars::from_text("((((a))))", 0);
            assert_eq!(
                RegexTree::try_parse_with_config(&chars, &config),
                Err(RegexError::RecursionLimitExceeded(8))
            );

            let chars = DecodedChars::from_text("((a))", 0);
            assert!(RegexTree::try_parse_with_config(&chars, &config).is_ok());
        }
    }

    #[test]
    fn test_parse_twice_is_deterministic() {
        let pattern = r"(?<x>a|b)\k<x>[a-z-[aeiou]](?(x)y|z)\1{2,3}?";
        assert_eq!(
            parse(pattern, RegexOptions::empty()),
            parse(pattern, RegexOptions::empty())
        );
    }
}
