// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashSet;

use embedded_regex::{DecodedChar, DecodedChars, RegexOptions, RegexTree, Span};
use proptest::prelude::*;

const PATTERN_CHARS: &[char] = &[
    'a', 'b', 'x', 'u', 'c', 'p', 'k', 'n', 'i', 'd', 'P', '0', '1', '9', '(', ')', '[', ']',
    '{', '}', '\\', '?', '*', '+', '|', '-', '^', '$', '.', '<', '>', '\'', '#', ':', '=', '!',
    ',', ' ', '\n',
    // non-ASCII: letter, other number, CJK, combining mark, astral, zero-width joiner
    'é', '²', '文', '\u{0301}', '😀', '\u{200D}',
];

fn pattern() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PATTERN_CHARS), 0..32)
        .prop_map(|chars| chars.into_iter().collect())
}

/// A pattern as decoded from a host literal: each char came from 1 to 6
/// units of host text (e.g. `\u0061` is six units for `a`), and the literal
/// starts at some offset into the host source.
fn decoded_pattern() -> impl Strategy<Value = DecodedChars> {
    (
        0usize..100,
        prop::collection::vec((prop::sample::select(PATTERN_CHARS), 1usize..=6), 0..32),
    )
        .prop_map(|(offset, chars)| {
            let mut start = offset;
            let decoded = chars
                .into_iter()
                .map(|(value, length)| {
                    let decoded_char = DecodedChar::new(value, Span::new(start, length));
                    start += length;
                    decoded_char
                })
                .collect();

            DecodedChars::new(decoded).unwrap()
        })
}

fn options() -> impl Strategy<Value = RegexOptions> {
    prop::sample::select(vec![
        RegexOptions::empty(),
        RegexOptions::IGNORE_PATTERN_WHITESPACE,
        RegexOptions::EXPLICIT_CAPTURE,
        RegexOptions::ECMA_SCRIPT,
    ])
}

fn parse(pattern: &str, options: RegexOptions) -> RegexTree {
    let chars = DecodedChars::from_text(pattern, 0);
    RegexTree::try_parse(&chars, options).unwrap()
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

/// The host spans of every char in the tree, in tree order.
fn tree_char_spans(tree: &RegexTree) -> Vec<Span> {
    let mut spans = vec![];
    tree.root.for_each_token(&mut |token| {
        for trivia in &token.leading_trivia {
            spans.extend(trivia.chars.iter().map(|c| c.span));
        }
        spans.extend(token.chars.iter().map(|c| c.span));
    });
    spans
}

/// The host range covered by the pattern, `start..end`.
fn host_bounds(chars: &DecodedChars) -> (usize, usize) {
    let whole = chars.span_of_range(0, chars.len());
    (whole.start, whole.end())
}

proptest! {
    #[test]
    fn test_tokens_cover_the_pattern(pattern in pattern(), options in options()) {
        let tree = parse(&pattern, options);
        prop_assert_eq!(rebuild_text(&tree), pattern);
    }

    #[test]
    fn test_parse_is_deterministic(pattern in pattern(), options in options()) {
        let first = parse(&pattern, options);
        let second = parse(&pattern, options);
        prop_assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_diagnostics_are_unique_and_in_bounds(pattern in pattern(), options in options()) {
        let tree = parse(&pattern, options);
        let length = pattern.len();

        let mut seen = HashSet::new();
        for diagnostic in &tree.diagnostics {
            prop_assert!(seen.insert(diagnostic.clone()), "duplicate {}", diagnostic);
            prop_assert!(diagnostic.span.end() <= length, "out of bounds {}", diagnostic);
        }
    }

    #[test]
    fn test_whole_pattern_is_capture_zero(pattern in pattern(), options in options()) {
        let tree = parse(&pattern, options);
        let whole = tree.capture_numbers_to_span.get(&0).copied();
        prop_assert_eq!(whole, Some(Span::new(0, pattern.len())));
    }

    #[test]
    fn test_host_spans_are_kept(chars in decoded_pattern(), options in options()) {
        let tree = RegexTree::try_parse(&chars, options).unwrap();
        let (start, end) = host_bounds(&chars);

        prop_assert_eq!(rebuild_text(&tree), chars.text());

        // the chars of the tree are exactly the decoded chars, in order
        let spans = tree_char_spans(&tree);
        let expected: Vec<Span> = chars.iter().map(|c| c.span).collect();
        prop_assert_eq!(&spans, &expected);
        for pair in spans.windows(2) {
            prop_assert_eq!(pair[0].end(), pair[1].start);
        }

        for diagnostic in &tree.diagnostics {
            prop_assert!(
                diagnostic.span.start >= start && diagnostic.span.end() <= end,
                "out of bounds {} in {}..{}",
                diagnostic,
                start,
                end
            );
        }

        for span in tree.capture_numbers_to_span.values() {
            prop_assert!(span.start >= start && span.end() <= end);
        }
        prop_assert_eq!(
            tree.capture_numbers_to_span.get(&0).copied(),
            Some(Span::from_bounds(start, end))
        );
    }
}
