// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::BTreeMap;

use crate::{
    ast::{Node, NodeOrToken},
    decodedchar::DecodedChars,
    dotnet::token::{Token, TokenValue},
    location::Span,
    options::RegexOptions,
};

/// The capture table: every capture group name and number, with the span
/// of the group that defines it.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct CaptureMaps {
    pub names_to_span: BTreeMap<String, Span>,
    pub numbers_to_span: BTreeMap<i32, Span>,
}

/// Builds the capture table of a parsed pattern.
///
/// Number 0 is the whole pattern. Plain groups are numbered from 1 in
/// order of their open paren, then named groups take the lowest numbers
/// still free, in order of first appearance. Explicit numbers such as
/// `(?<5>...)` keep theirs. The first definition of a name or number wins.
pub fn analyze(text: &DecodedChars, root: &Node, options: RegexOptions) -> CaptureMaps {
    let mut analyzer = CaptureInfoAnalyzer::new(text);
    analyzer.collect_captures(root, options);
    analyzer.assign_numbers_to_names()
}

struct CaptureInfoAnalyzer<'a> {
    text: &'a DecodedChars,
    maps: CaptureMaps,

    // names in order of first appearance
    names: Vec<String>,
    auto_number: i32,
}

impl<'a> CaptureInfoAnalyzer<'a> {
    fn new(text: &'a DecodedChars) -> Self {
        let mut maps = CaptureMaps::default();
        maps.numbers_to_span
            .insert(0, text.span_of_range(0, text.len()));

        Self {
            text,
            maps,
            names: vec![],
            auto_number: 1,
        }
    }

    /// Walks `node` under `options` and returns the options in effect after
    /// it. Only `(?imnsx)` changes them, for the rest of the enclosing group.
    fn collect_captures(&mut self, node: &Node, options: RegexOptions) -> RegexOptions {
        match node {
            Node::SimpleOptionsGrouping(grouping) => {
                return options.with_inline_delta(&grouping.options.chars);
            }
            Node::NestedOptionsGrouping(grouping) => {
                let embedded_options = options.with_inline_delta(&grouping.options.chars);
                self.collect_captures(&grouping.expression, embedded_options);
            }
            Node::SimpleGrouping(grouping) => {
                if !options.contains(RegexOptions::EXPLICIT_CAPTURE)
                    && !is_disguised_question_grouping(&grouping.expression)
                {
                    let span = self.grouping_span(node);
                    self.maps
                        .numbers_to_span
                        .entry(self.auto_number)
                        .or_insert(span);
                    self.auto_number += 1;
                }
                self.collect_captures(&grouping.expression, options);
            }
            Node::CaptureGrouping(grouping) => {
                let span = self.grouping_span(node);
                self.record_capture(&grouping.capture, span);
                self.collect_captures(&grouping.expression, options);
            }
            Node::BalancingGrouping(grouping) => {
                // only the first name defines a capture, the second refers to one
                let span = self.grouping_span(node);
                self.record_capture(&grouping.first_capture, span);
                self.collect_captures(&grouping.expression, options);
            }
            Node::ConditionalExpressionGrouping(grouping) => {
                // the condition is numbered like any other group, and inline
                // options inside it do not leak into the result
                self.collect_captures(&grouping.grouping, options);
                self.collect_captures(&grouping.result, options);
            }
            _ if node.grouping_parens().is_some() => {
                if let Some(expression) = node.grouping_expression() {
                    self.collect_captures(expression, options);
                }
            }
            _ => {
                let mut options = options;
                for child in node.children() {
                    if let NodeOrToken::Node(child) = child {
                        options = self.collect_captures(child, options);
                    }
                }
                return options;
            }
        }

        options
    }

    fn record_capture(&mut self, capture: &Token, span: Span) {
        match &capture.value {
            Some(TokenValue::Number(number)) => {
                self.maps.numbers_to_span.entry(*number).or_insert(span);
            }
            Some(TokenValue::Name(name)) => {
                if !self.maps.names_to_span.contains_key(name) {
                    self.maps.names_to_span.insert(name.clone(), span);
                    self.names.push(name.clone());
                }
            }
            None => {
                // missing capture, nothing to record
            }
        }
    }

    /// From the open paren to the close paren, or to the end of the
    /// pattern when the close paren is missing.
    fn grouping_span(&self, grouping: &Node) -> Span {
        let Some((open_paren, close_paren)) = grouping.grouping_parens() else {
            return self.text.span_of_range(0, self.text.len());
        };

        let start = open_paren
            .span()
            .unwrap_or_else(|| self.text.position_span(0));
        let end = close_paren
            .span()
            .unwrap_or_else(|| self.text.position_span(self.text.len()));

        Span::from_range_pair(&start, &end)
    }

    fn assign_numbers_to_names(mut self) -> CaptureMaps {
        for name in &self.names {
            while self.maps.numbers_to_span.contains_key(&self.auto_number) {
                self.auto_number += 1;
            }

            if let Some(span) = self.maps.names_to_span.get(name) {
                self.maps.numbers_to_span.insert(self.auto_number, *span);
            }
            self.auto_number += 1;
        }

        self.maps
    }
}

/// Whether the body of a plain group starts with a `?` text, i.e. the
/// group came from an unrecognized `(?...)` construct and is not a capture.
fn is_disguised_question_grouping(expression: &Node) -> bool {
    let mut current = expression;

    // the leftmost branch of an alternation
    if let Node::Alternation(alternation) = current {
        match alternation.sequences.first() {
            Some(first) => current = first,
            None => return false,
        }
    }

    match current {
        Node::Sequence(sequence) => matches!(
            sequence.children.first(),
            Some(Node::Text(text)) if text.text.first_char() == Some('?')
        ),
        _ => false,
    }
}
