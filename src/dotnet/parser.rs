// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Recursive descent parser for the .NET regex dialect.
//
// The parser never gives up on a pattern: every problem is attached to the
// token responsible for it as a `Diagnostic` and parsing carries on, so a
// complete tree is always produced. The only hard failure is the recursion
// guard, which turns overly deep nesting into `RegexError`.
//
// Like the engine it mimics, the parser holds exactly one token of
// lookahead (`current_token`) and frequently moves the lexer position back
// to rescan chars under a different interpretation.

use crate::{
    ast::{
        AlternationNode, AnchorNode, BackreferenceEscapeNode, BalancingGroupingNode,
        CaptureEscapeNode, CaptureGroupingNode, CategoryEscapeNode, CharacterClassNode,
        CharacterClassRangeNode, CharacterClassSubtractionNode, ClosedRangeNumericQuantifierNode,
        CompilationUnitNode, ConditionalCaptureGroupingNode, ConditionalExpressionGroupingNode,
        ControlEscapeNode, EscapeNode, ExactNumericQuantifierNode, HexEscapeNode,
        KCaptureEscapeNode, LazyQuantifierNode, LookbehindGroupingNode, MarkedGroupingNode,
        NegatedCharacterClassNode, NestedOptionsGroupingNode, Node, NodeKind, NodeOrToken,
        OctalEscapeNode, OpenRangeNumericQuantifierNode, PosixPropertyNode, QuantifierNode,
        SequenceNode, SimpleGroupingNode, SimpleOptionsGroupingNode, TextNode, WildcardNode,
    },
    captureinfo::CaptureMaps,
    config::ParserConfig,
    decodedchar::DecodedChars,
    diagnostic::{
        cannot_include_class_in_range, nested_quantifier, reference_to_undefined_group_name,
        reference_to_undefined_group_number, unrecognized_escape_sequence, Diagnostic,
        ALTERNATION_CONDITIONS_CANNOT_BE_COMMENTS, ALTERNATION_CONDITIONS_DO_NOT_CAPTURE,
        CAPTURE_NUMBER_CANNOT_BE_ZERO, ILLEGAL_BACKSLASH_AT_END, ILLEGAL_QUANTIFIER_RANGE,
        INCOMPLETE_CHARACTER_ESCAPE, INVALID_GROUP_NAME, MALFORMED, MALFORMED_CHARACTER_ESCAPE,
        MALFORMED_NAMED_BACK_REFERENCE, MISSING_CONTROL_CHARACTER, NOT_ENOUGH_CLOSE_PARENS,
        QUANTIFIER_FOLLOWING_NOTHING, RANGE_IN_REVERSE_ORDER, REFERENCE_TO_UNDEFINED_GROUP,
        SUBTRACTION_MUST_BE_LAST, TOO_MANY_BARS_IN_CONDITIONAL, TOO_MANY_CLOSE_PARENS,
        UNKNOWN_PROPERTY, UNRECOGNIZED_CONTROL_CHARACTER, UNRECOGNIZED_GROUPING_CONSTRUCT,
        UNTERMINATED_CHARACTER_CLASS_SET,
    },
    error::RegexError,
    location::Span,
    options::RegexOptions,
};

use super::{
    charclass::{is_octal_digit, is_word_char},
    lexer::Lexer,
    token::{Token, TokenKind, TokenValue},
};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: RegexOptions,
    current_token: Token,
    captures: &'a CaptureMaps,
    recursion_depth: usize,
    max_recursion_depth: usize,
}

struct NumericQuantifierParts {
    first_number: Token,
    comma: Option<Token>,
    second_number: Option<Token>,
    close_brace: Token,
}

// `<name>` or `'name'`, with missing tokens for the parts not found.
struct CaptureParts {
    open: Token,
    capture: Token,
    close: Token,
}

impl<'a> Parser<'a> {
    /// `captures` is the capture table the references are checked
    /// against, empty on the first pass.
    pub fn new(text: &'a DecodedChars, config: &ParserConfig, captures: &'a CaptureMaps) -> Self {
        let mut lexer = Lexer::new(text);

        // the first token may carry trivia
        let current_token = lexer.scan_next_token(true, config.options);

        Self {
            lexer,
            options: config.options,
            current_token,
            captures,
            recursion_depth: 0,
            max_recursion_depth: config.max_recursion_depth,
        }
    }

    /// Returns the current token and scans the next one.
    /// `allow_trivia` decides whether the next token may carry leading trivia.
    fn consume_current_token(&mut self, allow_trivia: bool) -> Token {
        let next_token = self.lexer.scan_next_token(allow_trivia, self.options);
        std::mem::replace(&mut self.current_token, next_token)
    }

    fn reset_to_position_and_consume_current_token(&mut self, position: usize, allow_trivia: bool) {
        self.lexer.position = position;
        self.consume_current_token(allow_trivia);
    }

    /// Un-scans the char of the current token so it is read again.
    fn move_back_before_previous_scan(&mut self) {
        if self.current_token.kind != TokenKind::EndOfFile {
            self.lexer.position = self.lexer.position.saturating_sub(1);
        }
    }

    fn enter_recursion(&mut self) -> Result<(), RegexError> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_recursion_depth {
            Err(RegexError::RecursionLimitExceeded(self.max_recursion_depth))
        } else {
            Ok(())
        }
    }

    fn exit_recursion(&mut self) {
        self.recursion_depth -= 1;
    }

    fn has_capture_number(&self, number: i32) -> bool {
        self.captures.numbers_to_span.contains_key(&number)
    }

    fn has_capture_name(&self, name: &str) -> bool {
        self.captures.names_to_span.contains_key(name)
    }

    /// A zero-length span at the start of the token, or at the end of the
    /// pattern for the end-of-file token.
    fn token_start_position_span(&self, token: &Token) -> Span {
        match token.chars.first() {
            Some(first) if token.kind != TokenKind::EndOfFile => {
                first.span.get_position_by_range_start()
            }
            _ => self.lexer.end_position_span(),
        }
    }

    fn token_span(&self, token: &Token) -> Span {
        token
            .span()
            .unwrap_or_else(|| self.token_start_position_span(token))
    }

    fn token_span_including_end_of_file(&self, token: &Token) -> Span {
        if token.kind == TokenKind::EndOfFile {
            self.token_start_position_span(token)
        } else {
            self.token_span(token)
        }
    }

    fn span_between(&self, first: &Token, last: &Token) -> Span {
        Span::from_range_pair(&self.token_span(first), &self.token_span(last))
    }
}

impl Parser<'_> {
    pub fn parse_compilation_unit(mut self) -> Result<Node, RegexError> {
        // Group constructs leave their close paren to the caller. The top
        // level has no open paren, so it eats stray close parens as text.
        let expression = self.parse_alternating_sequences(true)?;

        Ok(Node::CompilationUnit(Box::new(CompilationUnitNode {
            expression,
            end_of_file: self.current_token,
        })))
    }

    fn parse_alternating_sequences(&mut self, consume_close_paren: bool) -> Result<Node, RegexError> {
        self.enter_recursion()?;
        let result = self.parse_alternating_sequences_worker(consume_close_paren);
        self.exit_recursion();
        result
    }

    // sequence ('|' sequence)*
    //
    // any sequence may be empty, e.g. `a||b`
    fn parse_alternating_sequences_worker(
        &mut self,
        consume_close_paren: bool,
    ) -> Result<Node, RegexError> {
        let first = self.parse_sequence(consume_close_paren)?;
        if self.current_token.kind != TokenKind::Bar {
            return Ok(first);
        }

        let mut sequences = vec![first];
        let mut bars = vec![];

        while self.current_token.kind == TokenKind::Bar {
            // trivia is allowed between the bar and the next sequence
            bars.push(self.consume_current_token(true));
            sequences.push(self.parse_sequence(consume_close_paren)?);
        }

        Ok(Node::Alternation(Box::new(AlternationNode { sequences, bars })))
    }

    fn parse_sequence(&mut self, consume_close_paren: bool) -> Result<Node, RegexError> {
        let mut children: Vec<Node> = vec![];
        while self.should_consume_sequence_element(consume_close_paren) {
            let child = self.parse_primary_expression_and_quantifiers(children.last())?;
            children.push(child);
        }

        Ok(Node::Sequence(Box::new(SequenceNode {
            children: merge_text_nodes(children),
        })))
    }

    fn should_consume_sequence_element(&self, consume_close_paren: bool) -> bool {
        match self.current_token.kind {
            TokenKind::EndOfFile | TokenKind::Bar => false,
            TokenKind::CloseParen => consume_close_paren,
            _ => true,
        }
    }

    fn parse_primary_expression_and_quantifiers(
        &mut self,
        last_expression: Option<&Node>,
    ) -> Result<Node, RegexError> {
        let current = self.parse_primary_expression(last_expression)?;

        // `(?imnsx)` takes no quantifier
        if current.kind() == NodeKind::SimpleOptionsGrouping {
            return Ok(current);
        }

        let node = match self.current_token.kind {
            TokenKind::Asterisk => self.parse_quantifier(current, Node::ZeroOrMoreQuantifier),
            TokenKind::Plus => self.parse_quantifier(current, Node::OneOrMoreQuantifier),
            TokenKind::Question => self.parse_quantifier(current, Node::ZeroOrOneQuantifier),
            TokenKind::OpenBrace => self.try_parse_numeric_quantifier(current),
            _ => current,
        };

        Ok(node)
    }

    fn parse_quantifier(
        &mut self,
        expression: Node,
        make_node: fn(Box<QuantifierNode>) -> Node,
    ) -> Node {
        // trivia is allowed before a lazy `?` or the next sequence element
        let quantifier = self.consume_current_token(true);
        let node = make_node(Box::new(QuantifierNode {
            expression,
            quantifier,
        }));
        self.try_parse_lazy_quantifier(node)
    }

    fn try_parse_lazy_quantifier(&mut self, quantifier: Node) -> Node {
        if self.current_token.kind != TokenKind::Question {
            return quantifier;
        }

        let question = self.consume_current_token(true);
        Node::LazyQuantifier(Box::new(LazyQuantifierNode {
            quantifier,
            question,
        }))
    }

    fn try_parse_numeric_quantifier(&mut self, expression: Node) -> Node {
        let open_brace = self.current_token.clone();
        let start = self.lexer.position;

        match self.try_parse_numeric_quantifier_parts() {
            Some(parts) => {
                let quantifier = create_numeric_quantifier(expression, open_brace, parts);
                self.try_parse_lazy_quantifier(quantifier)
            }
            None => {
                // not a quantifier, the `{` is read again as text
                self.current_token = open_brace;
                self.lexer.position = start;
                expression
            }
        }
    }

    // {n}, {n,} or {n,m}
    //  ^__ current token
    //
    // nothing is allowed between the parts
    fn try_parse_numeric_quantifier_parts(&mut self) -> Option<NumericQuantifierParts> {
        let first_number = self.lexer.try_scan_number()?;
        self.consume_current_token(false);

        let mut comma = None;
        let mut second_number = None;

        if self.current_token.kind == TokenKind::Comma {
            comma = Some(self.current_token.clone());

            let start = self.lexer.position;
            match self.lexer.try_scan_number() {
                None => self.reset_to_position_and_consume_current_token(start, false),
                Some(mut number) => {
                    self.consume_current_token(false);

                    if let (Some(min), Some(max)) = (first_number.number(), number.number()) {
                        if max < min {
                            let span = self.token_span(&number);
                            number.add_diagnostic_if_none(Diagnostic::new(
                                ILLEGAL_QUANTIFIER_RANGE,
                                span,
                            ));
                        }
                    }

                    second_number = Some(number);
                }
            }
        }

        if self.current_token.kind != TokenKind::CloseBrace {
            return None;
        }

        // trivia is allowed before a lazy `?` or the next sequence element
        let close_brace = self.consume_current_token(true);

        Some(NumericQuantifierParts {
            first_number,
            comma,
            second_number,
            close_brace,
        })
    }

    fn parse_primary_expression(
        &mut self,
        last_expression: Option<&Node>,
    ) -> Result<Node, RegexError> {
        let node = match self.current_token.kind {
            TokenKind::Dot => Node::Wildcard(Box::new(WildcardNode {
                dot: self.consume_current_token(true),
            })),
            TokenKind::Caret => Node::StartAnchor(Box::new(AnchorNode {
                anchor: self.consume_current_token(true),
            })),
            TokenKind::Dollar => Node::EndAnchor(Box::new(AnchorNode {
                anchor: self.consume_current_token(true),
            })),
            TokenKind::Backslash => {
                let backslash = self.current_token.clone();
                self.parse_escape(backslash, true)
            }
            TokenKind::OpenBracket => return self.parse_character_class(),
            TokenKind::OpenParen => return self.parse_grouping(),
            TokenKind::CloseParen => self.parse_unexpected_close_paren(),
            TokenKind::OpenBrace => self.parse_possible_unexpected_numeric_quantifier(last_expression),
            TokenKind::Asterisk | TokenKind::Plus | TokenKind::Question => {
                self.parse_unexpected_quantifier(last_expression)
            }
            _ => self.parse_text(),
        };

        Ok(node)
    }

    fn parse_text(&mut self) -> Node {
        // trivia is allowed before the next sequence element
        let text = self.consume_current_token(true).with_kind(TokenKind::Text);
        Node::Text(Box::new(TextNode { text }))
    }

    fn parse_unexpected_close_paren(&mut self) -> Node {
        let span = self.token_span(&self.current_token);
        let text = self
            .consume_current_token(true)
            .with_kind(TokenKind::Text)
            .with_diagnostic_if_none(Diagnostic::new(TOO_MANY_CLOSE_PARENS, span));

        Node::Text(Box::new(TextNode { text }))
    }

    /// A `{` in primary position. `{0,1}` here is an error the engine
    /// reports explicitly, while e.g. `{0, 1}` is just six chars of text.
    fn parse_possible_unexpected_numeric_quantifier(
        &mut self,
        last_expression: Option<&Node>,
    ) -> Node {
        let mut open_brace = self.current_token.clone().with_kind(TokenKind::Text);
        let start = self.lexer.position;

        if self.try_parse_numeric_quantifier_parts().is_some() {
            self.check_quantifier_expression(last_expression, &mut open_brace);
        }

        // either way the chars after `{` are scanned again as sequence elements
        self.reset_to_position_and_consume_current_token(start, true);

        Node::Text(Box::new(TextNode { text: open_brace }))
    }

    fn parse_unexpected_quantifier(&mut self, last_expression: Option<&Node>) -> Node {
        let mut token = self.consume_current_token(true);
        self.check_quantifier_expression(last_expression, &mut token);

        Node::Text(Box::new(TextNode {
            text: token.with_kind(TokenKind::Text),
        }))
    }

    fn check_quantifier_expression(&self, last_expression: Option<&Node>, token: &mut Token) {
        let message = match last_expression {
            None => QUANTIFIER_FOLLOWING_NOTHING.to_owned(),
            Some(node) if node.kind() == NodeKind::SimpleOptionsGrouping => {
                QUANTIFIER_FOLLOWING_NOTHING.to_owned()
            }
            Some(node) if node.is_quantifier() || node.kind() == NodeKind::LazyQuantifier => {
                match token.first_char() {
                    Some(c) => nested_quantifier(c),
                    None => return,
                }
            }
            _ => return,
        };

        let span = self.token_span(token);
        token.add_diagnostic_if_none(Diagnostic::new(message, span));
    }
}

// Groupings
impl Parser<'_> {
    fn parse_grouping(&mut self) -> Result<Node, RegexError> {
        self.enter_recursion()?;
        let result = self.parse_grouping_worker();
        self.exit_recursion();
        result
    }

    fn parse_grouping_worker(&mut self) -> Result<Node, RegexError> {
        let start = self.lexer.position;

        // `(?` is special but `( ?` is not, so no trivia here
        let open_paren = self.consume_current_token(false);

        if self.current_token.kind == TokenKind::Question {
            let question = self.current_token.clone();
            self.parse_group_question(open_paren, question)
        } else {
            self.lexer.position = start;
            self.parse_simple_group(open_paren)
        }
    }

    fn parse_grouping_close_paren(&mut self) -> Token {
        if self.current_token.kind == TokenKind::CloseParen {
            // trivia is allowed before the next sequence element
            return self.consume_current_token(true);
        }

        let span = self.token_start_position_span(&self.current_token);
        Token::missing(TokenKind::CloseParen)
            .with_diagnostic_if_none(Diagnostic::new(NOT_ENOUGH_CLOSE_PARENS, span))
    }

    fn parse_simple_group(&mut self, open_paren: Token) -> Result<Node, RegexError> {
        let expression = self.parse_grouping_embedded_expression(self.options)?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::SimpleGrouping(Box::new(SimpleGroupingNode {
            open_paren,
            expression,
            close_paren,
        })))
    }

    /// Parses the body of a grouping under `embedded_options`. Option
    /// changes made inside the body do not leak out of it.
    fn parse_grouping_embedded_expression(
        &mut self,
        embedded_options: RegexOptions,
    ) -> Result<Node, RegexError> {
        let current_options = self.options;
        self.options = embedded_options;

        // trivia is allowed before the first element of the body
        self.consume_current_token(true);

        // the close paren is left for the caller
        let expression = self.parse_alternating_sequences(false)?;
        self.options = current_options;

        Ok(expression)
    }

    // (?...
    //  ^__ current token
    fn parse_group_question(
        &mut self,
        mut open_paren: Token,
        question: Token,
    ) -> Result<Node, RegexError> {
        if let Some(options) = self.lexer.try_scan_options() {
            return self.parse_options_grouping(open_paren, question, options);
        }

        let after_question_position = self.lexer.position;

        // the char right after `?` decides the construct
        self.consume_current_token(false);

        match self.current_token.kind {
            TokenKind::LessThan => {
                // (?<=...), (?<!...), (?<name>...) or (?<name1-name2>...)
                return self.parse_lookbehind_or_named_capture_or_balancing_grouping(
                    open_paren, question,
                );
            }
            TokenKind::SingleQuote => {
                // (?'name'...) or (?'name1-name2'...)
                let open = self.current_token.clone();
                return self.parse_named_capture_or_balancing_grouping(open_paren, question, open);
            }
            TokenKind::OpenParen => {
                // (?(...)yes|no)
                return self.parse_conditional_grouping(open_paren, question);
            }
            TokenKind::Colon => {
                let options = self.options;
                return self.parse_marked_grouping(
                    open_paren,
                    question,
                    options,
                    Node::NonCapturingGrouping,
                );
            }
            TokenKind::Equals => {
                let options = self.options - RegexOptions::RIGHT_TO_LEFT;
                return self.parse_marked_grouping(
                    open_paren,
                    question,
                    options,
                    Node::PositiveLookaheadGrouping,
                );
            }
            TokenKind::Exclamation => {
                let options = self.options - RegexOptions::RIGHT_TO_LEFT;
                return self.parse_marked_grouping(
                    open_paren,
                    question,
                    options,
                    Node::NegativeLookaheadGrouping,
                );
            }
            TokenKind::GreaterThan => {
                let options = self.options;
                return self.parse_marked_grouping(
                    open_paren,
                    question,
                    options,
                    Node::NonBacktrackingGrouping,
                );
            }
            TokenKind::CloseParen => {
                // `(?)` is not reported here, its `?` reports itself below
            }
            _ => {
                let span = self.token_span(&open_paren);
                open_paren.add_diagnostic_if_none(Diagnostic::new(
                    UNRECOGNIZED_GROUPING_CONSTRUCT,
                    span,
                ));
            }
        }

        // Parse as a plain group starting at the `?`, which then becomes a
        // quantifier following nothing.
        self.lexer.position = after_question_position - 1;
        self.parse_simple_group(open_paren)
    }

    fn parse_marked_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        embedded_options: RegexOptions,
        make_node: fn(Box<MarkedGroupingNode>) -> Node,
    ) -> Result<Node, RegexError> {
        let marker = self.current_token.clone();
        let expression = self.parse_grouping_embedded_expression(embedded_options)?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(make_node(Box::new(MarkedGroupingNode {
            open_paren,
            question,
            marker,
            expression,
            close_paren,
        })))
    }

    // (?imnsx-imnsx) or (?imnsx-imnsx:...)
    fn parse_options_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        options: Token,
    ) -> Result<Node, RegexError> {
        self.consume_current_token(false);

        match self.current_token.kind {
            TokenKind::CloseParen => {
                // applies to everything after it in the enclosing group
                self.options = self.options.with_inline_delta(&options.chars);
                let close_paren = self.consume_current_token(true);

                Ok(Node::SimpleOptionsGrouping(Box::new(SimpleOptionsGroupingNode {
                    open_paren,
                    question,
                    options,
                    close_paren,
                })))
            }
            TokenKind::Colon => {
                let colon = self.current_token.clone();
                let embedded_options = self.options.with_inline_delta(&options.chars);
                let expression = self.parse_grouping_embedded_expression(embedded_options)?;
                let close_paren = self.parse_grouping_close_paren();

                Ok(Node::NestedOptionsGrouping(Box::new(NestedOptionsGroupingNode {
                    open_paren,
                    question,
                    options,
                    colon,
                    expression,
                    close_paren,
                })))
            }
            _ => {
                let span = self.token_span(&open_paren);
                let close_paren = Token::missing(TokenKind::CloseParen).with_diagnostic_if_none(
                    Diagnostic::new(UNRECOGNIZED_GROUPING_CONSTRUCT, span),
                );

                Ok(Node::SimpleOptionsGrouping(Box::new(SimpleOptionsGroupingNode {
                    open_paren,
                    question,
                    options,
                    close_paren,
                })))
            }
        }
    }

    // (?<...
    //   ^__ current token
    fn parse_lookbehind_or_named_capture_or_balancing_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
    ) -> Result<Node, RegexError> {
        let start = self.lexer.position;
        let less_than = self.consume_current_token(false);

        match self.current_token.kind {
            TokenKind::Equals => self.parse_lookbehind_grouping(
                open_paren,
                question,
                less_than,
                Node::PositiveLookbehindGrouping,
            ),
            TokenKind::Exclamation => self.parse_lookbehind_grouping(
                open_paren,
                question,
                less_than,
                Node::NegativeLookbehindGrouping,
            ),
            _ => {
                self.lexer.position = start;
                self.parse_named_capture_or_balancing_grouping(open_paren, question, less_than)
            }
        }
    }

    fn parse_lookbehind_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
        less_than: Token,
        make_node: fn(Box<LookbehindGroupingNode>) -> Node,
    ) -> Result<Node, RegexError> {
        let marker = self.current_token.clone();

        // a lookbehind body is matched right to left
        let embedded_options = self.options | RegexOptions::RIGHT_TO_LEFT;
        let expression = self.parse_grouping_embedded_expression(embedded_options)?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(make_node(Box::new(LookbehindGroupingNode {
            open_paren,
            question,
            less_than,
            marker,
            expression,
            close_paren,
        })))
    }

    // (?<name>...), (?<name1-name2>...), (?'name'...) or (?'name1-name2'...)
    //
    // the lexer stands right after `open`
    fn parse_named_capture_or_balancing_grouping(
        &mut self,
        mut open_paren: Token,
        question: Token,
        open: Token,
    ) -> Result<Node, RegexError> {
        if self.lexer.is_at_end() {
            let span = self.span_between(&open_paren, &open);
            open_paren
                .add_diagnostic_if_none(Diagnostic::new(UNRECOGNIZED_GROUPING_CONSTRUCT, span));
        }

        let mut capture = match self.lexer.try_scan_number_or_capture_name() {
            Some(capture) => capture,
            None => {
                // no trivia inside the grouping header
                self.consume_current_token(false);
                let capture = Token::missing(TokenKind::CaptureName);

                if self.current_token.kind == TokenKind::Minus {
                    return self.parse_balancing_grouping(open_paren, question, open, capture);
                }

                let span = self.token_span_including_end_of_file(&self.current_token);
                open_paren.add_diagnostic_if_none(Diagnostic::new(INVALID_GROUP_NAME, span));

                self.move_back_before_previous_scan();
                capture
            }
        };

        if capture.kind == TokenKind::Number && capture.number() == Some(0) {
            let span = self.token_span(&capture);
            capture.add_diagnostic_if_none(Diagnostic::new(CAPTURE_NUMBER_CANNOT_BE_ZERO, span));
        }

        self.consume_current_token(false);

        if self.current_token.kind == TokenKind::Minus {
            return self.parse_balancing_grouping(open_paren, question, open, capture);
        }

        let close = self.parse_capture_grouping_close(&mut open_paren, &open);
        let expression = self.parse_grouping_embedded_expression(self.options)?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::CaptureGrouping(Box::new(CaptureGroupingNode {
            open_paren,
            question,
            open,
            capture,
            close,
            expression,
            close_paren,
        })))
    }

    /// The `>` or `'` closing a capture header. The current token is left
    /// in place for the embedded expression parser to consume.
    fn parse_capture_grouping_close(&mut self, open_paren: &mut Token, open: &Token) -> Token {
        if is_capture_close(open.kind, self.current_token.kind) {
            return self.current_token.clone();
        }

        if self.current_token.kind == TokenKind::EndOfFile {
            let span = self.span_between(open_paren, open);
            open_paren
                .add_diagnostic_if_none(Diagnostic::new(UNRECOGNIZED_GROUPING_CONSTRUCT, span));
        } else {
            let span = self.token_span(&self.current_token);
            open_paren.add_diagnostic_if_none(Diagnostic::new(INVALID_GROUP_NAME, span));

            // the bogus char is read again as part of the body
            self.lexer.position -= 1;
        }

        Token::missing(if open.kind == TokenKind::LessThan {
            TokenKind::GreaterThan
        } else {
            TokenKind::SingleQuote
        })
    }

    // (?<name1-name2>...)
    //         ^__ current token
    fn parse_balancing_grouping(
        &mut self,
        mut open_paren: Token,
        question: Token,
        open: Token,
        first_capture: Token,
    ) -> Result<Node, RegexError> {
        let minus = self.current_token.clone();

        let mut second_capture = match self.lexer.try_scan_number_or_capture_name() {
            Some(capture) => capture,
            None => {
                self.consume_current_token(false);

                let span = self.token_span_including_end_of_file(&self.current_token);
                open_paren.add_diagnostic_if_none(Diagnostic::new(INVALID_GROUP_NAME, span));

                self.move_back_before_previous_scan();
                Token::missing(TokenKind::CaptureName)
            }
        };

        self.check_capture(&mut second_capture);

        self.consume_current_token(false);
        let close = self.parse_capture_grouping_close(&mut open_paren, &open);
        let expression = self.parse_grouping_embedded_expression(self.options)?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::BalancingGrouping(Box::new(BalancingGroupingNode {
            open_paren,
            question,
            open,
            first_capture,
            minus,
            second_capture,
            close,
            expression,
            close_paren,
        })))
    }

    /// Flags a reference to a capture that does not exist.
    fn check_capture(&self, capture: &mut Token) {
        if capture.is_missing() {
            return;
        }

        let message = match &capture.value {
            Some(TokenValue::Number(number)) if !self.has_capture_number(*number) => {
                reference_to_undefined_group_number(*number)
            }
            Some(TokenValue::Name(name)) if !self.has_capture_name(name) => {
                reference_to_undefined_group_name(name)
            }
            _ => return,
        };

        let span = self.token_span(capture);
        capture.add_diagnostic_if_none(Diagnostic::new(message, span));
    }

    // (?(...
    //   ^__ current token
    fn parse_conditional_grouping(
        &mut self,
        open_paren: Token,
        question: Token,
    ) -> Result<Node, RegexError> {
        let inner_open_paren = self.current_token.clone();
        let after_inner_open_paren = self.lexer.position;

        let Some(mut capture) = self.lexer.try_scan_number_or_capture_name() else {
            return self.parse_conditional_expression_grouping(open_paren, question);
        };

        let inner_close_paren = if capture.kind == TokenKind::Number {
            // A number must be followed by `)` right away and refer to an
            // existing capture. `(?(1 )` is an error rather than an expression.
            self.consume_current_token(false);

            if self.current_token.kind == TokenKind::CloseParen {
                if let Some(number) = capture.number() {
                    if !self.has_capture_number(number) {
                        let span = self.token_span(&capture);
                        capture.add_diagnostic_if_none(Diagnostic::new(
                            REFERENCE_TO_UNDEFINED_GROUP,
                            span,
                        ));
                    }
                }

                self.current_token.clone()
            } else {
                let span = self.token_span(&capture);
                capture.add_diagnostic_if_none(Diagnostic::new(MALFORMED, span));

                self.move_back_before_previous_scan();
                Token::missing(TokenKind::CloseParen)
            }
        } else {
            // An unknown name, or a known one not followed by `)` right
            // away, makes this a conditional expression instead.
            let is_known_name = capture
                .name()
                .is_some_and(|name| self.has_capture_name(name));

            if !is_known_name {
                self.lexer.position = after_inner_open_paren;
                return self.parse_conditional_expression_grouping(open_paren, question);
            }

            self.consume_current_token(false);

            if self.current_token.kind != TokenKind::CloseParen {
                self.lexer.position = after_inner_open_paren;
                return self.parse_conditional_expression_grouping(open_paren, question);
            }

            self.current_token.clone()
        };

        // trivia is allowed before the first element of the result
        self.consume_current_token(true);
        let result = self.parse_conditional_grouping_result()?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::ConditionalCaptureGrouping(Box::new(
            ConditionalCaptureGroupingNode {
                open_paren,
                question,
                inner_open_paren,
                capture,
                inner_close_paren,
                result,
                close_paren,
            },
        )))
    }

    // (?(...)yes|no)
    //    ^__ the lexer stands here
    fn parse_conditional_expression_grouping(
        &mut self,
        mut open_paren: Token,
        question: Token,
    ) -> Result<Node, RegexError> {
        // step back onto the inner `(` to look at the condition
        self.lexer.position -= 1;

        if self.lexer.is_at("(?#") {
            let position = self.lexer.position;
            let comment = self.lexer.scan_comment(RegexOptions::empty());
            self.lexer.position = position;

            let diagnostic = match comment.and_then(|c| c.diagnostics.into_iter().next()) {
                Some(diagnostic) => diagnostic,
                None => Diagnostic::new(
                    ALTERNATION_CONDITIONS_CANNOT_BE_COMMENTS,
                    self.token_span(&open_paren),
                ),
            };
            open_paren.add_diagnostic_if_none(diagnostic);
        } else if self.lexer.is_at("(?'")
            || (self.lexer.is_at("(?<") && !self.lexer.is_at("(?<!") && !self.lexer.is_at("(?<="))
        {
            let span = self.token_span(&open_paren);
            open_paren.add_diagnostic_if_none(Diagnostic::new(
                ALTERNATION_CONDITIONS_DO_NOT_CAPTURE,
                span,
            ));
        }

        // scan the inner `(` once more, then parse the condition as a grouping
        self.consume_current_token(false);
        let grouping = self.parse_grouping()?;

        let result = self.parse_conditional_grouping_result()?;
        let close_paren = self.parse_grouping_close_paren();

        Ok(Node::ConditionalExpressionGrouping(Box::new(
            ConditionalExpressionGroupingNode {
                open_paren,
                question,
                grouping,
                result,
                close_paren,
            },
        )))
    }

    fn parse_conditional_grouping_result(&mut self) -> Result<Node, RegexError> {
        let current_options = self.options;
        let result = self.parse_alternating_sequences(false)?;
        self.options = current_options;

        Ok(self.check_conditional_alternation(result))
    }

    /// A conditional takes at most a yes and a no branch.
    fn check_conditional_alternation(&self, result: Node) -> Node {
        match result {
            Node::Alternation(mut alternation) if alternation.bars.len() > 1 => {
                if let Some(bar) = alternation.bars.last_mut() {
                    let span = self.token_span(bar);
                    bar.add_diagnostic_if_none(Diagnostic::new(TOO_MANY_BARS_IN_CONDITIONAL, span));
                }
                Node::Alternation(alternation)
            }
            other => other,
        }
    }
}

// Character classes
impl Parser<'_> {
    fn parse_character_class(&mut self) -> Result<Node, RegexError> {
        self.enter_recursion()?;
        let result = self.parse_character_class_worker();
        self.exit_recursion();
        result
    }

    // [...] or [^...]
    //
    // No trivia is allowed anywhere inside a class.
    fn parse_character_class_worker(&mut self) -> Result<Node, RegexError> {
        let open_bracket = self.current_token.clone();

        self.consume_current_token(false);
        let caret = if self.current_token.kind == TokenKind::Caret {
            Some(self.current_token.clone())
        } else {
            self.move_back_before_previous_scan();
            None
        };

        self.consume_current_token(false);

        let mut components = vec![];
        let mut close_bracket = None;

        while self.current_token.kind != TokenKind::EndOfFile {
            // A `]` right after `[` or `[^` is content, not the end of the
            // class. The engine behaves this way, so `[]a]` is the set `]a`.
            if self.current_token.kind == TokenKind::CloseBracket && !components.is_empty() {
                // trivia is allowed before the next sequence element
                close_bracket = Some(self.consume_current_token(true));
                break;
            }

            self.parse_character_class_components(&mut components)?;
        }

        let close_bracket = match close_bracket {
            Some(token) => token,
            None => {
                let span = self.token_start_position_span(&self.current_token);
                Token::missing(TokenKind::CloseBracket).with_diagnostic_if_none(Diagnostic::new(
                    UNTERMINATED_CHARACTER_CLASS_SET,
                    span,
                ))
            }
        };

        let components = Node::Sequence(Box::new(SequenceNode {
            children: merge_text_nodes(components),
        }));

        let node = match caret {
            Some(caret) => Node::NegatedCharacterClass(Box::new(NegatedCharacterClassNode {
                open_bracket,
                caret,
                components,
                close_bracket,
            })),
            None => Node::CharacterClass(Box::new(CharacterClassNode {
                open_bracket,
                components,
                close_bracket,
            })),
        };

        Ok(node)
    }

    fn parse_character_class_components(
        &mut self,
        components: &mut Vec<Node>,
    ) -> Result<(), RegexError> {
        let left = self.parse_single_character_class_component(components.is_empty(), false)?;

        // `\s`, `\p{Lu}` and `\-` never start a range, a minus after them is text
        if matches!(
            left.kind(),
            NodeKind::CharacterClassEscape | NodeKind::CategoryEscape
        ) || is_escaped_minus(&left)
        {
            components.push(left);
            return Ok(());
        }

        if self.current_token.kind != TokenKind::Minus || self.lexer.is_at("]") {
            components.push(left);
            return Ok(());
        }

        let mut minus = self.consume_current_token(false);

        if self.current_token.kind == TokenKind::OpenBracket {
            components.push(left);
            let subtraction = self.parse_character_class_subtraction(minus)?;
            components.push(subtraction);
            return Ok(());
        }

        let right = self.parse_right_side_of_character_class_range()?;

        if let (Some(left_value), Some(right_value)) =
            (range_component_value(&left), range_component_value(&right))
        {
            if left_value > right_value {
                let span = self.token_span(&minus);
                minus.add_diagnostic_if_none(Diagnostic::new(RANGE_IN_REVERSE_ORDER, span));
            }
        }

        components.push(Node::CharacterClassRange(Box::new(CharacterClassRangeNode {
            left,
            minus,
            right,
        })));

        Ok(())
    }

    /// The engine stays on the right side of a range across any number of
    /// `\-`, so `[b-\-a]` checks the range `b-a`. The escaped minuses and
    /// the final component are kept together in a sequence.
    fn parse_right_side_of_character_class_range(&mut self) -> Result<Node, RegexError> {
        let first = self.parse_single_character_class_component(false, true)?;
        if !is_escaped_minus(&first) {
            return Ok(first);
        }

        let mut children = vec![first];
        while children.last().is_some_and(is_escaped_minus)
            && self.current_token.kind != TokenKind::CloseBracket
        {
            children.push(self.parse_single_character_class_component(false, true)?);
        }

        Ok(Node::Sequence(Box::new(SequenceNode { children })))
    }

    fn parse_single_character_class_component(
        &mut self,
        is_first: bool,
        after_range_minus: bool,
    ) -> Result<Node, RegexError> {
        if self.current_token.kind == TokenKind::Backslash && !self.lexer.is_at_end() {
            let mut backslash = self.current_token.clone();

            // nothing between `\` and the next char
            self.consume_current_token(false);

            let node = match self.current_token.first_char() {
                Some(c @ ('D' | 'd' | 'S' | 's' | 'W' | 'w' | 'p' | 'P')) => {
                    if after_range_minus {
                        let span = self.span_between(&backslash, &self.current_token);
                        backslash.add_diagnostic_if_none(Diagnostic::new(
                            cannot_include_class_in_range(c),
                            span,
                        ));
                    }

                    self.lexer.position -= 1;
                    self.parse_escape(backslash, false)
                }
                Some('-') => {
                    // whatever follows `\-` is plain text
                    let type_token = self.consume_current_token(false).with_kind(TokenKind::Text);
                    Node::SimpleEscape(Box::new(EscapeNode {
                        backslash,
                        type_token,
                    }))
                }
                _ => {
                    // Only char escapes here: `\b` is a backspace inside a
                    // class, and `\k<...>` is no reference.
                    self.lexer.position -= 1;
                    self.parse_char_escape(backslash, false)
                }
            };

            return Ok(node);
        }

        if !after_range_minus
            && !is_first
            && self.current_token.kind == TokenKind::Minus
            && self.lexer.is_at("[")
        {
            let minus = self.consume_current_token(false);
            return self.parse_character_class_subtraction(minus);
        }

        // [:name:] is skipped over as a whole, never interpreted
        if !after_range_minus
            && self.current_token.kind == TokenKind::OpenBracket
            && self.lexer.is_at(":")
        {
            let before_bracket_position = self.lexer.position - 1;
            self.consume_current_token(false);

            let name = self.lexer.try_scan_capture_name();
            if name.is_some() && self.lexer.is_at(":]") {
                self.lexer.position += 2;

                let text = Token::new(
                    TokenKind::Text,
                    vec![],
                    self.lexer
                        .sub_pattern(before_bracket_position, self.lexer.position),
                );

                self.consume_current_token(false);
                return Ok(Node::PosixProperty(Box::new(PosixPropertyNode { text })));
            }

            // not a posix property, rescan the `[` as text
            self.lexer.position = before_bracket_position;
            self.consume_current_token(false);
        }

        let text = self.consume_current_token(false).with_kind(TokenKind::Text);
        Ok(Node::Text(Box::new(TextNode { text })))
    }

    // -[...]
    //  ^__ current token
    fn parse_character_class_subtraction(&mut self, mut minus: Token) -> Result<Node, RegexError> {
        let character_class = self.parse_character_class()?;

        if !matches!(
            self.current_token.kind,
            TokenKind::CloseBracket | TokenKind::EndOfFile
        ) {
            let span = self.token_start_position_span(&minus);
            minus.add_diagnostic_if_none(Diagnostic::new(SUBTRACTION_MUST_BE_LAST, span));
        }

        Ok(Node::CharacterClassSubtraction(Box::new(
            CharacterClassSubtractionNode {
                minus,
                character_class,
            },
        )))
    }
}

// Escapes
//
// `allow_trivia_after_end` is true in sequences and false in character
// classes, where no trivia is allowed.
impl Parser<'_> {
    // \...
    // ^__ the lexer stands right after the backslash
    fn parse_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        self.consume_current_token(false);

        if self.current_token.kind == TokenKind::EndOfFile {
            return self.parse_illegal_backslash_at_end(backslash);
        }

        match self.current_token.first_char() {
            Some('b' | 'B' | 'A' | 'G' | 'Z' | 'z') => Node::AnchorEscape(Box::new(EscapeNode {
                backslash,
                type_token: self.consume_current_token(allow_trivia_after_end),
            })),
            Some('w' | 'W' | 's' | 'S' | 'd' | 'D') => {
                Node::CharacterClassEscape(Box::new(EscapeNode {
                    backslash,
                    type_token: self.consume_current_token(allow_trivia_after_end),
                }))
            }
            Some('p' | 'P') => self.parse_category_escape(backslash, allow_trivia_after_end),
            _ => {
                self.lexer.position -= 1;
                self.parse_basic_backslash(backslash, allow_trivia_after_end)
            }
        }
    }

    fn parse_illegal_backslash_at_end(&self, mut backslash: Token) -> Node {
        let span = self.token_span(&backslash);
        backslash.add_diagnostic_if_none(Diagnostic::new(ILLEGAL_BACKSLASH_AT_END, span));

        Node::SimpleEscape(Box::new(EscapeNode {
            backslash,
            type_token: Token::missing(TokenKind::Text),
        }))
    }

    fn parse_basic_backslash(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        self.consume_current_token(false);

        match self.current_token.first_char() {
            None => self.parse_illegal_backslash_at_end(backslash),
            Some('k') => self.parse_possible_k_capture_escape(backslash, allow_trivia_after_end),
            Some('<' | '\'') => {
                self.lexer.position -= 1;
                self.parse_possible_capture_escape(backslash, allow_trivia_after_end)
            }
            Some('1'..='9') => {
                self.lexer.position -= 1;
                if self.options.contains(RegexOptions::ECMA_SCRIPT) {
                    self.parse_possible_ecma_script_backreference_escape(
                        backslash,
                        allow_trivia_after_end,
                    )
                } else {
                    self.parse_possible_regular_backreference_escape(
                        backslash,
                        allow_trivia_after_end,
                    )
                }
            }
            Some(_) => {
                self.lexer.position -= 1;
                self.parse_char_escape(backslash, allow_trivia_after_end)
            }
        }
    }

    /// ECMAScript takes the longest digit run whose prefix is a known
    /// capture. Captures defined after this point count as known too, as
    /// capture positions are not tracked. The number token holds the value
    /// of the prefix it spans, not of the whole run.
    fn parse_possible_ecma_script_backreference_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let start = self.lexer.position;

        let mut best: Option<(usize, i32)> = None;
        let mut value: i32 = 0;

        while let Some(digit) = self.lexer.peek_char(0).and_then(|c| c.to_digit(10)) {
            value = value.wrapping_mul(10).wrapping_add(digit as i32);
            self.lexer.position += 1;

            if self.has_capture_number(value) {
                best = Some((self.lexer.position, value));
            }
        }

        let Some((best_position, best_value)) = best else {
            self.lexer.position = start;
            return self.parse_char_escape(backslash, allow_trivia_after_end);
        };

        let number = Token::new(
            TokenKind::Number,
            vec![],
            self.lexer.sub_pattern(start, best_position),
        )
        .with_value(TokenValue::Number(best_value));

        self.reset_to_position_and_consume_current_token(best_position, allow_trivia_after_end);

        Node::BackreferenceEscape(Box::new(BackreferenceEscapeNode { backslash, number }))
    }

    /// `\1` to `\9` are always references. Larger numbers are references
    /// only when the capture exists, otherwise they are octal escapes.
    fn parse_possible_regular_backreference_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let start = self.lexer.position;

        if let Some(mut number) = self.lexer.try_scan_number() {
            let value = number.number().unwrap_or_default();
            if self.has_capture_number(value) || value <= 9 {
                self.check_capture(&mut number);
                self.consume_current_token(allow_trivia_after_end);

                return Node::BackreferenceEscape(Box::new(BackreferenceEscapeNode {
                    backslash,
                    number,
                }));
            }
        }

        self.lexer.position = start;
        self.parse_char_escape(backslash, allow_trivia_after_end)
    }

    // \<name> or \'name'
    fn parse_possible_capture_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let after_backslash_position = self.lexer.position;
        let parts = self.scan_capture_parts(allow_trivia_after_end);

        if parts.open.is_missing() || parts.capture.is_missing() || parts.close.is_missing() {
            self.lexer.position = after_backslash_position;
            return self.parse_char_escape(backslash, allow_trivia_after_end);
        }

        Node::CaptureEscape(Box::new(CaptureEscapeNode {
            backslash,
            open: parts.open,
            capture: parts.capture,
            close: parts.close,
        }))
    }

    // \k<name> or \k'name'
    //  ^__ current token
    fn parse_possible_k_capture_escape(
        &mut self,
        mut backslash: Token,
        allow_trivia_after_end: bool,
    ) -> Node {
        let type_token = self.current_token.clone();
        let after_backslash_position = self.lexer.position - 1;

        let parts = self.scan_capture_parts(allow_trivia_after_end);

        if parts.open.is_missing() {
            let span = self.span_between(&backslash, &type_token);
            backslash.add_diagnostic_if_none(Diagnostic::new(MALFORMED_NAMED_BACK_REFERENCE, span));

            return Node::SimpleEscape(Box::new(EscapeNode {
                backslash,
                type_token: type_token.with_kind(TokenKind::Text),
            }));
        }

        if parts.capture.is_missing() || parts.close.is_missing() {
            // Fall back to a plain escape. `\k` is then unrecognized,
            // except under ECMAScript.
            self.lexer.position = after_backslash_position;
            return self.parse_char_escape(backslash, allow_trivia_after_end);
        }

        Node::KCaptureEscape(Box::new(KCaptureEscapeNode {
            backslash,
            type_token,
            open: parts.open,
            capture: parts.capture,
            close: parts.close,
        }))
    }

    fn scan_capture_parts(&mut self, allow_trivia_after_end: bool) -> CaptureParts {
        let mut parts = CaptureParts {
            open: Token::missing(TokenKind::LessThan),
            capture: Token::missing(TokenKind::CaptureName),
            close: Token::missing(TokenKind::GreaterThan),
        };

        // no trivia inside `<name>` or `'name'`
        self.consume_current_token(false);

        if self.lexer.is_at_end()
            || !matches!(
                self.current_token.kind,
                TokenKind::LessThan | TokenKind::SingleQuote
            )
        {
            return parts;
        }

        parts.open = self.current_token.clone();

        let capture = self.lexer.try_scan_number_or_capture_name();
        self.consume_current_token(false);

        if let Some(mut capture) = capture {
            if is_capture_close(parts.open.kind, self.current_token.kind) {
                self.check_capture(&mut capture);
                parts.close = self.consume_current_token(allow_trivia_after_end);
            }
            parts.capture = capture;
        }

        parts
    }

    fn parse_char_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        self.consume_current_token(false);

        let Some(c) = self.current_token.first_char() else {
            return self.parse_illegal_backslash_at_end(backslash);
        };

        if is_octal_digit(c) {
            self.lexer.position -= 1;
            let octal_text = self.lexer.scan_octal_characters(self.options);
            self.consume_current_token(allow_trivia_after_end);

            return Node::OctalEscape(Box::new(OctalEscapeNode {
                backslash,
                octal_text,
            }));
        }

        match c {
            'a' | 'b' | 'e' | 'f' | 'n' | 'r' | 't' | 'v' => Node::SimpleEscape(Box::new(EscapeNode {
                backslash,
                type_token: self.consume_current_token(allow_trivia_after_end),
            })),
            'x' => self.parse_hex_escape(backslash, allow_trivia_after_end, 2, Node::HexEscape),
            'u' => self.parse_hex_escape(backslash, allow_trivia_after_end, 4, Node::UnicodeEscape),
            'c' => self.parse_control_escape(backslash, allow_trivia_after_end),
            _ => {
                let mut type_token = self
                    .consume_current_token(allow_trivia_after_end)
                    .with_kind(TokenKind::Text);

                if !self.options.contains(RegexOptions::ECMA_SCRIPT) && is_word_char(c) {
                    let span = self.token_span(&type_token);
                    type_token.add_diagnostic_if_none(Diagnostic::new(
                        unrecognized_escape_sequence(c),
                        span,
                    ));
                }

                Node::SimpleEscape(Box::new(EscapeNode {
                    backslash,
                    type_token,
                }))
            }
        }
    }

    // \xhh or \uhhhh
    fn parse_hex_escape(
        &mut self,
        backslash: Token,
        allow_trivia_after_end: bool,
        digit_count: usize,
        make_node: fn(Box<HexEscapeNode>) -> Node,
    ) -> Node {
        let type_token = self.current_token.clone();
        let hex_text = self.lexer.scan_hex_characters(digit_count);
        self.consume_current_token(allow_trivia_after_end);

        make_node(Box::new(HexEscapeNode {
            backslash,
            type_token,
            hex_text,
        }))
    }

    // \cX
    //  ^__ current token
    fn parse_control_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        // nothing between `\c` and the control char
        let mut type_token = self.consume_current_token(false);

        let Some(c) = self.current_token.first_char() else {
            let span = self.token_span(&type_token);
            type_token.add_diagnostic_if_none(Diagnostic::new(MISSING_CONTROL_CHARACTER, span));

            return Node::ControlEscape(Box::new(ControlEscapeNode {
                backslash,
                type_token,
                control: Token::missing(TokenKind::Text),
            }));
        };

        // `\ca` is `\cA`
        if ('@'..='_').contains(&c.to_ascii_uppercase()) {
            let control = self
                .consume_current_token(allow_trivia_after_end)
                .with_kind(TokenKind::Text);

            return Node::ControlEscape(Box::new(ControlEscapeNode {
                backslash,
                type_token,
                control,
            }));
        }

        let span = self.token_span(&self.current_token);
        type_token.add_diagnostic_if_none(Diagnostic::new(UNRECOGNIZED_CONTROL_CHARACTER, span));

        // the bogus char is left for the enclosing sequence
        Node::ControlEscape(Box::new(ControlEscapeNode {
            backslash,
            type_token,
            control: Token::missing(TokenKind::Text),
        }))
    }

    // \p{name} or \P{name}
    //  ^__ current token
    fn parse_category_escape(&mut self, backslash: Token, allow_trivia_after_end: bool) -> Node {
        let type_token = self.current_token.clone();
        let start = self.lexer.position;

        match self.try_parse_category_escape_parts(allow_trivia_after_end) {
            Ok((open_brace, category, close_brace)) => {
                Node::CategoryEscape(Box::new(CategoryEscapeNode {
                    backslash,
                    type_token,
                    open_brace,
                    category,
                    close_brace,
                }))
            }
            Err(message) => {
                // fall back to a plain `\p`, the braces are read again as text
                self.reset_to_position_and_consume_current_token(start, allow_trivia_after_end);

                let span = self.span_between(&backslash, &type_token);
                let type_token = type_token
                    .with_kind(TokenKind::Text)
                    .with_diagnostic_if_none(Diagnostic::new(message, span));

                Node::SimpleEscape(Box::new(EscapeNode {
                    backslash,
                    type_token,
                }))
            }
        }
    }

    /// Returns the brace and category tokens, or the message explaining
    /// why they are not well formed.
    fn try_parse_category_escape_parts(
        &mut self,
        allow_trivia_after_end: bool,
    ) -> Result<(Token, Token, Token), &'static str> {
        if self.lexer.remaining() < "{x}".len() {
            return Err(INCOMPLETE_CHARACTER_ESCAPE);
        }

        self.consume_current_token(false);
        if self.current_token.kind != TokenKind::OpenBrace {
            return Err(MALFORMED_CHARACTER_ESCAPE);
        }

        let open_brace = self.current_token.clone();
        let category = self.lexer.try_scan_escape_category();

        self.consume_current_token(false);
        if self.current_token.kind != TokenKind::CloseBrace {
            return Err(INCOMPLETE_CHARACTER_ESCAPE);
        }

        let Some(category) = category else {
            return Err(UNKNOWN_PROPERTY);
        };

        let close_brace = self.consume_current_token(allow_trivia_after_end);
        Ok((open_brace, category, close_brace))
    }
}

fn create_numeric_quantifier(expression: Node, open_brace: Token, parts: NumericQuantifierParts) -> Node {
    let NumericQuantifierParts {
        first_number,
        comma,
        second_number,
        close_brace,
    } = parts;

    match (comma, second_number) {
        (Some(comma), Some(second_number)) => {
            Node::ClosedRangeNumericQuantifier(Box::new(ClosedRangeNumericQuantifierNode {
                expression,
                open_brace,
                first_number,
                comma,
                second_number,
                close_brace,
            }))
        }
        (Some(comma), None) => {
            Node::OpenRangeNumericQuantifier(Box::new(OpenRangeNumericQuantifierNode {
                expression,
                open_brace,
                first_number,
                comma,
                close_brace,
            }))
        }
        _ => Node::ExactNumericQuantifier(Box::new(ExactNumericQuantifierNode {
            expression,
            open_brace,
            first_number,
            close_brace,
        })),
    }
}

fn is_capture_close(open: TokenKind, close: TokenKind) -> bool {
    matches!(
        (open, close),
        (TokenKind::LessThan, TokenKind::GreaterThan)
            | (TokenKind::SingleQuote, TokenKind::SingleQuote)
    )
}

/// Merges runs of adjacent plain text nodes into one node, e.g. `abc` is
/// one text node instead of three. Text carrying a diagnostic or a value
/// stays on its own, and so does text with leading trivia.
fn merge_text_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());

    for node in nodes {
        if let Node::Text(next) = &node {
            if let Some(Node::Text(last)) = merged.last_mut() {
                if can_merge(&last.text, &next.text) {
                    last.text.chars.extend_from_slice(&next.text.chars);
                    continue;
                }
            }
        }

        merged.push(node);
    }

    merged
}

fn can_merge(last: &Token, next: &Token) -> bool {
    last.diagnostics.is_empty()
        && last.value.is_none()
        && next.diagnostics.is_empty()
        && next.value.is_none()
        && next.leading_trivia.is_empty()
}

fn is_escaped_minus(node: &Node) -> bool {
    matches!(node, Node::SimpleEscape(escape) if escape.type_token.is_text_char('-'))
}

/// Whether any token of the subtree is missing or carries a diagnostic.
fn has_problem(node: &Node) -> bool {
    node.children().into_iter().any(|child| match child {
        NodeOrToken::Node(node) => has_problem(node),
        NodeOrToken::Token(token) => {
            token.is_missing()
                || !token.diagnostics.is_empty()
                || token
                    .leading_trivia
                    .iter()
                    .any(|trivia| !trivia.diagnostics.is_empty())
        }
    })
}

/// The char value of one end of a `[x-y]` range, if it can be known.
/// Components that already have problems are not evaluated.
fn range_component_value(component: &Node) -> Option<u32> {
    if has_problem(component) {
        None
    } else {
        range_component_value_unchecked(component)
    }
}

fn range_component_value_unchecked(component: &Node) -> Option<u32> {
    match component {
        Node::SimpleEscape(escape) => escape
            .type_token
            .first_char()
            .map(|c| map_escape_char(c) as u32),
        Node::ControlEscape(escape) => escape
            .control
            .first_char()
            .map(|c| c.to_ascii_uppercase() as u32 + 1 - 'A' as u32),
        Node::OctalEscape(escape) => Some(digits_value(&escape.octal_text, 8) & 0xFF),
        Node::HexEscape(escape) | Node::UnicodeEscape(escape) => {
            Some(digits_value(&escape.hex_text, 16) & 0xFFFF)
        }
        // the engine reads `[:...:]` as if it were a single `[`
        Node::PosixProperty(_) => Some('[' as u32),
        Node::Text(text) => text.text.first_char().map(|c| c as u32),
        // `\-\-x` on the right side of a range stands for `x`
        Node::Sequence(sequence) => match sequence.children.last() {
            Some(last) if !is_escaped_minus(last) => range_component_value_unchecked(last),
            _ => None,
        },
        _ => None,
    }
}

fn digits_value(token: &Token, radix: u32) -> u32 {
    token
        .chars
        .iter()
        .filter_map(|c| c.value.to_digit(radix))
        .fold(0u32, |total, digit| {
            total.wrapping_mul(radix).wrapping_add(digit)
        })
}

fn map_escape_char(c: char) -> char {
    match c {
        'a' => '\u{7}',
        'b' => '\u{8}',
        'e' => '\u{1B}',
        'f' => '\u{C}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{B}',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        captureinfo::CaptureMaps, config::ParserConfig, decodedchar::DecodedChars,
        error::RegexError, options::RegexOptions,
    };

    use super::Parser;

    fn parse_with_config(pattern: &str, config: &ParserConfig) -> Result<String, RegexError> {
        let text = DecodedChars::from_text(pattern, 0);
        let captures = CaptureMaps::default();
        let root = Parser::new(&text, config, &captures).parse_compilation_unit()?;
        Ok(root.to_string())
    }

    fn parse(pattern: &str, options: RegexOptions) -> String {
        parse_with_config(pattern, &ParserConfig::from(options)).unwrap()
    }

    fn assert_tree(pattern: &str, options: RegexOptions, expected: &str) {
        assert_eq!(parse(pattern, options).trim(), expected.trim());
    }

    #[test]
    fn test_parse_sequence_and_alternation() {
        assert_tree(
            "a|bc",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Alternation
    Sequence
      Text
        TextToken "a"
    BarToken "|"
    Sequence
      Text
        TextToken "bc"
  EndOfFile
"#,
        );

        assert_tree(
            "|",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Alternation
    Sequence
    BarToken "|"
    Sequence
  EndOfFile
"#,
        );

        assert_tree(
            "",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_quantifiers() {
        assert_tree(
            "a*?b{2,}",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    LazyQuantifier
      ZeroOrMoreQuantifier
        Text
          TextToken "a"
        AsteriskToken "*"
      QuestionToken "?"
    OpenRangeNumericQuantifier
      Text
        TextToken "b"
      OpenBraceToken "{"
      NumberToken "2" = 2
      CommaToken ","
      CloseBraceToken "}"
  EndOfFile
"#,
        );

        assert_tree(
            "a{2,3}b{4}",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    ClosedRangeNumericQuantifier
      Text
        TextToken "a"
      OpenBraceToken "{"
      NumberToken "2" = 2
      CommaToken ","
      NumberToken "3" = 3
      CloseBraceToken "}"
    ExactNumericQuantifier
      Text
        TextToken "b"
      OpenBraceToken "{"
      NumberToken "4" = 4
      CloseBraceToken "}"
  EndOfFile
"#,
        );

        // not a quantifier, just text
        assert_tree(
            "a{x}",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    Text
      TextToken "a{x}"
  EndOfFile
"#,
        );

        // the `{` keeps its diagnostic and is not merged
        assert_tree(
            "{0,1}",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    Text
      TextToken "{"
    Text
      TextToken "0,1}"
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_groupings() {
        assert_tree(
            "(?<x>a)(?:b)",
            RegexOptions::empty(),
            r#"
CompilationUnit
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
    NonCapturingGrouping
      OpenParenToken "("
      QuestionToken "?"
      ColonToken ":"
      Sequence
        Text
          TextToken "b"
      CloseParenToken ")"
  EndOfFile
"#,
        );

        assert_tree(
            "(a",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    SimpleGrouping
      OpenParenToken "("
      Sequence
        Text
          TextToken "a"
      CloseParenToken (missing)
  EndOfFile
"#,
        );

        assert_tree(
            "(?<=a)(?i:b)",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    PositiveLookbehindGrouping
      OpenParenToken "("
      QuestionToken "?"
      LessThanToken "<"
      EqualsToken "="
      Sequence
        Text
          TextToken "a"
      CloseParenToken ")"
    NestedOptionsGrouping
      OpenParenToken "("
      QuestionToken "?"
      OptionsToken "i"
      ColonToken ":"
      Sequence
        Text
          TextToken "b"
      CloseParenToken ")"
  EndOfFile
"#,
        );

        assert_tree(
            "(?<a-b>c)",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    BalancingGrouping
      OpenParenToken "("
      QuestionToken "?"
      LessThanToken "<"
      CaptureNameToken "a" = a
      MinusToken "-"
      CaptureNameToken "b" = b
      GreaterThanToken ">"
      Sequence
        Text
          TextToken "c"
      CloseParenToken ")"
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_unrecognized_grouping() {
        // the `?` ends up as text inside a plain group
        assert_tree(
            "(?)",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    SimpleGrouping
      OpenParenToken "("
      Sequence
        Text
          TextToken "?"
      CloseParenToken ")"
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_conditional_groupings() {
        // `a` is not a known capture, so the condition is an expression
        assert_tree(
            "(?(a)b|c)",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    ConditionalExpressionGrouping
      OpenParenToken "("
      QuestionToken "?"
      SimpleGrouping
        OpenParenToken "("
        Sequence
          Text
            TextToken "a"
        CloseParenToken ")"
      Alternation
        Sequence
          Text
            TextToken "b"
        BarToken "|"
        Sequence
          Text
            TextToken "c"
      CloseParenToken ")"
  EndOfFile
"#,
        );

        assert_tree(
            "(?(1)b)",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    ConditionalCaptureGrouping
      OpenParenToken "("
      QuestionToken "?"
      OpenParenToken "("
      NumberToken "1" = 1
      CloseParenToken ")"
      Sequence
        Text
          TextToken "b"
      CloseParenToken ")"
  EndOfFile
"#,
        );

        // inline options are an ordinary condition grouping
        assert_tree(
            "(?(?i))",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    ConditionalExpressionGrouping
      OpenParenToken "("
      QuestionToken "?"
      SimpleOptionsGrouping
        OpenParenToken "("
        QuestionToken "?"
        OptionsToken "i"
        CloseParenToken ")"
      Sequence
      CloseParenToken ")"
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_character_classes() {
        assert_tree(
            "[a-z-[aeiou]]",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    CharacterClass
      OpenBracketToken "["
      Sequence
        CharacterClassRange
          Text
            TextToken "a"
          MinusToken "-"
          Text
            TextToken "z"
        CharacterClassSubtraction
          MinusToken "-"
          CharacterClass
            OpenBracketToken "["
            Sequence
              Text
                TextToken "aeiou"
            CloseBracketToken "]"
      CloseBracketToken "]"
  EndOfFile
"#,
        );

        // a `]` right after `[^` is content
        assert_tree(
            "[^]a]",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    NegatedCharacterClass
      OpenBracketToken "["
      CaretToken "^"
      Sequence
        Text
          TextToken "]a"
      CloseBracketToken "]"
  EndOfFile
"#,
        );

        assert_tree(
            "[[:alpha:]\\d-]",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    CharacterClass
      OpenBracketToken "["
      Sequence
        PosixProperty
          TextToken "[:alpha:]"
        CharacterClassEscape
          BackslashToken "\\"
          TextToken "d"
        Text
          TextToken "-"
      CloseBracketToken "]"
  EndOfFile
"#,
        );

        assert_tree(
            "[",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    CharacterClass
      OpenBracketToken "["
      Sequence
      CloseBracketToken (missing)
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_escapes() {
        assert_tree(
            r"\d\x41\p{Lu}\1",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    CharacterClassEscape
      BackslashToken "\\"
      TextToken "d"
    HexEscape
      BackslashToken "\\"
      TextToken "x"
      TextToken "41"
    CategoryEscape
      BackslashToken "\\"
      TextToken "p"
      OpenBraceToken "{"
      EscapeCategoryToken "Lu"
      CloseBraceToken "}"
    BackreferenceEscape
      BackslashToken "\\"
      NumberToken "1" = 1
  EndOfFile
"#,
        );

        assert_tree(
            r"\k<x>\cA\012\b",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    KCaptureEscape
      BackslashToken "\\"
      TextToken "k"
      LessThanToken "<"
      CaptureNameToken "x" = x
      GreaterThanToken ">"
    ControlEscape
      BackslashToken "\\"
      TextToken "c"
      TextToken "A"
    OctalEscape
      BackslashToken "\\"
      TextToken "012"
    AnchorEscape
      BackslashToken "\\"
      TextToken "b"
  EndOfFile
"#,
        );

        // `\p` without braces falls back to a simple escape
        assert_tree(
            r"\pL",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    SimpleEscape
      BackslashToken "\\"
      TextToken "p"
    Text
      TextToken "L"
  EndOfFile
"#,
        );

        assert_tree(
            "\\",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    SimpleEscape
      BackslashToken "\\"
      TextToken (missing)
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_parse_trivia() {
        assert_tree(
            "a # c\n b",
            RegexOptions::IGNORE_PATTERN_WHITESPACE,
            r##"
CompilationUnit
  Sequence
    Text
      TextToken "a"
    Text
      WhitespaceTrivia " "
      CommentTrivia "# c"
      WhitespaceTrivia "\n "
      TextToken "b"
  EndOfFile
"##,
        );

        // `(?x)` turns on whitespace trivia for what follows
        assert_tree(
            "(?x) a(?#c)",
            RegexOptions::empty(),
            r#"
CompilationUnit
  Sequence
    SimpleOptionsGrouping
      OpenParenToken "("
      QuestionToken "?"
      OptionsToken "x"
      CloseParenToken ")"
    Text
      WhitespaceTrivia " "
      TextToken "a"
  CommentTrivia "(?#c)"
  EndOfFile
"#,
        );
    }

    #[test]
    fn test_recursion_limit() {
        let config = ParserConfig::builder().max_recursion_depth(4).build();
        assert!(parse_with_config("(a)", &config).is_ok());
        assert_eq!(
            parse_with_config("((a))", &config),
            Err(RegexError::RecursionLimitExceeded(4))
        );
        assert_eq!(
            parse_with_config("[a-[b-[c-[d]]]]", &config),
            Err(RegexError::RecursionLimitExceeded(4))
        );
    }
}
