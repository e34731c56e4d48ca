// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{dotnet::token::Token, location::Span};

/// A syntax tree node. The tree is lossless: every char of the pattern
/// belongs to exactly one token (or one token's leading trivia), and
/// walking `children()` in order visits the tokens in text order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Node {
    /// The root: the top level expression and the end-of-file token,
    /// which holds any trailing trivia.
    CompilationUnit(Box<CompilationUnitNode>),

    Sequence(Box<SequenceNode>),

    /// `a|b|c`, holding the branch sequences and the bars between them.
    Alternation(Box<AlternationNode>),

    Text(Box<TextNode>),
    Wildcard(Box<WildcardNode>),
    StartAnchor(Box<AnchorNode>),
    EndAnchor(Box<AnchorNode>),

    CharacterClass(Box<CharacterClassNode>),
    NegatedCharacterClass(Box<NegatedCharacterClassNode>),
    CharacterClassRange(Box<CharacterClassRangeNode>),
    CharacterClassSubtraction(Box<CharacterClassSubtractionNode>),

    /// `[:name:]` inside a character class. Scanned and kept, never interpreted.
    PosixProperty(Box<PosixPropertyNode>),

    ZeroOrMoreQuantifier(Box<QuantifierNode>),
    OneOrMoreQuantifier(Box<QuantifierNode>),
    ZeroOrOneQuantifier(Box<QuantifierNode>),
    ExactNumericQuantifier(Box<ExactNumericQuantifierNode>),
    OpenRangeNumericQuantifier(Box<OpenRangeNumericQuantifierNode>),
    ClosedRangeNumericQuantifier(Box<ClosedRangeNumericQuantifierNode>),
    LazyQuantifier(Box<LazyQuantifierNode>),

    SimpleGrouping(Box<SimpleGroupingNode>),
    SimpleOptionsGrouping(Box<SimpleOptionsGroupingNode>),
    NestedOptionsGrouping(Box<NestedOptionsGroupingNode>),
    NonCapturingGrouping(Box<MarkedGroupingNode>),
    PositiveLookaheadGrouping(Box<MarkedGroupingNode>),
    NegativeLookaheadGrouping(Box<MarkedGroupingNode>),
    PositiveLookbehindGrouping(Box<LookbehindGroupingNode>),
    NegativeLookbehindGrouping(Box<LookbehindGroupingNode>),
    NonBacktrackingGrouping(Box<MarkedGroupingNode>),
    CaptureGrouping(Box<CaptureGroupingNode>),
    BalancingGrouping(Box<BalancingGroupingNode>),
    ConditionalCaptureGrouping(Box<ConditionalCaptureGroupingNode>),
    ConditionalExpressionGrouping(Box<ConditionalExpressionGroupingNode>),

    SimpleEscape(Box<EscapeNode>),
    AnchorEscape(Box<EscapeNode>),
    CharacterClassEscape(Box<EscapeNode>),
    ControlEscape(Box<ControlEscapeNode>),
    HexEscape(Box<HexEscapeNode>),
    UnicodeEscape(Box<HexEscapeNode>),
    OctalEscape(Box<OctalEscapeNode>),
    CaptureEscape(Box<CaptureEscapeNode>),
    KCaptureEscape(Box<KCaptureEscapeNode>),
    BackreferenceEscape(Box<BackreferenceEscapeNode>),
    CategoryEscape(Box<CategoryEscapeNode>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NodeKind {
    CompilationUnit,
    Sequence,
    Alternation,
    Text,
    Wildcard,
    StartAnchor,
    EndAnchor,
    CharacterClass,
    NegatedCharacterClass,
    CharacterClassRange,
    CharacterClassSubtraction,
    PosixProperty,
    ZeroOrMoreQuantifier,
    OneOrMoreQuantifier,
    ZeroOrOneQuantifier,
    ExactNumericQuantifier,
    OpenRangeNumericQuantifier,
    ClosedRangeNumericQuantifier,
    LazyQuantifier,
    SimpleGrouping,
    SimpleOptionsGrouping,
    NestedOptionsGrouping,
    NonCapturingGrouping,
    PositiveLookaheadGrouping,
    NegativeLookaheadGrouping,
    PositiveLookbehindGrouping,
    NegativeLookbehindGrouping,
    NonBacktrackingGrouping,
    CaptureGrouping,
    BalancingGrouping,
    ConditionalCaptureGrouping,
    ConditionalExpressionGrouping,
    SimpleEscape,
    AnchorEscape,
    CharacterClassEscape,
    ControlEscape,
    HexEscape,
    UnicodeEscape,
    OctalEscape,
    CaptureEscape,
    KCaptureEscape,
    BackreferenceEscape,
    CategoryEscape,
}

/// A child of a node: either a sub-node or a token.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum NodeOrToken<'a> {
    Node(&'a Node),
    Token(&'a Token),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CompilationUnitNode {
    pub expression: Node,
    pub end_of_file: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SequenceNode {
    pub children: Vec<Node>,
}

/// Invariant: `sequences.len() == bars.len() + 1`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AlternationNode {
    pub sequences: Vec<Node>,
    pub bars: Vec<Token>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TextNode {
    pub text: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct WildcardNode {
    pub dot: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AnchorNode {
    pub anchor: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CharacterClassNode {
    pub open_bracket: Token,
    pub components: Node, // a `Sequence`
    pub close_bracket: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NegatedCharacterClassNode {
    pub open_bracket: Token,
    pub caret: Token,
    pub components: Node, // a `Sequence`
    pub close_bracket: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CharacterClassRangeNode {
    pub left: Node,
    pub minus: Token,
    pub right: Node,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CharacterClassSubtractionNode {
    pub minus: Token,
    pub character_class: Node,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PosixPropertyNode {
    pub text: Token,
}

/// `*`, `+` or `?` applied to an expression.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct QuantifierNode {
    pub expression: Node,
    pub quantifier: Token,
}

/// `{n}`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExactNumericQuantifierNode {
    pub expression: Node,
    pub open_brace: Token,
    pub first_number: Token,
    pub close_brace: Token,
}

/// `{n,}`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OpenRangeNumericQuantifierNode {
    pub expression: Node,
    pub open_brace: Token,
    pub first_number: Token,
    pub comma: Token,
    pub close_brace: Token,
}

/// `{n,m}`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClosedRangeNumericQuantifierNode {
    pub expression: Node,
    pub open_brace: Token,
    pub first_number: Token,
    pub comma: Token,
    pub second_number: Token,
    pub close_brace: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LazyQuantifierNode {
    pub quantifier: Node,
    pub question: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SimpleGroupingNode {
    pub open_paren: Token,
    pub expression: Node,
    pub close_paren: Token,
}

/// `(?imnsx-imnsx)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SimpleOptionsGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub options: Token,
    pub close_paren: Token,
}

/// `(?imnsx-imnsx:...)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NestedOptionsGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub options: Token,
    pub colon: Token,
    pub expression: Node,
    pub close_paren: Token,
}

/// A grouping introduced by `(?` and one marker char: `(?:`, `(?=`, `(?!` or `(?>`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MarkedGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub marker: Token,
    pub expression: Node,
    pub close_paren: Token,
}

/// `(?<=...)` and `(?<!...)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LookbehindGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub less_than: Token,
    pub marker: Token,
    pub expression: Node,
    pub close_paren: Token,
}

/// `(?<name>...)` and `(?'name'...)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CaptureGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub open: Token,
    pub capture: Token,
    pub close: Token,
    pub expression: Node,
    pub close_paren: Token,
}

/// `(?<name1-name2>...)` and `(?'name1-name2'...)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BalancingGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub open: Token,
    pub first_capture: Token,
    pub minus: Token,
    pub second_capture: Token,
    pub close: Token,
    pub expression: Node,
    pub close_paren: Token,
}

/// `(?(name)yes|no)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConditionalCaptureGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub inner_open_paren: Token,
    pub capture: Token,
    pub inner_close_paren: Token,
    pub result: Node,
    pub close_paren: Token,
}

/// `(?(expression)yes|no)`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConditionalExpressionGroupingNode {
    pub open_paren: Token,
    pub question: Token,
    pub grouping: Node,
    pub result: Node,
    pub close_paren: Token,
}

/// `\` followed by one type char.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EscapeNode {
    pub backslash: Token,
    pub type_token: Token,
}

/// `\cX`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ControlEscapeNode {
    pub backslash: Token,
    pub type_token: Token,
    pub control: Token,
}

/// `\xhh` and `\uhhhh`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HexEscapeNode {
    pub backslash: Token,
    pub type_token: Token,
    pub hex_text: Token,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OctalEscapeNode {
    pub backslash: Token,
    pub octal_text: Token,
}

/// `\<name>` and `\'name'`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CaptureEscapeNode {
    pub backslash: Token,
    pub open: Token,
    pub capture: Token,
    pub close: Token,
}

/// `\k<name>` and `\k'name'`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KCaptureEscapeNode {
    pub backslash: Token,
    pub type_token: Token,
    pub open: Token,
    pub capture: Token,
    pub close: Token,
}

/// `\1`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BackreferenceEscapeNode {
    pub backslash: Token,
    pub number: Token,
}

/// `\p{name}` and `\P{name}`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CategoryEscapeNode {
    pub backslash: Token,
    pub type_token: Token,
    pub open_brace: Token,
    pub category: Token,
    pub close_brace: Token,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::CompilationUnit(_) => NodeKind::CompilationUnit,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Alternation(_) => NodeKind::Alternation,
            Node::Text(_) => NodeKind::Text,
            Node::Wildcard(_) => NodeKind::Wildcard,
            Node::StartAnchor(_) => NodeKind::StartAnchor,
            Node::EndAnchor(_) => NodeKind::EndAnchor,
            Node::CharacterClass(_) => NodeKind::CharacterClass,
            Node::NegatedCharacterClass(_) => NodeKind::NegatedCharacterClass,
            Node::CharacterClassRange(_) => NodeKind::CharacterClassRange,
            Node::CharacterClassSubtraction(_) => NodeKind::CharacterClassSubtraction,
            Node::PosixProperty(_) => NodeKind::PosixProperty,
            Node::ZeroOrMoreQuantifier(_) => NodeKind::ZeroOrMoreQuantifier,
            Node::OneOrMoreQuantifier(_) => NodeKind::OneOrMoreQuantifier,
            Node::ZeroOrOneQuantifier(_) => NodeKind::ZeroOrOneQuantifier,
            Node::ExactNumericQuantifier(_) => NodeKind::ExactNumericQuantifier,
            Node::OpenRangeNumericQuantifier(_) => NodeKind::OpenRangeNumericQuantifier,
            Node::ClosedRangeNumericQuantifier(_) => NodeKind::ClosedRangeNumericQuantifier,
            Node::LazyQuantifier(_) => NodeKind::LazyQuantifier,
            Node::SimpleGrouping(_) => NodeKind::SimpleGrouping,
            Node::SimpleOptionsGrouping(_) => NodeKind::SimpleOptionsGrouping,
            Node::NestedOptionsGrouping(_) => NodeKind::NestedOptionsGrouping,
            Node::NonCapturingGrouping(_) => NodeKind::NonCapturingGrouping,
            Node::PositiveLookaheadGrouping(_) => NodeKind::PositiveLookaheadGrouping,
            Node::NegativeLookaheadGrouping(_) => NodeKind::NegativeLookaheadGrouping,
            Node::PositiveLookbehindGrouping(_) => NodeKind::PositiveLookbehindGrouping,
            Node::NegativeLookbehindGrouping(_) => NodeKind::NegativeLookbehindGrouping,
            Node::NonBacktrackingGrouping(_) => NodeKind::NonBacktrackingGrouping,
            Node::CaptureGrouping(_) => NodeKind::CaptureGrouping,
            Node::BalancingGrouping(_) => NodeKind::BalancingGrouping,
            Node::ConditionalCaptureGrouping(_) => NodeKind::ConditionalCaptureGrouping,
            Node::ConditionalExpressionGrouping(_) => NodeKind::ConditionalExpressionGrouping,
            Node::SimpleEscape(_) => NodeKind::SimpleEscape,
            Node::AnchorEscape(_) => NodeKind::AnchorEscape,
            Node::CharacterClassEscape(_) => NodeKind::CharacterClassEscape,
            Node::ControlEscape(_) => NodeKind::ControlEscape,
            Node::HexEscape(_) => NodeKind::HexEscape,
            Node::UnicodeEscape(_) => NodeKind::UnicodeEscape,
            Node::OctalEscape(_) => NodeKind::OctalEscape,
            Node::CaptureEscape(_) => NodeKind::CaptureEscape,
            Node::KCaptureEscape(_) => NodeKind::KCaptureEscape,
            Node::BackreferenceEscape(_) => NodeKind::BackreferenceEscape,
            Node::CategoryEscape(_) => NodeKind::CategoryEscape,
        }
    }

    /// The children in text order.
    pub fn children(&self) -> Vec<NodeOrToken<'_>> {
        use NodeOrToken::{Node as N, Token as T};

        match self {
            Node::CompilationUnit(n) => vec![N(&n.expression), T(&n.end_of_file)],
            Node::Sequence(n) => n.children.iter().map(N).collect(),
            Node::Alternation(n) => {
                let mut children = Vec::with_capacity(n.sequences.len() + n.bars.len());
                for (index, sequence) in n.sequences.iter().enumerate() {
                    if index > 0 {
                        children.push(T(&n.bars[index - 1]));
                    }
                    children.push(N(sequence));
                }
                children
            }
            Node::Text(n) => vec![T(&n.text)],
            Node::Wildcard(n) => vec![T(&n.dot)],
            Node::StartAnchor(n) | Node::EndAnchor(n) => vec![T(&n.anchor)],
            Node::CharacterClass(n) => {
                vec![T(&n.open_bracket), N(&n.components), T(&n.close_bracket)]
            }
            Node::NegatedCharacterClass(n) => vec![
                T(&n.open_bracket),
                T(&n.caret),
                N(&n.components),
                T(&n.close_bracket),
            ],
            Node::CharacterClassRange(n) => vec![N(&n.left), T(&n.minus), N(&n.right)],
            Node::CharacterClassSubtraction(n) => vec![T(&n.minus), N(&n.character_class)],
            Node::PosixProperty(n) => vec![T(&n.text)],
            Node::ZeroOrMoreQuantifier(n)
            | Node::OneOrMoreQuantifier(n)
            | Node::ZeroOrOneQuantifier(n) => vec![N(&n.expression), T(&n.quantifier)],
            Node::ExactNumericQuantifier(n) => vec![
                N(&n.expression),
                T(&n.open_brace),
                T(&n.first_number),
                T(&n.close_brace),
            ],
            Node::OpenRangeNumericQuantifier(n) => vec![
                N(&n.expression),
                T(&n.open_brace),
                T(&n.first_number),
                T(&n.comma),
                T(&n.close_brace),
            ],
            Node::ClosedRangeNumericQuantifier(n) => vec![
                N(&n.expression),
                T(&n.open_brace),
                T(&n.first_number),
                T(&n.comma),
                T(&n.second_number),
                T(&n.close_brace),
            ],
            Node::LazyQuantifier(n) => vec![N(&n.quantifier), T(&n.question)],
            Node::SimpleGrouping(n) => {
                vec![T(&n.open_paren), N(&n.expression), T(&n.close_paren)]
            }
            Node::SimpleOptionsGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.options),
                T(&n.close_paren),
            ],
            Node::NestedOptionsGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.options),
                T(&n.colon),
                N(&n.expression),
                T(&n.close_paren),
            ],
            Node::NonCapturingGrouping(n)
            | Node::PositiveLookaheadGrouping(n)
            | Node::NegativeLookaheadGrouping(n)
            | Node::NonBacktrackingGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.marker),
                N(&n.expression),
                T(&n.close_paren),
            ],
            Node::PositiveLookbehindGrouping(n) | Node::NegativeLookbehindGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.less_than),
                T(&n.marker),
                N(&n.expression),
                T(&n.close_paren),
            ],
            Node::CaptureGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.open),
                T(&n.capture),
                T(&n.close),
                N(&n.expression),
                T(&n.close_paren),
            ],
            Node::BalancingGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.open),
                T(&n.first_capture),
                T(&n.minus),
                T(&n.second_capture),
                T(&n.close),
                N(&n.expression),
                T(&n.close_paren),
            ],
            Node::ConditionalCaptureGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                T(&n.inner_open_paren),
                T(&n.capture),
                T(&n.inner_close_paren),
                N(&n.result),
                T(&n.close_paren),
            ],
            Node::ConditionalExpressionGrouping(n) => vec![
                T(&n.open_paren),
                T(&n.question),
                N(&n.grouping),
                N(&n.result),
                T(&n.close_paren),
            ],
            Node::SimpleEscape(n) | Node::AnchorEscape(n) | Node::CharacterClassEscape(n) => {
                vec![T(&n.backslash), T(&n.type_token)]
            }
            Node::ControlEscape(n) => vec![T(&n.backslash), T(&n.type_token), T(&n.control)],
            Node::HexEscape(n) | Node::UnicodeEscape(n) => {
                vec![T(&n.backslash), T(&n.type_token), T(&n.hex_text)]
            }
            Node::OctalEscape(n) => vec![T(&n.backslash), T(&n.octal_text)],
            Node::CaptureEscape(n) => {
                vec![T(&n.backslash), T(&n.open), T(&n.capture), T(&n.close)]
            }
            Node::KCaptureEscape(n) => vec![
                T(&n.backslash),
                T(&n.type_token),
                T(&n.open),
                T(&n.capture),
                T(&n.close),
            ],
            Node::BackreferenceEscape(n) => vec![T(&n.backslash), T(&n.number)],
            Node::CategoryEscape(n) => vec![
                T(&n.backslash),
                T(&n.type_token),
                T(&n.open_brace),
                T(&n.category),
                T(&n.close_brace),
            ],
        }
    }

    /// Visits every token of the subtree in text order.
    pub fn for_each_token<'a>(&'a self, f: &mut impl FnMut(&'a Token)) {
        for child in self.children() {
            match child {
                NodeOrToken::Node(node) => node.for_each_token(f),
                NodeOrToken::Token(token) => f(token),
            }
        }
    }

    /// The span of the subtree's chars, excluding the leading trivia of
    /// its first token. `None` when the subtree holds no chars at all.
    pub fn span(&self) -> Option<Span> {
        let mut first = None;
        let mut last = None;
        self.for_each_token(&mut |token| {
            if let Some(span) = token.span() {
                first.get_or_insert(span);
                last = Some(span);
            }
        });

        match (first, last) {
            (Some(first), Some(last)) => Some(Span::from_range_pair(&first, &last)),
            _ => None,
        }
    }

    /// The span of the subtree's chars including all trivia.
    pub fn full_span(&self) -> Option<Span> {
        let mut first = None;
        let mut last = None;
        self.for_each_token(&mut |token| {
            if let Some(span) = token.full_span() {
                first.get_or_insert(span);
                last = Some(span);
            }
        });

        match (first, last) {
            (Some(first), Some(last)) => Some(Span::from_range_pair(&first, &last)),
            _ => None,
        }
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(
            self,
            Node::ZeroOrMoreQuantifier(_)
                | Node::OneOrMoreQuantifier(_)
                | Node::ZeroOrOneQuantifier(_)
                | Node::ExactNumericQuantifier(_)
                | Node::OpenRangeNumericQuantifier(_)
                | Node::ClosedRangeNumericQuantifier(_)
        )
    }

    /// The open and close paren of a grouping node.
    pub fn grouping_parens(&self) -> Option<(&Token, &Token)> {
        match self {
            Node::SimpleGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::SimpleOptionsGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::NestedOptionsGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::NonCapturingGrouping(n)
            | Node::PositiveLookaheadGrouping(n)
            | Node::NegativeLookaheadGrouping(n)
            | Node::NonBacktrackingGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::PositiveLookbehindGrouping(n) | Node::NegativeLookbehindGrouping(n) => {
                Some((&n.open_paren, &n.close_paren))
            }
            Node::CaptureGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::BalancingGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::ConditionalCaptureGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            Node::ConditionalExpressionGrouping(n) => Some((&n.open_paren, &n.close_paren)),
            _ => None,
        }
    }

    /// The embedded expression of a grouping node, if it has one.
    pub fn grouping_expression(&self) -> Option<&Node> {
        match self {
            Node::SimpleGrouping(n) => Some(&n.expression),
            Node::NestedOptionsGrouping(n) => Some(&n.expression),
            Node::NonCapturingGrouping(n)
            | Node::PositiveLookaheadGrouping(n)
            | Node::NegativeLookaheadGrouping(n)
            | Node::NonBacktrackingGrouping(n) => Some(&n.expression),
            Node::PositiveLookbehindGrouping(n) | Node::NegativeLookbehindGrouping(n) => {
                Some(&n.expression)
            }
            Node::CaptureGrouping(n) => Some(&n.expression),
            Node::BalancingGrouping(n) => Some(&n.expression),
            Node::ConditionalCaptureGrouping(n) => Some(&n.result),
            Node::ConditionalExpressionGrouping(n) => Some(&n.result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        decodedchar::DecodedChars,
        dotnet::token::{Token, TokenKind},
        location::Span,
    };

    use super::{AlternationNode, Node, NodeKind, NodeOrToken, SequenceNode, TextNode};

    fn text_node(chars: &DecodedChars, index: usize) -> Node {
        Node::Text(Box::new(TextNode {
            text: Token::new(
                TokenKind::Text,
                vec![],
                chars.as_slice()[index..index + 1].to_vec(),
            ),
        }))
    }

    fn sequence(children: Vec<Node>) -> Node {
        Node::Sequence(Box::new(SequenceNode { children }))
    }

    #[test]
    fn test_alternation_children_interleave() {
        let chars = DecodedChars::from_text("a|b|", 0);
        let bar = |index: usize| {
            Token::new(TokenKind::Bar, vec![], chars.as_slice()[index..index + 1].to_vec())
        };

        let node = Node::Alternation(Box::new(AlternationNode {
            sequences: vec![
                sequence(vec![text_node(&chars, 0)]),
                sequence(vec![text_node(&chars, 2)]),
                sequence(vec![]),
            ],
            bars: vec![bar(1), bar(3)],
        }));

        let kinds: Vec<String> = node
            .children()
            .iter()
            .map(|child| match child {
                NodeOrToken::Node(n) => format!("{:?}", n.kind()),
                NodeOrToken::Token(t) => t.kind.to_string(),
            })
            .collect();

        assert_eq!(
            kinds,
            vec!["Sequence", "BarToken", "Sequence", "BarToken", "Sequence"]
        );
        assert_eq!(node.kind(), NodeKind::Alternation);
        assert_eq!(node.span(), Some(Span::new(0, 4)));

        let mut text = String::new();
        node.for_each_token(&mut |token| text.push_str(&token.text()));
        assert_eq!(text, "a|b|");
    }

    #[test]
    fn test_span_of_empty_nodes() {
        assert_eq!(sequence(vec![]).span(), None);
        assert!(!sequence(vec![]).is_quantifier());
    }
}
