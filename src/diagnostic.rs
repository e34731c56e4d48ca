// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::location::Span;

/// A problem found in the pattern, located in host source coordinates.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @{}", self.message, self.span)
    }
}

// The wording below is the engine's own, so users see the same text at
// design time as when the pattern throws at run time.

pub const NOT_ENOUGH_CLOSE_PARENS: &str = "Not enough )'s";
pub const TOO_MANY_CLOSE_PARENS: &str = "Too many )'s";
pub const QUANTIFIER_FOLLOWING_NOTHING: &str = "Quantifier {x,y} following nothing";
pub const UNRECOGNIZED_GROUPING_CONSTRUCT: &str = "Unrecognized grouping construct";
pub const INVALID_GROUP_NAME: &str =
    "Invalid group name: Group names must begin with a word character";
pub const UNTERMINATED_CHARACTER_CLASS_SET: &str = "Unterminated [] set";
pub const INCOMPLETE_CHARACTER_ESCAPE: &str = "Incomplete \\p{X} character escape";
pub const MALFORMED_CHARACTER_ESCAPE: &str = "Malformed \\p{X} character escape";
pub const MALFORMED_NAMED_BACK_REFERENCE: &str = "Malformed \\k<...> named back reference";
pub const INSUFFICIENT_HEXADECIMAL_DIGITS: &str = "Insufficient hexadecimal digits";
pub const UNRECOGNIZED_CONTROL_CHARACTER: &str = "Unrecognized control character";
pub const MISSING_CONTROL_CHARACTER: &str = "Missing control character";
pub const CAPTURE_NUMBER_CANNOT_BE_ZERO: &str = "Capture number cannot be zero";
pub const CAPTURE_NUMBER_TOO_LARGE: &str =
    "Capture group numbers must be less than or equal to Int32.MaxValue";
pub const UNTERMINATED_COMMENT: &str = "Unterminated (?#...) comment";
pub const UNKNOWN_PROPERTY: &str = "Unknown property";
pub const REFERENCE_TO_UNDEFINED_GROUP: &str = "Reference to undefined group";
pub const MALFORMED: &str = "Malformed";
pub const ALTERNATION_CONDITIONS_DO_NOT_CAPTURE: &str =
    "Alternation conditions do not capture and cannot be named";
pub const ALTERNATION_CONDITIONS_CANNOT_BE_COMMENTS: &str =
    "Alternation conditions cannot be comments";
pub const SUBTRACTION_MUST_BE_LAST: &str =
    "A subtraction must be the last element in a character class";
pub const ILLEGAL_QUANTIFIER_RANGE: &str = "Illegal {x,y} with x > y";
pub const RANGE_IN_REVERSE_ORDER: &str = "[x-y] range in reverse order";
pub const ILLEGAL_BACKSLASH_AT_END: &str = "Illegal \\ at end of pattern";
pub const TOO_MANY_BARS_IN_CONDITIONAL: &str = "Too many | in (?()|)";

pub fn nested_quantifier(quantifier: char) -> String {
    format!("Nested quantifier {}", quantifier)
}

pub fn unrecognized_escape_sequence(escape: char) -> String {
    format!("Unrecognized escape sequence \\{}", escape)
}

pub fn unknown_property_named(name: &str) -> String {
    format!("Unknown property '{}'", name)
}

pub fn reference_to_undefined_group_number(number: i32) -> String {
    format!("Reference to undefined group number {}", number)
}

pub fn reference_to_undefined_group_name(name: &str) -> String {
    format!("Reference to undefined group name {}", name)
}

pub fn cannot_include_class_in_range(class: char) -> String {
    format!("Cannot include class \\{} in character range", class)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::location::Span;

    use super::{nested_quantifier, unrecognized_escape_sequence, Diagnostic};

    #[test]
    fn test_messages() {
        assert_eq!(nested_quantifier('*'), "Nested quantifier *");
        assert_eq!(unrecognized_escape_sequence('q'), "Unrecognized escape sequence \\q");
        assert_eq!(
            Diagnostic::new("Too many )'s", Span::new(3, 1)).to_string(),
            "Too many )'s @3..4"
        );
    }
}
