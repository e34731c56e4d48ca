// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::{self, Display};

/// Hard failures. Problems in the pattern itself are never reported
/// through this type, they become `Diagnostic`s inside the tree.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RegexError {
    /// The pattern nests deeper than the configured maximum.
    RecursionLimitExceeded(usize),

    /// The source span of the decoded char at this index does not start
    /// where the previous one ends.
    DiscontiguousSpan(usize),

    /// The decoded char at this index covers no source text.
    EmptySpan(usize),
}

impl Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexError::RecursionLimitExceeded(max_depth) => write!(
                f,
                "Pattern nesting exceeds the maximum recursion depth of {}.",
                max_depth
            ),
            RegexError::DiscontiguousSpan(index) => write!(
                f,
                "Decoded char at index {} does not continue the previous source span.",
                index
            ),
            RegexError::EmptySpan(index) => {
                write!(f, "Decoded char at index {} has an empty source span.", index)
            }
        }
    }
}

impl std::error::Error for RegexError {}
