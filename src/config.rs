// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use bon::Builder;

use crate::options::RegexOptions;

/// Counted on every entry into alternation, grouping and character class
/// parsing, so one level of `(...)` nesting costs two.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 256;

/// Parser settings.
///
/// ```
/// use embedded_regex::{ParserConfig, RegexOptions};
///
/// let config = ParserConfig::builder()
///     .options(RegexOptions::IGNORE_PATTERN_WHITESPACE)
///     .max_recursion_depth(64)
///     .build();
/// assert_eq!(config.max_recursion_depth, 64);
/// ```
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// The options in effect at the start of the pattern.
    #[builder(default)]
    pub options: RegexOptions,

    /// Parsing fails with `RegexError::RecursionLimitExceeded` beyond this.
    #[builder(default = DEFAULT_MAX_RECURSION_DEPTH)]
    pub max_recursion_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig::builder().build()
    }
}

impl From<RegexOptions> for ParserConfig {
    fn from(options: RegexOptions) -> Self {
        ParserConfig::builder().options(options).build()
    }
}
