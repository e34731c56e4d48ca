// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use bitflags::bitflags;

use crate::decodedchar::DecodedChar;

bitflags! {
    /// Dialect options. Bit values match the numeric values the .NET
    /// engine publishes, so raw option integers can be passed through.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegexOptions: u32 {
        const IGNORE_CASE = 1;
        const MULTILINE = 1 << 1;
        const EXPLICIT_CAPTURE = 1 << 2;
        const SINGLELINE = 1 << 4;
        const IGNORE_PATTERN_WHITESPACE = 1 << 5;
        const RIGHT_TO_LEFT = 1 << 6;
        const ECMA_SCRIPT = 1 << 8;
        const CULTURE_INVARIANT = 1 << 9;
    }
}

impl RegexOptions {
    /// Maps an inline option letter, e.g. the `i` of `(?i)`.
    pub fn from_inline_code(code: char) -> Option<RegexOptions> {
        match code {
            'i' | 'I' => Some(RegexOptions::IGNORE_CASE),
            'm' | 'M' => Some(RegexOptions::MULTILINE),
            'n' | 'N' => Some(RegexOptions::EXPLICIT_CAPTURE),
            's' | 'S' => Some(RegexOptions::SINGLELINE),
            'x' | 'X' => Some(RegexOptions::IGNORE_PATTERN_WHITESPACE),
            _ => None,
        }
    }

    /// Applies an inline option run such as `i-sx` or `+m-n`.
    /// Letters after `-` turn options off until a `+` turns them back on.
    pub fn with_inline_delta(self, codes: &[DecodedChar]) -> RegexOptions {
        let mut options = self;
        let mut on = true;

        for code in codes {
            match code.value {
                '-' => on = false,
                '+' => on = true,
                c => {
                    if let Some(option) = RegexOptions::from_inline_code(c) {
                        options.set(option, on);
                    }
                }
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::decodedchar::DecodedChars;

    use super::RegexOptions;

    #[test]
    fn test_inline_delta() {
        {
            let codes = DecodedChars::from_text("imnsx", 0);
            assert_eq!(
                RegexOptions::empty().with_inline_delta(codes.as_slice()),
                RegexOptions::IGNORE_CASE
                    | RegexOptions::MULTILINE
                    | RegexOptions::EXPLICIT_CAPTURE
                    | RegexOptions::SINGLELINE
                    | RegexOptions::IGNORE_PATTERN_WHITESPACE
            );
        }

        {
            let codes = DecodedChars::from_text("I-x+M", 0);
            assert_eq!(
                RegexOptions::IGNORE_PATTERN_WHITESPACE.with_inline_delta(codes.as_slice()),
                RegexOptions::IGNORE_CASE | RegexOptions::MULTILINE
            );
        }

        // flags that have no inline letter are kept
        {
            let codes = DecodedChars::from_text("-imnsx", 0);
            assert_eq!(
                RegexOptions::all().with_inline_delta(codes.as_slice()),
                RegexOptions::RIGHT_TO_LEFT
                    | RegexOptions::ECMA_SCRIPT
                    | RegexOptions::CULTURE_INVARIANT
            );
        }
    }

    #[test]
    fn test_raw_values() {
        assert_eq!(
            RegexOptions::from_bits_truncate(0x24),
            RegexOptions::EXPLICIT_CAPTURE | RegexOptions::IGNORE_PATTERN_WHITESPACE
        );
        assert_eq!(RegexOptions::from_inline_code('q'), None);
    }
}
