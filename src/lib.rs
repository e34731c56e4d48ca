// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

mod captureinfo;
mod config;
mod decodedchar;
mod error;
mod location;
mod options;
mod printer;
mod tree;

pub mod ast;
pub mod diagnostic;
pub mod dotnet;

pub use ast::{Node, NodeKind, NodeOrToken};
pub use captureinfo::CaptureMaps;
pub use config::{ParserConfig, DEFAULT_MAX_RECURSION_DEPTH};
pub use decodedchar::{DecodedChar, DecodedChars};
pub use diagnostic::Diagnostic;
pub use dotnet::token::{Token, TokenKind, TokenValue, Trivia, TriviaKind};
pub use error::RegexError;
pub use location::Span;
pub use options::RegexOptions;
pub use tree::RegexTree;
