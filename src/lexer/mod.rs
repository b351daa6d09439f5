/*
 * ==========================================================================
 * PSEUDO - Structured Pseudocode Interpreter
 * ==========================================================================
 * 
 * Author:   Sam Wilcox
 * 
 * License:
 * This file is part of the PSEUDO interpreter project.
 * 
 * PSEUDO is dual-licensed under the terms of:
 *   - The MIT license
 *   - The Apache License, Version 2.0
 * 
 * You may choose either license to govern your use of this software.
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * 
 * ==========================================================================
 */

/// Scanner: raw text → symbols (total, never fails)
pub mod symbol;

/// Token kinds and the `Token` struct consumed by the parser
pub mod token;

/// Keyword table and spellings
pub mod keywords;

/// Tokenizer: symbols → tokens (strings, comments, decimals, keywords)
pub mod tokenizer;

pub use symbol::{symbolize, Symbol, SymbolKind};
pub use token::{Token, TokenKind};
pub use tokenizer::tokenize;

use crate::config::Config;
use crate::error::PResult;

/// Runs both lexing phases over a source string.
pub fn lex(source: &str, config: &Config) -> PResult<Vec<Token>> {
    let symbols = symbolize(source);
    tokenize(&symbols, config)
}
