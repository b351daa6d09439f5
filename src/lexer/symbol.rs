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

//! The scanner: first lexing phase.
//!
//! `symbolize` cuts raw source text into a flat list of [`Symbol`]s. It is
//! context-free; it does not know whether it is inside a string or comment.
//! That is the tokenizer's job. Every input character ends up in exactly one
//! symbol, and unrecognised characters become [`SymbolKind::Unknown`] so that
//! this phase can never fail.

use serde::Serialize;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    QuoteSingle,
    QuoteDouble,
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    ParenOpen,
    ParenClose,
    Colon,
    Semicolon,
    Comma,
    Period,
    Range,

    CommentSingleLine,
    CommentMultiLineOpen,
    CommentMultiLineClose,

    Add,
    Subtract,
    Multiply,
    Divide,
    Caret,
    EqualTo,
    NotEqualTo,
    /// `!=`, which is rejected by the tokenizer with a pointer to `<>`.
    BangEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Assignment,
    Ampersand,

    /// A backslash escape such as `\n` or `\"`.
    Escape,
    /// A backslash immediately followed by a line break.
    LineContinuation,
    Backslash,

    Newline,
    Whitespace,
    NumericFragment,
    Word,
    Unknown,
}

/// A lexical unit before keyword or context resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub text: String,
    pub span: Span,
}

/// Fixed symbols, longest and most specific first.
const FIXED_SYMBOLS: &[(&str, SymbolKind)] = &[
    ("\\\r\n", SymbolKind::LineContinuation),
    ("\\\n", SymbolKind::LineContinuation),
    ("\\\"", SymbolKind::Escape),
    ("\\'", SymbolKind::Escape),
    ("\\\\", SymbolKind::Escape),
    ("\\t", SymbolKind::Escape),
    ("\\n", SymbolKind::Escape),
    ("\r\n", SymbolKind::Newline),
    ("//", SymbolKind::CommentSingleLine),
    ("/*", SymbolKind::CommentMultiLineOpen),
    ("*/", SymbolKind::CommentMultiLineClose),
    ("<-", SymbolKind::Assignment),
    ("<=", SymbolKind::LessThanEqual),
    (">=", SymbolKind::GreaterThanEqual),
    ("<>", SymbolKind::NotEqualTo),
    ("!=", SymbolKind::BangEqual),
    ("..", SymbolKind::Range),
    ("\u{2190}", SymbolKind::Assignment),
    ("\\", SymbolKind::Backslash),
    ("\n", SymbolKind::Newline),
    ("'", SymbolKind::QuoteSingle),
    ("\"", SymbolKind::QuoteDouble),
    ("{", SymbolKind::BraceOpen),
    ("}", SymbolKind::BraceClose),
    ("[", SymbolKind::BracketOpen),
    ("]", SymbolKind::BracketClose),
    ("(", SymbolKind::ParenOpen),
    (")", SymbolKind::ParenClose),
    (":", SymbolKind::Colon),
    (";", SymbolKind::Semicolon),
    (",", SymbolKind::Comma),
    (".", SymbolKind::Period),
    ("+", SymbolKind::Add),
    ("-", SymbolKind::Subtract),
    ("*", SymbolKind::Multiply),
    ("/", SymbolKind::Divide),
    ("^", SymbolKind::Caret),
    ("=", SymbolKind::EqualTo),
    ("<", SymbolKind::LessThan),
    (">", SymbolKind::GreaterThan),
    ("&", SymbolKind::Ampersand),
];

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r')
}

/// Converts raw source text into symbols.
///
/// Matching order:
/// 1. fixed symbols, longest first (`<-` before `<`, `\n` escapes before a
///    bare backslash)
/// 2. runs of whitespace, digits, and word characters
/// 3. any other single character, as `Unknown`
///
/// The concatenated `text` of the returned symbols is always equal to the
/// input.
pub fn symbolize(source: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];

        if let Some((text, kind)) = FIXED_SYMBOLS.iter().find(|(text, _)| rest.starts_with(text)) {
            symbols.push(Symbol {
                kind: *kind,
                text: (*text).to_string(),
                span: Span::new(pos, pos + text.len()),
            });
            pos += text.len();
            continue;
        }

        // `rest` is non-empty, so there is always a first character.
        let first = match rest.chars().next() {
            Some(ch) => ch,
            None => break,
        };

        let run_kind = if is_whitespace(first) {
            Some((SymbolKind::Whitespace, is_whitespace as fn(char) -> bool))
        } else if is_digit(first) {
            Some((SymbolKind::NumericFragment, is_digit as fn(char) -> bool))
        } else if is_word_char(first) {
            Some((SymbolKind::Word, is_word_char as fn(char) -> bool))
        } else {
            None
        };

        let (kind, len) = match run_kind {
            Some((kind, continues)) => {
                let len = rest
                    .char_indices()
                    .find(|(_, ch)| !continues(*ch))
                    .map(|(idx, _)| idx)
                    .unwrap_or(rest.len());
                (kind, len)
            }
            None => (SymbolKind::Unknown, first.len_utf8()),
        };

        symbols.push(Symbol {
            kind,
            text: rest[..len].to_string(),
            span: Span::new(pos, pos + len),
        });
        pos += len;
    }

    tracing::trace!(count = symbols.len(), "symbolized source");
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<SymbolKind> {
        symbolize(source).into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("x<-1<=2<>3"),
            vec![
                SymbolKind::Word,
                SymbolKind::Assignment,
                SymbolKind::NumericFragment,
                SymbolKind::LessThanEqual,
                SymbolKind::NumericFragment,
                SymbolKind::NotEqualTo,
                SymbolKind::NumericFragment,
            ]
        );
    }

    #[test]
    fn digits_then_word_split() {
        let symbols = symbolize("12ab_3");
        assert_eq!(symbols[0].text, "12");
        assert_eq!(symbols[0].kind, SymbolKind::NumericFragment);
        assert_eq!(symbols[1].text, "ab_3");
        assert_eq!(symbols[1].kind, SymbolKind::Word);
    }

    #[test]
    fn unknown_characters_are_single_symbols() {
        let symbols = symbolize("a€b");
        assert_eq!(symbols[1].kind, SymbolKind::Unknown);
        assert_eq!(symbols[1].text, "€");
        assert_eq!(symbols[1].span, Span::new(1, 4));
    }

    #[test]
    fn escapes_before_backslash() {
        assert_eq!(
            kinds("\\n\\q"),
            vec![SymbolKind::Escape, SymbolKind::Backslash, SymbolKind::Word]
        );
    }
}
