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

//! The tokenizer: second lexing phase.
//!
//! Consumes the scanner's symbols with a small amount of state:
//! - whether a single-line or multi-line comment is open
//! - whether a single- or double-quoted string is open (and its decoded text)
//! - whether a number may, or must, continue with a decimal part
//!
//! Whitespace and comments are dropped. Words become keyword tokens through
//! an exact lookup in the keyword table, or name tokens otherwise.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::Config;
use crate::error::{PResult, PseudoError};
use crate::lexer::keywords::keyword_kind;
use crate::lexer::symbol::{Symbol, SymbolKind};
use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;

/// Mutually exclusive scanning states.
#[derive(Debug, Clone, PartialEq)]
enum LexState {
    Normal,
    SingleLineComment,
    MultiLineComment { start: Span },
    String { quote: char, start: Span, text: String },
}

/// Decimal-number continuation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecimalState {
    None,
    /// The previous token was a numeric fragment; a `.` may follow.
    AllowDecimal,
    /// A `.` was consumed after a number; digits must follow.
    RequireNumber,
}

struct Tokenizer<'c> {
    config: &'c Config,
    state: LexState,
    decimal: DecimalState,
    tokens: Vec<Token>,
}

/// Converts symbols into tokens.
///
/// # Errors
/// Fails with a lex error when:
/// - an `Unknown` symbol appears outside a string or comment
/// - an escape sequence appears outside a string
/// - a string or comment is still open at end of input
/// - a comment close appears without a matching open
/// - a character literal is not exactly one character
/// - `!=` is used instead of `<>`
/// - a number ends with `.` and no digits
pub fn tokenize(symbols: &[Symbol], config: &Config) -> PResult<Vec<Token>> {
    let mut tokenizer = Tokenizer {
        config,
        state: LexState::Normal,
        decimal: DecimalState::None,
        tokens: Vec::new(),
    };

    for symbol in symbols {
        tokenizer.feed(symbol)?;
    }
    tokenizer.finish()?;

    tracing::trace!(count = tokenizer.tokens.len(), "tokenized symbols");
    Ok(tokenizer.tokens)
}

impl<'c> Tokenizer<'c> {
    fn feed(&mut self, symbol: &Symbol) -> PResult<()> {
        match &mut self.state {
            LexState::SingleLineComment => {
                if symbol.kind == SymbolKind::Newline {
                    self.state = LexState::Normal;
                    self.push(TokenKind::Newline, &symbol.text, symbol.span);
                }
                Ok(())
            }

            LexState::MultiLineComment { .. } => {
                if symbol.kind == SymbolKind::CommentMultiLineClose {
                    self.state = LexState::Normal;
                }
                Ok(())
            }

            LexState::String { quote, text, .. } => {
                let closes = matches!(
                    (symbol.kind, *quote),
                    (SymbolKind::QuoteDouble, '"') | (SymbolKind::QuoteSingle, '\'')
                );

                if closes {
                    return self.close_string(symbol.span);
                }

                match symbol.kind {
                    SymbolKind::Escape => text.push(decode_escape(&symbol.text)),
                    SymbolKind::LineContinuation => {}
                    _ => text.push_str(&symbol.text),
                }
                Ok(())
            }

            LexState::Normal => self.feed_normal(symbol),
        }
    }

    fn feed_normal(&mut self, symbol: &Symbol) -> PResult<()> {
        match self.decimal {
            DecimalState::AllowDecimal if symbol.kind == SymbolKind::Period => {
                self.decimal = DecimalState::RequireNumber;
                self.extend_last(symbol);
                return Ok(());
            }
            DecimalState::RequireNumber => {
                if symbol.kind == SymbolKind::NumericFragment {
                    self.decimal = DecimalState::None;
                    self.extend_last(symbol);
                    return Ok(());
                }
                return Err(PseudoError::lex_error(
                    "Expected digits after the decimal point",
                    symbol.span,
                )
                .with_help("write numbers like 1.5, not 1."));
            }
            _ => self.decimal = DecimalState::None,
        }

        let kind = match symbol.kind {
            SymbolKind::Whitespace | SymbolKind::LineContinuation => return Ok(()),

            SymbolKind::CommentSingleLine => {
                self.state = LexState::SingleLineComment;
                return Ok(());
            }
            SymbolKind::CommentMultiLineOpen => {
                self.state = LexState::MultiLineComment { start: symbol.span };
                return Ok(());
            }
            SymbolKind::CommentMultiLineClose => {
                return Err(PseudoError::lex_error(
                    "Cannot close a multi-line comment because none is open",
                    symbol.span,
                ));
            }

            SymbolKind::QuoteDouble | SymbolKind::QuoteSingle => {
                let quote = if symbol.kind == SymbolKind::QuoteDouble { '"' } else { '\'' };
                self.state = LexState::String {
                    quote,
                    start: symbol.span,
                    text: String::new(),
                };
                return Ok(());
            }

            SymbolKind::Escape | SymbolKind::Backslash => {
                return Err(PseudoError::lex_error(
                    "Escape sequences can only be used inside strings",
                    symbol.span,
                ));
            }
            SymbolKind::Unknown => {
                return Err(PseudoError::lex_error(
                    format!("Invalid character \"{}\"", symbol.text),
                    symbol.span,
                ));
            }
            SymbolKind::BangEqual => {
                return Err(PseudoError::lex_error(
                    "Invalid operator \"!=\"",
                    symbol.span,
                )
                .with_help("the not-equal operator is written <>"));
            }

            SymbolKind::NumericFragment => {
                self.decimal = DecimalState::AllowDecimal;
                TokenKind::NumberDecimal
            }
            SymbolKind::Word => keyword_kind(&symbol.text).unwrap_or(TokenKind::Name),

            SymbolKind::Semicolon if self.config.syntax.semicolons_as_newlines => {
                TokenKind::Newline
            }

            SymbolKind::Newline => TokenKind::Newline,
            SymbolKind::BraceOpen => TokenKind::BraceOpen,
            SymbolKind::BraceClose => TokenKind::BraceClose,
            SymbolKind::BracketOpen => TokenKind::BracketOpen,
            SymbolKind::BracketClose => TokenKind::BracketClose,
            SymbolKind::ParenOpen => TokenKind::ParenOpen,
            SymbolKind::ParenClose => TokenKind::ParenClose,
            SymbolKind::Colon => TokenKind::Colon,
            SymbolKind::Semicolon => TokenKind::Semicolon,
            SymbolKind::Comma => TokenKind::Comma,
            SymbolKind::Period => TokenKind::Period,
            SymbolKind::Range => TokenKind::Range,
            SymbolKind::Add => TokenKind::Add,
            SymbolKind::Subtract => TokenKind::Subtract,
            SymbolKind::Multiply => TokenKind::Multiply,
            SymbolKind::Divide => TokenKind::Divide,
            SymbolKind::Caret => TokenKind::Caret,
            SymbolKind::EqualTo => TokenKind::EqualTo,
            SymbolKind::NotEqualTo => TokenKind::NotEqualTo,
            SymbolKind::LessThan => TokenKind::LessThan,
            SymbolKind::GreaterThan => TokenKind::GreaterThan,
            SymbolKind::LessThanEqual => TokenKind::LessThanEqual,
            SymbolKind::GreaterThanEqual => TokenKind::GreaterThanEqual,
            SymbolKind::Assignment => TokenKind::Assignment,
            SymbolKind::Ampersand => TokenKind::Ampersand,
        };

        self.push(kind, &symbol.text, symbol.span);
        Ok(())
    }

    fn close_string(&mut self, close: Span) -> PResult<()> {
        let state = std::mem::replace(&mut self.state, LexState::Normal);
        let LexState::String { quote, start, text } = state else {
            return Ok(());
        };
        let span = start.merge(close);

        let kind = if quote == '\'' {
            check_char_literal(&text, span)?;
            TokenKind::Char
        } else {
            TokenKind::String
        };

        self.tokens.push(Token::new(kind, text, span));
        Ok(())
    }

    fn finish(&mut self) -> PResult<()> {
        match &self.state {
            LexState::String { start, .. } => {
                Err(PseudoError::lex_error("Unterminated string literal", *start))
            }
            LexState::MultiLineComment { start } => {
                Err(PseudoError::lex_error("Unterminated multi-line comment", *start))
            }
            _ if self.decimal == DecimalState::RequireNumber => {
                let span = self.tokens.last().map(|t| t.span).unwrap_or_default();
                Err(PseudoError::lex_error("Expected digits after the decimal point", span))
            }
            _ => Ok(()),
        }
    }

    fn push(&mut self, kind: TokenKind, text: &str, span: Span) {
        self.tokens.push(Token::new(kind, text, span));
    }

    /// Merges a symbol into the previous (number) token.
    fn extend_last(&mut self, symbol: &Symbol) {
        if let Some(last) = self.tokens.last_mut() {
            last.text.push_str(&symbol.text);
            last.span = last.span.merge(symbol.span);
        }
    }
}

fn decode_escape(text: &str) -> char {
    match text {
        "\\\"" => '"',
        "\\'" => '\'',
        "\\\\" => '\\',
        "\\t" => '\t',
        "\\n" => '\n',
        _ => text.chars().last().unwrap_or('\\'),
    }
}

fn is_regional_indicator(ch: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&ch)
}

/// A character literal must hold exactly one grapheme made of exactly one
/// code point, since CHAR values store a single Unicode scalar.
fn check_char_literal(text: &str, span: Span) -> PResult<()> {
    let graphemes = text.graphemes(true).count();
    let scalars: Vec<char> = text.chars().collect();

    if graphemes != 1 {
        let err = PseudoError::lex_error(
            format!(
                "Character literal must contain exactly one character, found {}",
                graphemes
            ),
            span,
        );
        return Err(if graphemes > 1 {
            err.with_help("use double quotes for a STRING literal")
        } else {
            err
        });
    }

    if scalars.len() != 1 {
        if scalars.len() == 2 && scalars.iter().all(|c| is_regional_indicator(*c)) {
            return Err(PseudoError::lex_error(
                "Flag emoji cannot be stored in a character literal",
                span,
            )
            .with_detail("a flag is displayed as one symbol but is made of two regional indicator characters")
            .with_help("use double quotes for a STRING literal"));
        }
        return Err(PseudoError::lex_error(
            "Character literal is made of more than one code point",
            span,
        )
        .with_help("use double quotes for a STRING literal"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::symbol::symbolize;

    fn lex(source: &str) -> PResult<Vec<Token>> {
        tokenize(&symbolize(source), &Config::default())
    }

    #[test]
    fn decimal_fragments_merge() {
        let tokens = lex("x <- 12.75").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::NumberDecimal);
        assert_eq!(tokens[2].text, "12.75");
        assert_eq!(tokens[2].span, Span::new(5, 10));
    }

    #[test]
    fn dangling_decimal_point_fails() {
        assert!(lex("x <- 12. + 3").is_err());
        assert!(lex("x <- 12.").is_err());
    }

    #[test]
    fn string_escapes_decode() {
        let tokens = lex(r#"OUTPUT "a\"b\tc""#).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text, "a\"b\tc");
    }

    #[test]
    fn comments_are_dropped_but_newline_kept() {
        let tokens = lex("a // note\nb /* x\ny */ c").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Name, TokenKind::Newline, TokenKind::Name, TokenKind::Name]
        );
    }

    #[test]
    fn bang_equal_points_at_not_equal() {
        let err = lex("IF a != b THEN").unwrap_err();
        assert_eq!(err.code, "E_LEX");
        assert!(err.message.contains("!="));
        assert!(err.help.as_deref().unwrap_or_default().contains("<>"));
        assert_eq!(err.span, Some(Span::new(5, 7)));
    }

    #[test]
    fn char_literal_holds_one_character() {
        let err = lex("c <- 'ab'").unwrap_err();
        assert!(err.message.contains("found 2"));
        assert!(err.help.is_some());

        assert!(lex("c <- ''").is_err());
        assert_eq!(lex("c <- 'é'").unwrap()[2].kind, TokenKind::Char);
    }

    #[test]
    fn flag_emoji_is_not_a_char() {
        let err = lex("c <- '\u{1F1EC}\u{1F1E7}'").unwrap_err();
        assert!(err.message.contains("Flag emoji"));
        assert_eq!(err.details.len(), 1);
    }

    #[test]
    fn escapes_outside_strings_fail() {
        let err = lex(r"x <- \t").unwrap_err();
        assert!(err.message.contains("inside strings"));
    }

    #[test]
    fn stray_comment_close_fails() {
        let err = lex("a */ b").unwrap_err();
        assert!(err.message.contains("none is open"));
        assert_eq!(err.span, Some(Span::new(2, 4)));
    }
}
