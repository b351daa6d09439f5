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

//! Matches one logical line against one statement pattern.
//!
//! Single-token matchers consume exactly one token (two for a folded
//! negative literal). A variadic matcher consumes tokens up to the first
//! top-level occurrence of whatever the following matcher accepts, or up to
//! the end of the line when it is the last matcher. A variadic capture must
//! not end inside an open `(` or `[`.

use crate::error::PseudoError;
use crate::lexer::token::{Token, TokenKind};
use crate::parser::grammar::Matcher;
use crate::parser::helpers::{nesting_delta, span_of};
use crate::span::Span;

/// The tokens captured by each matcher of a pattern, in pattern order.
#[derive(Debug, Clone, PartialEq)]
pub struct Captures {
    items: Vec<Vec<Token>>,
    pub span: Span,
}

impl Captures {
    /// The single token captured at pattern position `index`.
    pub fn token(&self, index: usize) -> &Token {
        &self.items[index][0]
    }

    /// All tokens captured at pattern position `index`.
    pub fn tokens(&self, index: usize) -> &[Token] {
        &self.items[index]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A failed match, ranked by how far through the pattern it got.
#[derive(Debug, Clone)]
pub struct MatchFailure {
    pub priority: usize,
    pub error: PseudoError,
}

impl MatchFailure {
    fn new(priority: usize, message: impl Into<String>, span: Span) -> Self {
        Self {
            priority,
            error: PseudoError::parse_error(message, span),
        }
    }
}

/// Checks a line against a pattern.
///
/// # Returns
/// - `Ok(captures)` with one capture per matcher
/// - `Err(failure)` describing the first mismatch
pub fn check(pattern: &[Matcher], tokens: &[Token], line_span: Span) -> Result<Captures, MatchFailure> {
    let mut items = Vec::with_capacity(pattern.len());
    let mut pos = 0;
    let end_span = Span::new(line_span.end, line_span.end);

    for (index, matcher) in pattern.iter().enumerate() {
        // Each matcher reached counts double; a variadic that found its
        // anchor but was malformed counts one more.
        let priority = index * 2;

        if matcher.is_variadic() {
            let end = match pattern.get(index + 1) {
                Some(next) => find_anchor(tokens, pos, matcher.min_len(), next).map_err(|(span, message)| {
                    MatchFailure::new(priority + 1, message, span)
                })?,
                None => {
                    check_balanced(&tokens[pos..]).map_err(|(span, message)| {
                        MatchFailure::new(priority + 1, message, span)
                    })?;
                    tokens.len()
                }
            };

            if end - pos < matcher.min_len() {
                let span = tokens.get(pos).map(|t| t.span).unwrap_or(end_span);
                return Err(MatchFailure::new(
                    priority,
                    format!("Expected {}", matcher.describe()),
                    span,
                ));
            }

            items.push(tokens[pos..end].to_vec());
            pos = end;
            continue;
        }

        match match_single(matcher, tokens, pos) {
            Some(captured) => {
                pos += captured.1;
                items.push(vec![captured.0]);
            }
            None => {
                let (message, span) = match tokens.get(pos) {
                    Some(found) => (
                        format!("Expected {}, found {}", matcher.describe(), found.kind.describe()),
                        found.span,
                    ),
                    None => (
                        format!("Expected {} at the end of the line", matcher.describe()),
                        end_span,
                    ),
                };
                return Err(MatchFailure::new(priority, message, span));
            }
        }
    }

    if pos < tokens.len() {
        let rest = &tokens[pos..];
        return Err(MatchFailure::new(
            pattern.len() * 2,
            format!("Unexpected {} after the end of the statement", rest[0].kind.describe()),
            span_of(rest),
        ));
    }

    Ok(Captures {
        items,
        span: line_span,
    })
}

/// Tries a single-token matcher at `pos`, returning the captured token and
/// how many input tokens it consumed.
fn match_single(matcher: &Matcher, tokens: &[Token], pos: usize) -> Option<(Token, usize)> {
    let token = tokens.get(pos)?;

    let accepted = match matcher {
        Matcher::Kind(kind) => token.kind == *kind,
        Matcher::Any => true,
        Matcher::FileMode => token.kind.is_file_mode(),
        Matcher::AccessModifier => token.kind.is_access_modifier(),
        Matcher::OneOf(kinds) => kinds.contains(&token.kind),
        Matcher::Literal => {
            if token.kind == TokenKind::Subtract {
                let number = tokens.get(pos + 1)?;
                if number.kind != TokenKind::NumberDecimal {
                    return None;
                }
                let folded = Token::new(
                    TokenKind::NumberDecimal,
                    format!("-{}", number.text),
                    token.span.merge(number.span),
                );
                return Some((folded, 2));
            }
            token.kind.is_literal()
        }
        Matcher::ZeroOrMore | Matcher::OneOrMore | Matcher::Expression | Matcher::TypeSyntax => false,
    };

    accepted.then(|| (token.clone(), 1))
}

/// Finds where a variadic capture starting at `start` ends: the first
/// top-level token, at least `min` tokens in, that `next` accepts.
fn find_anchor(tokens: &[Token], start: usize, min: usize, next: &Matcher) -> Result<usize, (Span, String)> {
    let mut depth = 0i32;

    for index in start..tokens.len() {
        if depth == 0 && index >= start + min && match_single(next, tokens, index).is_some() {
            return Ok(index);
        }
        depth += nesting_delta(tokens[index].kind);
        if depth < 0 {
            return Err((tokens[index].span, format!("Unexpected {}", tokens[index].kind.describe())));
        }
    }

    if depth > 0 {
        let span = span_of(&tokens[start..]);
        return Err((span, "Unclosed bracket".to_string()));
    }

    let span = tokens
        .last()
        .map(|t| Span::new(t.span.end, t.span.end))
        .unwrap_or_default();
    Err((span, format!("Expected {}", next.describe())))
}

fn check_balanced(tokens: &[Token]) -> Result<(), (Span, String)> {
    let mut depth = 0i32;
    for token in tokens {
        depth += nesting_delta(token.kind);
        if depth < 0 {
            return Err((token.span, format!("Unexpected {}", token.kind.describe())));
        }
    }
    if depth > 0 {
        return Err((span_of(tokens), "Unclosed bracket".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lexer::lex;
    use crate::lexer::token::tokens_text;

    fn run(pattern: &[Matcher], source: &str) -> Result<Captures, MatchFailure> {
        let tokens = lex(source, &Config::default()).unwrap();
        let span = crate::lexer::token::tokens_span(&tokens).unwrap_or_default();
        check(pattern, &tokens, span)
    }

    #[test]
    fn variadic_stops_at_top_level_anchor() {
        let pattern = [
            Matcher::Kind(TokenKind::Declare),
            Matcher::OneOrMore,
            Matcher::Kind(TokenKind::Colon),
            Matcher::TypeSyntax,
        ];
        let captures = run(&pattern, "DECLARE grid : ARRAY[1:3, 1:3] OF CHAR").unwrap();
        assert_eq!(tokens_text(captures.tokens(1)), "grid");
        assert_eq!(captures.tokens(3).len(), 13);
    }

    #[test]
    fn literal_folds_negative_numbers() {
        let pattern = [
            Matcher::Kind(TokenKind::Constant),
            Matcher::Kind(TokenKind::Name),
            Matcher::Kind(TokenKind::EqualTo),
            Matcher::Literal,
        ];
        let captures = run(&pattern, "CONSTANT Low = -40").unwrap();
        assert_eq!(captures.token(3).text, "-40");
    }

    #[test]
    fn failures_rank_by_progress() {
        let pattern = [
            Matcher::Kind(TokenKind::If),
            Matcher::Expression,
            Matcher::Kind(TokenKind::Then),
        ];
        let early = run(&pattern, "WHILE x").unwrap_err();
        let late = run(&pattern, "IF x > 1").unwrap_err();
        assert!(late.priority > early.priority);
    }

    #[test]
    fn unbalanced_capture_fails() {
        let pattern = [Matcher::Kind(TokenKind::Output), Matcher::Expression];
        assert!(run(&pattern, "OUTPUT f(1").is_err());
        assert!(run(&pattern, "OUTPUT f(1))").is_err());
    }
}
