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

//! Splits the token stream into logical lines.
//!
//! Physical lines are separated by newline tokens. On top of that:
//! - a line starting with THEN is joined onto the preceding IF line
//! - tokens after THEN or a leading ELSE start a new line
//! - a CASE branch label (`value :` or `low TO high :`) followed by more
//!   tokens is split after the colon
//! - OTHERWISE (with its optional colon) followed by more tokens is split

use crate::config::Config;
use crate::error::{PResult, PseudoError};
use crate::lexer::token::{tokens_span, Token, TokenKind};
use crate::parser::helpers::find_top_level;
use crate::span::Span;

/// One logical line: the unit the statement matcher works on.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub tokens: Vec<Token>,
    pub span: Span,
}

impl Line {
    fn new(tokens: Vec<Token>) -> Option<Self> {
        let span = tokens_span(&tokens)?;
        Some(Self { tokens, span })
    }

    fn first_kind(&self) -> TokenKind {
        self.tokens[0].kind
    }
}

/// Splits tokens into logical lines, dropping empty ones.
///
/// # Errors
/// A `;` that is not treated as a line break is rejected here, with a hint
/// naming the option that changes that.
pub fn split_lines(tokens: &[Token], config: &Config) -> PResult<Vec<Line>> {
    if !config.syntax.semicolons_as_newlines {
        if let Some(semicolon) = tokens.iter().find(|t| t.kind == TokenKind::Semicolon) {
            return Err(PseudoError::parse_error("Unexpected \";\"", semicolon.span)
                .with_help("statements are separated by line breaks; set syntax.semicolons_as_newlines to allow \";\""));
        }
    }

    let mut physical: Vec<Line> = Vec::new();
    for chunk in tokens.split(|t| t.kind == TokenKind::Newline) {
        let Some(line) = Line::new(chunk.to_vec()) else {
            continue;
        };

        // IF cond
        // THEN
        if line.first_kind() == TokenKind::Then {
            if let Some(previous) = physical.last_mut() {
                if previous.first_kind() == TokenKind::If
                    && !previous.tokens.iter().any(|t| t.kind == TokenKind::Then)
                {
                    previous.span = previous.span.merge(line.span);
                    previous.tokens.extend(line.tokens);
                    continue;
                }
            }
        }

        physical.push(line);
    }

    let mut lines = Vec::with_capacity(physical.len());
    for line in physical {
        split_line(line.tokens, &mut lines);
    }

    tracing::trace!(count = lines.len(), "split logical lines");
    Ok(lines)
}

/// Applies the in-line split rules repeatedly.
fn split_line(mut tokens: Vec<Token>, out: &mut Vec<Line>) {
    loop {
        let Some(at) = split_point(&tokens) else {
            out.extend(Line::new(tokens));
            return;
        };
        let rest = tokens.split_off(at);
        out.extend(Line::new(tokens));
        tokens = rest;
    }
}

/// Index at which the line should be cut, if any.
fn split_point(tokens: &[Token]) -> Option<usize> {
    let first = tokens.first()?.kind;

    let cut = match first {
        TokenKind::If => tokens.iter().position(|t| t.kind == TokenKind::Then)? + 1,

        TokenKind::Else => 1,

        TokenKind::Otherwise => match tokens.get(1) {
            Some(colon) if colon.kind == TokenKind::Colon => 2,
            _ => 1,
        },

        // Branch labels only start with a value, never with a keyword.
        kind if !kind.is_keyword() => find_top_level(tokens, TokenKind::Colon)? + 1,

        _ => return None,
    };

    (cut < tokens.len()).then_some(cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::lexer::token::tokens_text;

    fn lines(source: &str) -> Vec<String> {
        let config = Config::default();
        let tokens = lex(source, &config).unwrap();
        split_lines(&tokens, &config)
            .unwrap()
            .iter()
            .map(|line| tokens_text(&line.tokens))
            .collect()
    }

    #[test]
    fn then_joins_if_line() {
        assert_eq!(lines("IF x > 1\n  THEN\nOUTPUT x\nENDIF"), vec![
            "IF x > 1 THEN",
            "OUTPUT x",
            "ENDIF"
        ]);
    }

    #[test]
    fn inline_then_and_else_are_split() {
        assert_eq!(lines("IF a THEN OUTPUT 1\nELSE OUTPUT 2\nENDIF"), vec![
            "IF a THEN",
            "OUTPUT 1",
            "ELSE",
            "OUTPUT 2",
            "ENDIF"
        ]);
    }

    #[test]
    fn case_branches_are_split() {
        assert_eq!(
            lines("CASE OF x\n1 : OUTPUT \"one\"\n2 TO 5: OUTPUT \"few\"\nOTHERWISE : OUTPUT \"many\"\nENDCASE"),
            vec![
                "CASE OF x",
                "1 :",
                "OUTPUT \"one\"",
                "2 TO 5 :",
                "OUTPUT \"few\"",
                "OTHERWISE :",
                "OUTPUT \"many\"",
                "ENDCASE"
            ]
        );
    }

    #[test]
    fn declarations_keep_their_colon() {
        assert_eq!(lines("DECLARE x : INTEGER"), vec!["DECLARE x : INTEGER"]);
    }

    #[test]
    fn semicolons_need_the_option() {
        let mut config = Config::default();
        let tokens = lex("x <- 1; y <- 2", &config).unwrap();
        assert!(split_lines(&tokens, &config).is_err());

        config.syntax.semicolons_as_newlines = true;
        let tokens = lex("x <- 1; y <- 2", &config).unwrap();
        assert_eq!(split_lines(&tokens, &config).unwrap().len(), 2);
    }
}
