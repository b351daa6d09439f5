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

//! Statement matcher entry point.
//!
//! Defines the `Parser` (the statement grammar plus the configuration it
//! was built with) and the public `parse()` driver. Matching one logical
//! line lives here; block assembly lives in `blocks.rs`.

use crate::ast::expr::ExprNode;
use crate::ast::stmt::{Program, Statement, StatementType};
use crate::config::Config;
use crate::error::{PResult, PseudoError};
use crate::lexer::token::{tokens_text, Token, TokenKind};
use crate::parser::expressions::parse_expression;
use crate::parser::grammar::{Grammar, GrammarEntry};
use crate::parser::helpers::suggest_keyword;
use crate::parser::lines::{split_lines, Line};
use crate::parser::matcher::{check, MatchFailure};
use crate::span::Span;

/// The statement parser.
///
/// Holds the grammar registry (built once in [`Parser::new`]) and borrows
/// the configuration for the lifetime of the parse.
pub struct Parser<'c> {
    pub(crate) config: &'c Config,
    pub(crate) grammar: Grammar,
    keywords: Vec<(&'static str, TokenKind)>,
}

/// Public entry point for the parsing phase.
///
/// # Pipeline
/// ```text
/// Source → Scanner → Tokenizer → Tokens → Parser → Program → Runtime
/// ```
pub fn parse(tokens: &[Token], config: &Config) -> PResult<Program> {
    Parser::new(config)?.parse(tokens)
}

/// Where a line sits in the block structure.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LineContext {
    /// No block is open.
    pub top_level: bool,

    /// Header type of the innermost open block.
    pub header: Option<StatementType>,

    /// The innermost block's whitelist of direct children.
    pub allow_only: Option<&'static [StatementType]>,

    /// The statement type that closes the innermost block.
    pub end_type: Option<StatementType>,
}

impl<'c> Parser<'c> {
    /// Builds the statement grammar.
    ///
    /// # Errors
    /// Fails only if a grammar entry is malformed.
    pub fn new(config: &'c Config) -> PResult<Self> {
        let grammar = Grammar::standard()?;
        let keywords = grammar.statement_keywords();
        Ok(Self {
            config,
            grammar,
            keywords,
        })
    }

    /// Parses a full token stream into a program tree.
    pub fn parse(&self, tokens: &[Token]) -> PResult<Program> {
        let lines = split_lines(tokens, self.config)?;
        let program = self.assemble(lines)?;
        tracing::debug!(statements = program.statement_count(), "parsed program");
        Ok(program)
    }

    /// Matches one logical line, choosing the first candidate grammar that
    /// both matches and materializes.
    pub(crate) fn parse_line(&self, line: &Line, context: LineContext) -> PResult<Statement> {
        match self.match_line(&line.tokens, line, context) {
            Ok(statement) => Ok(statement),
            Err(failure) => Err(self.explain(line, context, failure)),
        }
    }

    fn candidates(&self, first: &Token) -> &[usize] {
        let by_first = self.grammar.starting_with(first.kind);
        if by_first.is_empty() {
            self.grammar.irregular()
        } else {
            by_first
        }
    }

    fn match_line(&self, tokens: &[Token], line: &Line, context: LineContext) -> Result<Statement, Option<MatchFailure>> {
        let Some(first) = tokens.first() else {
            return Err(None);
        };
        let span = crate::parser::helpers::span_of(tokens);

        let mut best: Option<MatchFailure> = None;
        let mut consider = |failure: MatchFailure| {
            if best.as_ref().map_or(true, |b| failure.priority > b.priority) {
                best = Some(failure);
            }
        };

        for &index in self.candidates(first) {
            let entry = self.grammar.entry(index);
            let full = entry.pattern.len() * 2;

            let captures = match check(&entry.pattern, tokens, span) {
                Ok(captures) => captures,
                Err(failure) => {
                    consider(failure);
                    continue;
                }
            };

            if let Err(error) = context_allows(entry, context, span) {
                consider(MatchFailure {
                    priority: full + 2,
                    error: error.with_general_span(line.span),
                });
                continue;
            }

            match (entry.build)(&captures) {
                Ok(node) => {
                    return Ok(Statement::new(entry.statement_type, entry.category, node, span));
                }
                Err(error) if error.is_fatal() => {
                    return Err(Some(MatchFailure {
                        priority: usize::MAX,
                        error,
                    }))
                }
                Err(error) => consider(MatchFailure {
                    priority: full + 1,
                    error,
                }),
            }
        }

        Err(best)
    }

    /// Turns a failed match into the most helpful diagnostic available.
    fn explain(&self, line: &Line, context: LineContext, failure: Option<MatchFailure>) -> PseudoError {
        let first = &line.tokens[0];
        let priority = failure.as_ref().map_or(0, |f| f.priority);

        // Only fall back to guesses when no grammar got past its first
        // couple of matchers.
        if priority <= 3 {
            if first.kind == TokenKind::Name {
                if let Some((keyword, _)) = suggest_keyword(&first.text, &self.keywords) {
                    let help = if keyword.eq_ignore_ascii_case(&first.text) {
                        format!("keywords are case-sensitive: write \"{}\"", keyword)
                    } else {
                        format!("did you mean \"{}\"?", keyword)
                    };
                    return PseudoError::parse_error(
                        format!("Unknown statement starting with \"{}\"", first.text),
                        first.span,
                    )
                    .with_general_span(line.span)
                    .with_help(help);
                }
            }

            if let Ok(expr) = parse_expression(&line.tokens) {
                let err = PseudoError::parse_error("Expected a statement, found an expression", line.span);
                return match expr {
                    ExprNode::FunctionCall { .. } => err.with_help(format!(
                        "to call a procedure, write CALL {}",
                        tokens_text(&line.tokens)
                    )),
                    _ => err.with_help("an expression must be used in a statement, such as OUTPUT or an assignment"),
                };
            }

            if let Some(err) = self.probe_suffix(line, context) {
                return err;
            }
        }

        match failure {
            Some(failure) => failure.error.with_general_span(line.span),
            None => PseudoError::parse_error(
                format!("Unknown statement starting with {}", first.kind.describe()),
                first.span,
            )
            .with_general_span(line.span),
        }
    }

    /// Checks whether dropping some leading tokens leaves a valid statement,
    /// so the diagnostic can point at the stray prefix.
    fn probe_suffix(&self, line: &Line, context: LineContext) -> Option<PseudoError> {
        for start in 1..line.tokens.len() {
            let rest = &line.tokens[start..];
            if self.match_line(rest, line, context).is_ok() {
                let prefix = &line.tokens[..start];
                let span = crate::parser::helpers::span_of(prefix);
                return Some(
                    PseudoError::parse_error(
                        format!("Unexpected \"{}\" at the start of the statement", tokens_text(prefix)),
                        span,
                    )
                    .with_general_span(line.span)
                    .with_help(format!("remove \"{}\"", tokens_text(prefix))),
                );
            }
        }
        None
    }
}

/// Checks block-context legality of a grammar entry.
fn context_allows(entry: &GrammarEntry, context: LineContext, span: Span) -> PResult<()> {
    let name = entry.statement_type.display_name();

    if entry.top_level_only && !context.top_level {
        return Err(PseudoError::parse_error(
            format!("{} is only allowed at the top level of the program", name),
            span,
        ));
    }

    if let Some(inside) = entry.inside {
        let ok = context.header.map_or(false, |header| inside.contains(&header));
        if !ok {
            return Err(PseudoError::parse_error(
                format!(
                    "{} is only allowed directly inside {}",
                    name,
                    inside[0].display_name()
                ),
                span,
            ));
        }
    }

    if let (Some(allowed), Some(header)) = (context.allow_only, context.header) {
        let is_end = context.end_type == Some(entry.statement_type);
        if !is_end && !allowed.contains(&entry.statement_type) {
            return Err(PseudoError::parse_error(
                format!("{} is not allowed inside {}", name, header.display_name()),
                span,
            ));
        }
    }

    Ok(())
}
