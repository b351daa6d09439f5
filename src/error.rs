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

use crate::span::Span;

/// Broad classification of a failure, used to pick the stable error code
/// and by hosts that want to treat some failures (limits) differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated strings/comments, invalid characters, bad literals.
    Lex,
    /// No grammar matched a line, unbalanced blocks, bad type syntax.
    Parse,
    /// Unresolvable types, incompatible overrides, failed assignability.
    Type,
    /// Everything that goes wrong while a program executes.
    Runtime,
    /// The statement execution limit was exceeded.
    Limit,
    /// The call depth limit was exceeded.
    StackOverflow,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Lex => "E_LEX",
            ErrorKind::Parse => "E_PARSE",
            ErrorKind::Type => "E_TYPE",
            ErrorKind::Runtime => "E_RUNTIME",
            ErrorKind::Limit => "E_LIMIT",
            ErrorKind::StackOverflow => "E_STACK",
        }
    }
}

/// The single structured error type produced by every stage of the
/// interpreter.
///
/// Errors are never split into one Rust type per stage. Instead the
/// `kind` field classifies them and the remaining fields carry everything a
/// host needs to render a useful diagnostic:
/// - a one-line summary (`message`)
/// - optional elaboration lines (`details`)
/// - an optional suggestion (`help`), sometimes naming a config toggle
/// - a specific range and an optional enclosing range
/// - the chain of "while ..." frames added as the error propagated
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PseudoError {
    pub kind: ErrorKind,

    /// Stable error code (E_LEX, E_PARSE, ...)
    pub code: &'static str,

    /// Human-readable error message
    pub message: String,

    /// Extra explanation lines, printed as notes.
    pub details: Vec<String>,

    /// Optional help / suggestion text
    pub help: Option<String>,

    /// The most specific source range involved.
    pub span: Option<Span>,

    /// A wider range giving context (for example the whole statement).
    pub general_span: Option<Span>,

    /// Context frames, innermost first.
    pub context: Vec<String>,
}

pub type PResult<T> = Result<T, PseudoError>;

impl PseudoError {
    /// Generic constructor
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind,
            code: kind.code(),
            message: message.into(),
            details: Vec::new(),
            help: None,
            span,
            general_span: None,
            context: Vec::new(),
        }
    }

    /// Lexical error (while turning text into tokens)
    pub fn lex_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lex, message, Some(span))
    }

    /// Syntax error (while matching statements or expressions)
    pub fn parse_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Parse, message, Some(span))
    }

    /// Type error (resolution, assignability, overrides)
    pub fn type_error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(ErrorKind::Type, message, span)
    }

    /// Runtime error (during evaluation)
    pub fn runtime_error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(ErrorKind::Runtime, message, span)
    }

    /// Execution limit exceeded; hosts treat this as fatal.
    pub fn limit_error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(ErrorKind::Limit, message, span)
    }

    /// Recursion went deeper than the configured call depth.
    pub fn stack_exhausted(span: Option<Span>) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            "Stack exhausted: too many nested function calls",
            span,
        )
        .with_help("check that every recursive function has a reachable base case")
    }

    /// Attach a help message to the error (builder-style).
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach an elaboration line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// Attach the enclosing range, unless one was already recorded deeper
    /// in the call chain.
    pub fn with_general_span(mut self, span: Span) -> Self {
        if self.general_span.is_none() {
            self.general_span = Some(span);
        }
        self
    }

    /// Fill in the specific range if the error was raised without one.
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Record a "while ..." frame.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Limit and stack errors must never be swallowed by recovery probes.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Limit | ErrorKind::StackOverflow)
    }
}

/// Adds context frames to a `PResult` as it propagates.
pub trait ResultExt<T> {
    fn context_with<F, S>(self, f: F) -> PResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;

    fn general_span(self, span: Span) -> PResult<T>;
}

impl<T> ResultExt<T> for PResult<T> {
    fn context_with<F, S>(self, f: F) -> PResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|err| err.with_context(f()))
    }

    fn general_span(self, span: Span) -> PResult<T> {
        self.map_err(|err| err.with_general_span(span).or_span(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_span_keeps_innermost() {
        let err = PseudoError::runtime_error("boom", Some(Span::new(3, 4)))
            .with_general_span(Span::new(0, 10))
            .with_general_span(Span::new(0, 50));
        assert_eq!(err.general_span, Some(Span::new(0, 10)));
        assert_eq!(err.code, "E_RUNTIME");
    }
}
