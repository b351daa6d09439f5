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

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// Represents the **grammar category of a lexical token**.
///
/// Keyword kinds are named after the keyword they stand for; literal kinds
/// describe the value they carry; the rest are operators and punctuation.
///
/// # Pipeline Role
/// ```text
/// Source → Scanner → Symbols → Tokenizer → TokenKind → Statement Matcher
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Literals
    NumberDecimal,
    String,
    Char,
    BooleanTrue,
    BooleanFalse,

    /// A user-defined name (variables, types, functions, classes).
    Name,

    // Declarations
    Declare,
    Define,
    Constant,
    Type,
    EndType,

    // Simple statements
    Output,
    Input,
    Call,
    Return,

    // Control flow
    If,
    Then,
    Else,
    EndIf,
    Case,
    Of,
    Otherwise,
    EndCase,
    For,
    To,
    Step,
    Next,
    While,
    Do,
    EndWhile,
    Repeat,
    Until,

    // Subroutines
    Function,
    Procedure,
    Returns,
    EndFunction,
    EndProcedure,
    ByRef,
    ByVal,

    // Files
    OpenFile,
    ReadFile,
    WriteFile,
    CloseFile,
    Seek,
    GetRecord,
    PutRecord,
    Read,
    Write,
    Append,
    Random,

    // Classes
    Class,
    Inherits,
    EndClass,
    Public,
    Private,
    New,
    Super,

    // Type syntax
    Array,
    Set,

    // Word operators
    And,
    Or,
    Not,
    Div,
    Mod,

    // Symbol operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Caret,
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Assignment,
    Ampersand,

    // Punctuation
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Colon,
    Semicolon,
    Comma,
    Period,
    Range,

    Newline,
}

impl TokenKind {
    /// Literal kinds: values that can appear as a CONSTANT or CASE branch.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::NumberDecimal
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::BooleanTrue
                | TokenKind::BooleanFalse
        )
    }

    pub fn is_file_mode(&self) -> bool {
        matches!(
            self,
            TokenKind::Read | TokenKind::Write | TokenKind::Append | TokenKind::Random
        )
    }

    pub fn is_access_modifier(&self) -> bool {
        matches!(self, TokenKind::Public | TokenKind::Private)
    }

    /// True for every keyword kind (everything spelled with letters that is
    /// not a literal or a name).
    pub fn is_keyword(&self) -> bool {
        crate::lexer::keywords::KEYWORDS
            .iter()
            .any(|(_, kind)| kind == self && !kind.is_literal())
    }

    /// True if a token of this kind can end an operand, so that an operator
    /// following it must be binary (or postfix).
    pub fn ends_operand(&self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Name
                    | TokenKind::Super
                    | TokenKind::ParenClose
                    | TokenKind::BracketClose
                    | TokenKind::Caret
            )
    }

    /// Text used when describing this kind in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::NumberDecimal => "a number".to_string(),
            TokenKind::String => "a string".to_string(),
            TokenKind::Char => "a character".to_string(),
            TokenKind::BooleanTrue => "TRUE".to_string(),
            TokenKind::BooleanFalse => "FALSE".to_string(),
            TokenKind::Name => "a name".to_string(),
            TokenKind::Newline => "a line break".to_string(),
            other => match crate::lexer::keywords::spelling(*other) {
                Some(text) => format!("\"{}\"", text),
                None => format!("{:?}", other),
            },
        }
    }
}

/// Represents a **single lexical token** produced by the tokenizer.
///
/// For string and character literals `text` holds the decoded contents
/// (without quotes, escapes resolved); for everything else it is the exact
/// source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// The classified category of the token.
    pub kind: TokenKind,

    /// The text of the token.
    pub text: String,

    /// The source range the token was produced from.
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Re-emits the token as source text.
    ///
    /// Tokenizing the returned text yields a single token of the same kind.
    pub fn fmt_text(&self) -> String {
        match self.kind {
            TokenKind::String => format!("\"{}\"", escape(&self.text, '"')),
            TokenKind::Char => format!("'{}'", escape(&self.text, '\'')),
            TokenKind::Newline => "\n".to_string(),
            _ => self.text.clone(),
        }
    }
}

fn escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

impl fmt::Display for Token {
    /// Formats a token for **user-facing output**: only the text the user
    /// wrote, never the internal structure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fmt_text())
    }
}

/// Returns the span covering a run of tokens.
pub fn tokens_span(tokens: &[Token]) -> Option<Span> {
    Span::union_all(tokens.iter().map(|t| t.span))
}

/// Joins tokens back into readable source text, used in diagnostics.
pub fn tokens_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::fmt_text)
        .collect::<Vec<_>>()
        .join(" ")
}
