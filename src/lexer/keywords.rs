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

use crate::lexer::token::TokenKind;

/// The fixed keyword table.
///
/// Lookup is exact and case-sensitive: `OUTPUT` is a keyword, `Output` is a
/// name. Fuzzy matching for diagnostics lives in the parser.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("DECLARE", TokenKind::Declare),
    ("DEFINE", TokenKind::Define),
    ("CONSTANT", TokenKind::Constant),
    ("TYPE", TokenKind::Type),
    ("ENDTYPE", TokenKind::EndType),
    ("OUTPUT", TokenKind::Output),
    ("INPUT", TokenKind::Input),
    ("CALL", TokenKind::Call),
    ("RETURN", TokenKind::Return),
    ("IF", TokenKind::If),
    ("THEN", TokenKind::Then),
    ("ELSE", TokenKind::Else),
    ("ENDIF", TokenKind::EndIf),
    ("CASE", TokenKind::Case),
    ("OF", TokenKind::Of),
    ("OTHERWISE", TokenKind::Otherwise),
    ("ENDCASE", TokenKind::EndCase),
    ("FOR", TokenKind::For),
    ("TO", TokenKind::To),
    ("STEP", TokenKind::Step),
    ("NEXT", TokenKind::Next),
    ("WHILE", TokenKind::While),
    ("DO", TokenKind::Do),
    ("ENDWHILE", TokenKind::EndWhile),
    ("REPEAT", TokenKind::Repeat),
    ("UNTIL", TokenKind::Until),
    ("FUNCTION", TokenKind::Function),
    ("PROCEDURE", TokenKind::Procedure),
    ("RETURNS", TokenKind::Returns),
    ("ENDFUNCTION", TokenKind::EndFunction),
    ("ENDPROCEDURE", TokenKind::EndProcedure),
    ("BYREF", TokenKind::ByRef),
    ("BYVAL", TokenKind::ByVal),
    ("OPENFILE", TokenKind::OpenFile),
    ("READFILE", TokenKind::ReadFile),
    ("WRITEFILE", TokenKind::WriteFile),
    ("CLOSEFILE", TokenKind::CloseFile),
    ("SEEK", TokenKind::Seek),
    ("GETRECORD", TokenKind::GetRecord),
    ("PUTRECORD", TokenKind::PutRecord),
    ("READ", TokenKind::Read),
    ("WRITE", TokenKind::Write),
    ("APPEND", TokenKind::Append),
    ("RANDOM", TokenKind::Random),
    ("CLASS", TokenKind::Class),
    ("INHERITS", TokenKind::Inherits),
    ("ENDCLASS", TokenKind::EndClass),
    ("PUBLIC", TokenKind::Public),
    ("PRIVATE", TokenKind::Private),
    ("NEW", TokenKind::New),
    ("SUPER", TokenKind::Super),
    ("ARRAY", TokenKind::Array),
    ("SET", TokenKind::Set),
    ("AND", TokenKind::And),
    ("OR", TokenKind::Or),
    ("NOT", TokenKind::Not),
    ("DIV", TokenKind::Div),
    ("MOD", TokenKind::Mod),
    ("TRUE", TokenKind::BooleanTrue),
    ("FALSE", TokenKind::BooleanFalse),
];

/// Spellings of symbol kinds, for diagnostics.
const SYMBOL_SPELLINGS: &[(&str, TokenKind)] = &[
    ("+", TokenKind::Add),
    ("-", TokenKind::Subtract),
    ("*", TokenKind::Multiply),
    ("/", TokenKind::Divide),
    ("^", TokenKind::Caret),
    ("=", TokenKind::EqualTo),
    ("<>", TokenKind::NotEqualTo),
    ("<", TokenKind::LessThan),
    (">", TokenKind::GreaterThan),
    ("<=", TokenKind::LessThanEqual),
    (">=", TokenKind::GreaterThanEqual),
    ("<-", TokenKind::Assignment),
    ("&", TokenKind::Ampersand),
    ("(", TokenKind::ParenOpen),
    (")", TokenKind::ParenClose),
    ("[", TokenKind::BracketOpen),
    ("]", TokenKind::BracketClose),
    ("{", TokenKind::BraceOpen),
    ("}", TokenKind::BraceClose),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (".", TokenKind::Period),
    ("..", TokenKind::Range),
];

/// Resolves a word to its keyword kind.
///
/// # Returns
/// - `Some(kind)` if the word is a keyword (or TRUE/FALSE)
/// - `None` if the word should be treated as a name
pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(text, _)| *text == word)
        .map(|(_, kind)| *kind)
}

/// The source spelling of a keyword or symbol kind.
pub fn spelling(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .chain(SYMBOL_SPELLINGS.iter())
        .find(|(_, k)| *k == kind)
        .map(|(text, _)| *text)
}
