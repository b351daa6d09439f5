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

//! Small token-slice utilities shared by the statement matcher, the
//! expression parser and the type parser.

use crate::error::{PResult, PseudoError};
use crate::lexer::token::{tokens_span, Token, TokenKind};
use crate::span::Span;

/* ============================================================================
 * Nesting
 * ============================================================================
 */

/// +1 for an opening paren/bracket, -1 for a closing one, 0 otherwise.
pub fn nesting_delta(kind: TokenKind) -> i32 {
    match kind {
        TokenKind::ParenOpen | TokenKind::BracketOpen => 1,
        TokenKind::ParenClose | TokenKind::BracketClose => -1,
        _ => 0,
    }
}

/// Finds the index of the group opener matching the closer at `close`.
///
/// # Returns
/// - `Some(index)` of the matching `(` or `[`
/// - `None` if the group is unbalanced
pub fn matching_open(tokens: &[Token], close: usize) -> Option<usize> {
    let mut depth = 0i32;
    for index in (0..=close).rev() {
        depth -= nesting_delta(tokens[index].kind);
        if depth == 0 {
            return Some(index);
        }
        if depth < 0 {
            return None;
        }
    }
    None
}

/// Finds the index of the group closer matching the opener at `open`.
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        depth += nesting_delta(token.kind);
        if depth == 0 {
            return Some(index);
        }
        if depth < 0 {
            return None;
        }
    }
    None
}

/// Index of the first top-level (depth 0) token of the given kind.
pub fn find_top_level(tokens: &[Token], kind: TokenKind) -> Option<usize> {
    let mut depth = 0i32;
    for (index, token) in tokens.iter().enumerate() {
        if depth == 0 && token.kind == kind {
            return Some(index);
        }
        depth += nesting_delta(token.kind);
    }
    None
}

/// Splits a slice on top-level separators.
///
/// An empty slice yields no parts. Any empty part (`a,,b` or a trailing
/// comma) is a parse error.
pub fn split_top_level(tokens: &[Token], separator: TokenKind) -> PResult<Vec<&[Token]>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (index, token) in tokens.iter().enumerate() {
        if depth == 0 && token.kind == separator {
            if index == start {
                return Err(PseudoError::parse_error(
                    format!("Expected a value before {}", separator.describe()),
                    token.span,
                ));
            }
            parts.push(&tokens[start..index]);
            start = index + 1;
        }
        depth += nesting_delta(token.kind);
    }

    if start == tokens.len() {
        let last = &tokens[tokens.len() - 1];
        return Err(PseudoError::parse_error(
            format!("Expected a value after {}", separator.describe()),
            last.span,
        ));
    }
    parts.push(&tokens[start..]);
    Ok(parts)
}

/* ============================================================================
 * Names
 * ============================================================================
 */

/// Parses `a, b, c` into name tokens, rejecting duplicates.
///
/// # Parameters
/// - `tokens`: the comma separated list
/// - `what`: what the names are, for diagnostics ("variable", "enum value")
pub fn parse_name_list(tokens: &[Token], what: &str) -> PResult<Vec<Token>> {
    let mut names: Vec<Token> = Vec::new();

    for part in split_top_level(tokens, TokenKind::Comma)? {
        let [token] = part else {
            return Err(PseudoError::parse_error(
                format!("Expected a {} name", what),
                span_of(part),
            ));
        };
        if token.kind != TokenKind::Name {
            return Err(PseudoError::parse_error(
                format!("Expected a {} name, found {}", what, token.kind.describe()),
                token.span,
            ));
        }
        if names.iter().any(|existing| existing.text == token.text) {
            return Err(PseudoError::parse_error(
                format!("Duplicate {} name \"{}\"", what, token.text),
                token.span,
            ));
        }
        names.push(token.clone());
    }

    Ok(names)
}

/// Span of a non-empty slice, or an empty span.
pub fn span_of(tokens: &[Token]) -> Span {
    tokens_span(tokens).unwrap_or_default()
}

/* ============================================================================
 * Typo Suggestions
 * ============================================================================
 */

/// Levenshtein edit distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Finds the statement keyword a misspelled word most likely meant.
///
/// A case-insensitive exact match wins; otherwise the closest keyword within
/// an edit distance of 2 (1 for short words).
pub fn suggest_keyword(word: &str, keywords: &[(&'static str, TokenKind)]) -> Option<(&'static str, TokenKind)> {
    if let Some(found) = keywords
        .iter()
        .find(|(text, _)| text.eq_ignore_ascii_case(word))
    {
        return Some(*found);
    }

    let limit = if word.chars().count() <= 4 { 1 } else { 2 };
    let upper = word.to_ascii_uppercase();

    keywords
        .iter()
        .map(|entry| (edit_distance(&upper, entry.0), *entry))
        .filter(|(distance, _)| *distance <= limit)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, entry)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lexer::lex;

    fn tokens(source: &str) -> Vec<Token> {
        lex(source, &Config::default()).unwrap()
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("OUTPUT", "OUTPUT"), 0);
        assert_eq!(edit_distance("OUTPTU", "OUTPUT"), 2);
        assert_eq!(edit_distance("", "IF"), 2);
    }

    #[test]
    fn split_respects_nesting() {
        let toks = tokens("f(a, b), c[1, 2], d");
        let parts = split_top_level(&toks, TokenKind::Comma).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 6);
    }

    #[test]
    fn split_rejects_empty_parts() {
        assert!(split_top_level(&tokens("a,,b"), TokenKind::Comma).is_err());
        assert!(split_top_level(&tokens("a,"), TokenKind::Comma).is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = parse_name_list(&tokens("a, b, a"), "variable").unwrap_err();
        assert!(err.message.contains("Duplicate"));
    }

    #[test]
    fn suggestions() {
        let table = crate::lexer::keywords::KEYWORDS;
        assert_eq!(suggest_keyword("output", table).map(|s| s.0), Some("OUTPUT"));
        assert_eq!(suggest_keyword("OUPTUT", table).map(|s| s.0), Some("OUTPUT"));
        assert_eq!(suggest_keyword("banana", table), None);
    }
}
