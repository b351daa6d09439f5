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

use crate::error::{PResult, PseudoError};
use crate::lexer::token::{Token, TokenKind};
use crate::types::TypeArena;
use crate::value::{TypedValue, Value};

/// Converts a literal token into a value.
///
/// # Returns
/// - `Ok(value)` for number, string, char and boolean literals
/// - `Err` for integer literals that do not fit in an INTEGER, and for
///   tokens that are not literals
pub fn literal_value(token: &Token) -> PResult<TypedValue> {
    match token.kind {
        TokenKind::NumberDecimal if token.text.contains('.') => token
            .text
            .parse::<f64>()
            .map(TypedValue::real)
            .map_err(|_| PseudoError::runtime_error(format!("Invalid number {}", token.text), Some(token.span))),

        TokenKind::NumberDecimal => token.text.parse::<i64>().map(TypedValue::integer).map_err(|_| {
            PseudoError::runtime_error(
                format!("The number {} is too large for an INTEGER", token.text),
                Some(token.span),
            )
            .with_help("write it with a decimal point to use a REAL")
        }),

        TokenKind::String => Ok(TypedValue::string(token.text.clone())),

        TokenKind::Char => token
            .text
            .chars()
            .next()
            .map(|c| TypedValue::new(TypeArena::CHAR, Value::Char(c)))
            .ok_or_else(|| PseudoError::runtime_error("Empty character literal", Some(token.span))),

        TokenKind::BooleanTrue => Ok(TypedValue::boolean(true)),
        TokenKind::BooleanFalse => Ok(TypedValue::boolean(false)),

        _ => Err(PseudoError::runtime_error(
            format!("Expected a literal, found {}", token.kind.describe()),
            Some(token.span),
        )),
    }
}

/// Extracts a BOOLEAN or fails with a type error naming `what`.
pub fn expect_boolean(tv: &TypedValue, what: &str, types: &TypeArena) -> PResult<bool> {
    match tv.value {
        Value::Boolean(b) => Ok(b),
        _ => Err(PseudoError::type_error(
            format!("{} must be a BOOLEAN, found {}", what, types.name(tv.ty)),
            None,
        )),
    }
}

/// Extracts an INTEGER (or integer range value) or fails with a type
/// error naming `what`.
pub fn expect_integer(tv: &TypedValue, what: &str, types: &TypeArena) -> PResult<i64> {
    match tv.value {
        Value::Integer(n) => Ok(n),
        _ => Err(PseudoError::type_error(
            format!("{} must be an INTEGER, found {}", what, types.name(tv.ty)),
            None,
        )),
    }
}

/// Extracts text from a STRING or CHAR.
pub fn expect_string(tv: &TypedValue, what: &str, types: &TypeArena) -> PResult<String> {
    match &tv.value {
        Value::String(s) => Ok(s.clone()),
        Value::Char(c) => Ok(c.to_string()),
        _ => Err(PseudoError::type_error(
            format!("{} must be a STRING, found {}", what, types.name(tv.ty)),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn number_literals() {
        let int = Token::new(TokenKind::NumberDecimal, "-12", Span::default());
        let real = Token::new(TokenKind::NumberDecimal, "1.5", Span::default());
        let huge = Token::new(TokenKind::NumberDecimal, "99999999999999999999", Span::default());

        assert!(matches!(literal_value(&int).map(|tv| tv.value), Ok(Value::Integer(-12))));
        assert_eq!(literal_value(&real).map(|tv| tv.ty).ok(), Some(TypeArena::REAL));
        assert!(literal_value(&huge).is_err());
    }
}
