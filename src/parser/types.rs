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

//! Type syntax.
//!
//! ```text
//! INTEGER | Name                       named type
//! ARRAY[1:10, 0:n] OF element          sized array (bounds are expressions)
//! ARRAY OF element                     unsized array (parameters only)
//! -3..7                                integer range
//! ```

use crate::ast::expr::ExprNode;
use crate::error::{PResult, PseudoError};
use crate::lexer::token::{Token, TokenKind};
use crate::parser::expressions::parse_expression;
use crate::parser::helpers::{find_top_level, matching_close, span_of, split_top_level};

/// Parses a type annotation into a type node.
pub fn parse_type(tokens: &[Token]) -> PResult<ExprNode> {
    let span = span_of(tokens);

    match tokens {
        [] => Err(PseudoError::parse_error("Expected a type", span)),

        [name] if name.kind == TokenKind::Name => Ok(ExprNode::Leaf(name.clone())),

        [first, ..] if first.kind == TokenKind::Array => parse_array_type(tokens),

        _ if find_top_level(tokens, TokenKind::Range).is_some() => parse_range_type(tokens),

        [single] => Err(PseudoError::parse_error(
            format!("Expected a type name, found {}", single.kind.describe()),
            span,
        )),

        _ => Err(PseudoError::parse_error("Invalid type", span)
            .with_help("types are written as a name, ARRAY[low:high] OF type, or low..high")),
    }
}

fn parse_array_type(tokens: &[Token]) -> PResult<ExprNode> {
    let span = span_of(tokens);

    // ARRAY OF element
    if tokens.get(1).map(|t| t.kind) == Some(TokenKind::Of) {
        let element = parse_type(&tokens[2..]).map_err(|err| err.or_span(span))?;
        return Ok(ExprNode::ArrayType {
            bounds: None,
            element: Box::new(element),
            span,
        });
    }

    if tokens.get(1).map(|t| t.kind) != Some(TokenKind::BracketOpen) {
        return Err(PseudoError::parse_error(
            "Expected \"[\" or OF after ARRAY",
            span,
        ));
    }

    let close = matching_close(tokens, 1)
        .ok_or_else(|| PseudoError::parse_error("Unclosed \"[\" in array type", tokens[1].span))?;

    if tokens.get(close + 1).map(|t| t.kind) != Some(TokenKind::Of) {
        return Err(PseudoError::parse_error(
            "Expected OF after the array bounds",
            tokens[close].span,
        ));
    }

    let inner = &tokens[2..close];
    if inner.is_empty() {
        return Err(PseudoError::parse_error(
            "Expected at least one dimension",
            span_of(&tokens[1..=close]),
        )
        .with_help("write the bounds as ARRAY[low:high] OF type"));
    }

    let mut bounds = Vec::new();
    for dimension in split_top_level(inner, TokenKind::Comma)? {
        let colon = find_top_level(dimension, TokenKind::Colon).ok_or_else(|| {
            PseudoError::parse_error("Expected low:high bounds", span_of(dimension))
        })?;
        let (low, high) = (&dimension[..colon], &dimension[colon + 1..]);
        if low.is_empty() || high.is_empty() {
            return Err(PseudoError::parse_error(
                "Expected low:high bounds",
                span_of(dimension),
            ));
        }
        bounds.push((parse_expression(low)?, parse_expression(high)?));
    }

    let element_tokens = &tokens[close + 2..];
    if element_tokens.is_empty() {
        return Err(PseudoError::parse_error(
            "Expected an element type after OF",
            tokens[close + 1].span,
        ));
    }
    let element = parse_type(element_tokens)?;

    Ok(ExprNode::ArrayType {
        bounds: Some(bounds),
        element: Box::new(element),
        span,
    })
}

fn parse_range_type(tokens: &[Token]) -> PResult<ExprNode> {
    let span = span_of(tokens);
    let range = find_top_level(tokens, TokenKind::Range).unwrap_or_default();

    let low = parse_bound(&tokens[..range], span)?;
    let high = parse_bound(&tokens[range + 1..], span)?;

    if low > high {
        return Err(PseudoError::parse_error(
            format!("Invalid range {}..{}: the low bound is greater than the high bound", low, high),
            span,
        ));
    }

    Ok(ExprNode::RangeType { low, high, span })
}

/// A range bound is an integer literal with an optional leading minus.
fn parse_bound(tokens: &[Token], span: crate::span::Span) -> PResult<i64> {
    let (negative, digits) = match tokens {
        [number] => (false, number),
        [minus, number] if minus.kind == TokenKind::Subtract => (true, number),
        _ => {
            return Err(PseudoError::parse_error(
                "Range bounds must be integer literals",
                if tokens.is_empty() { span } else { span_of(tokens) },
            ))
        }
    };

    if digits.kind != TokenKind::NumberDecimal || digits.text.contains('.') {
        return Err(PseudoError::parse_error(
            "Range bounds must be integer literals",
            digits.span,
        ));
    }

    let value: i64 = digits.text.parse().map_err(|_| {
        PseudoError::parse_error("Range bound is too large", digits.span)
    })?;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lexer::lex;

    fn parse(source: &str) -> PResult<ExprNode> {
        parse_type(&lex(source, &Config::default()).unwrap())
    }

    #[test]
    fn named_and_array_types() {
        assert!(matches!(parse("INTEGER").unwrap(), ExprNode::Leaf(_)));
        let node = parse("ARRAY[1:10, 0:n - 1] OF REAL").unwrap();
        let ExprNode::ArrayType { bounds: Some(bounds), .. } = node else {
            panic!("expected sized array");
        };
        assert_eq!(bounds.len(), 2);
        assert!(matches!(
            parse("ARRAY OF STRING").unwrap(),
            ExprNode::ArrayType { bounds: None, .. }
        ));
    }

    #[test]
    fn ranges() {
        assert!(matches!(
            parse("-3..7").unwrap(),
            ExprNode::RangeType { low: -3, high: 7, .. }
        ));
        assert!(parse("7..3").is_err());
        assert!(parse("1.5..3").is_err());
    }

    #[test]
    fn malformed_arrays() {
        assert!(parse("ARRAY[] OF INTEGER").is_err());
        assert!(parse("ARRAY[1:10] INTEGER").is_err());
        assert!(parse("ARRAY[1:10] OF").is_err());
        assert!(parse("ARRAY[1] OF INTEGER").is_err());
    }
}
