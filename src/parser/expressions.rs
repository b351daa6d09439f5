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

//! Expression parser.
//!
//! Operates on an already-delimited token slice (the statement matcher has
//! decided where the expression starts and ends). Operators are tried from
//! the lowest precedence tier to the highest; inside a tier the slice is
//! scanned right-to-left so that binary operators come out left-associative.
//! Only top-level operators count; anything inside `(...)` or `[...]` is
//! skipped.
//!
//! When no operator splits the slice, the special forms are tried in order:
//! ```text
//! NEW Name(args)      class instantiation
//! target(args)        function call
//! (expr)              grouping
//! target[i, j]        array access
//! ```

use crate::ast::expr::{ExprNode, Fixity, Operator};
use crate::error::{PResult, PseudoError};
use crate::lexer::token::{Token, TokenKind};
use crate::parser::helpers::{matching_close, matching_open, nesting_delta, span_of, split_top_level};

/* ============================================================================
 * Operator Table
 * ============================================================================
 */

struct OperatorDef {
    operator: Operator,
    token: TokenKind,
    fixity: Fixity,
}

const fn op(operator: Operator, token: TokenKind, fixity: Fixity) -> OperatorDef {
    OperatorDef {
        operator,
        token,
        fixity,
    }
}

/// Precedence tiers, lowest first.
const TIERS: &[&[OperatorDef]] = &[
    &[op(Operator::Or, TokenKind::Or, Fixity::Binary)],
    &[op(Operator::And, TokenKind::And, Fixity::Binary)],
    &[op(Operator::Not, TokenKind::Not, Fixity::UnaryPrefix)],
    &[
        op(Operator::EqualTo, TokenKind::EqualTo, Fixity::Binary),
        op(Operator::NotEqualTo, TokenKind::NotEqualTo, Fixity::Binary),
    ],
    &[
        op(Operator::LessThan, TokenKind::LessThan, Fixity::Binary),
        op(Operator::LessThanEqual, TokenKind::LessThanEqual, Fixity::Binary),
        op(Operator::GreaterThan, TokenKind::GreaterThan, Fixity::Binary),
        op(Operator::GreaterThanEqual, TokenKind::GreaterThanEqual, Fixity::Binary),
    ],
    &[
        op(Operator::Add, TokenKind::Add, Fixity::Binary),
        op(Operator::Subtract, TokenKind::Subtract, Fixity::BinaryOrUnaryPrefix),
        op(Operator::StringConcatenate, TokenKind::Ampersand, Fixity::Binary),
    ],
    &[
        op(Operator::Multiply, TokenKind::Multiply, Fixity::Binary),
        op(Operator::Divide, TokenKind::Divide, Fixity::Binary),
        op(Operator::IntegerDivide, TokenKind::Div, Fixity::Binary),
        op(Operator::Mod, TokenKind::Mod, Fixity::Binary),
    ],
    &[op(Operator::Negate, TokenKind::Subtract, Fixity::UnaryPrefix)],
    &[op(Operator::PointerReference, TokenKind::Caret, Fixity::UnaryPrefix)],
    &[op(Operator::PointerDereference, TokenKind::Caret, Fixity::UnaryPostfix)],
    &[op(Operator::Access, TokenKind::Period, Fixity::Binary)],
];

/// Deepest expression tree the parser builds. Every operator, grouping,
/// call and index adds a level.
pub const MAX_EXPRESSION_DEPTH: usize = 200;

/* ============================================================================
 * Entry Points
 * ============================================================================
 */

/// Parses a complete expression.
///
/// # Errors
/// Fails for an empty slice, for expressions nested deeper than
/// [`MAX_EXPRESSION_DEPTH`] and for any slice that is not exactly one
/// expression. The error names the most specific problem found while trying
/// the operators and special forms.
pub fn parse_expression(tokens: &[Token]) -> PResult<ExprNode> {
    parse_nested(tokens, 0)
}

/// Parses a comma separated list of expressions (OUTPUT, call arguments).
pub fn parse_expression_list(tokens: &[Token]) -> PResult<Vec<ExprNode>> {
    parse_list(tokens, 0)
}

fn parse_nested(tokens: &[Token], depth: usize) -> PResult<ExprNode> {
    let Some(first) = tokens.first() else {
        return Err(PseudoError::parse_error("Expected an expression", Default::default()));
    };

    if depth > MAX_EXPRESSION_DEPTH {
        return Err(PseudoError::parse_error("Expression is nested too deeply", first.span)
            .with_general_span(span_of(tokens))
            .with_help(format!(
                "split it into smaller expressions; at most {} levels are allowed",
                MAX_EXPRESSION_DEPTH
            )));
    }

    if tokens.len() == 1 {
        return parse_leaf(first);
    }

    let mut deferred: Option<PseudoError> = None;

    for tier in TIERS {
        if let Some(node) = try_tier(tokens, tier, &mut deferred, depth)? {
            return Ok(node);
        }
    }

    if let Some(node) = try_special_forms(tokens, &mut deferred, depth)? {
        return Ok(node);
    }

    let mut err = PseudoError::parse_error("Invalid expression", span_of(tokens));
    if let Some(reason) = deferred {
        err = err.with_detail(reason.message);
        if let Some(help) = reason.help {
            err = err.with_help(help);
        }
    }
    Err(err)
}

fn parse_list(tokens: &[Token], depth: usize) -> PResult<Vec<ExprNode>> {
    split_top_level(tokens, TokenKind::Comma)?
        .into_iter()
        .map(|item| parse_nested(item, depth))
        .collect()
}

fn parse_leaf(token: &Token) -> PResult<ExprNode> {
    if token.kind.is_literal() || matches!(token.kind, TokenKind::Name | TokenKind::Super) {
        return Ok(ExprNode::Leaf(token.clone()));
    }
    Err(PseudoError::parse_error(
        format!("Unexpected {} in expression", token.kind.describe()),
        token.span,
    ))
}

/* ============================================================================
 * Operators
 * ============================================================================
 */

fn try_tier(
    tokens: &[Token],
    tier: &[OperatorDef],
    deferred: &mut Option<PseudoError>,
    depth: usize,
) -> PResult<Option<ExprNode>> {
    let last = tokens.len() - 1;
    let mut nesting = 0i32;

    for index in (0..tokens.len()).rev() {
        let token = &tokens[index];
        nesting -= nesting_delta(token.kind);

        // A closer raises the depth before it is inspected, an opener lowers
        // it after; both are skipped either way.
        if nesting != 0 || nesting_delta(token.kind) != 0 {
            continue;
        }

        let Some(def) = tier.iter().find(|def| def.token == token.kind) else {
            continue;
        };

        match def.fixity {
            Fixity::UnaryPrefix => {
                if index != 0 {
                    continue;
                }
                return parse_prefix(def.operator, tokens, depth).map(Some);
            }

            Fixity::UnaryPostfix => {
                if index != last {
                    continue;
                }
                let operand = parse_nested(&tokens[..last], depth + 1)?;
                return Ok(Some(branch(def.operator, token, vec![operand], tokens)));
            }

            Fixity::Binary | Fixity::BinaryOrUnaryPrefix => {
                if index == 0 || index == last {
                    if def.fixity == Fixity::Binary || index == last {
                        record(
                            deferred,
                            PseudoError::parse_error(
                                format!(
                                    "Operator \"{}\" needs an operand on both sides",
                                    token.text
                                ),
                                token.span,
                            ),
                        );
                    }
                    continue;
                }

                if def.fixity == Fixity::BinaryOrUnaryPrefix
                    && !tokens[index - 1].kind.ends_operand()
                {
                    continue;
                }

                if def.operator == Operator::Access {
                    let right = &tokens[index + 1..];
                    let is_member = matches!(
                        right,
                        [only] if matches!(only.kind, TokenKind::Name | TokenKind::New)
                    );
                    if !is_member {
                        record(
                            deferred,
                            PseudoError::parse_error(
                                "Expected a single member name after \".\"",
                                span_of(right),
                            ),
                        );
                        continue;
                    }
                    let left = parse_nested(&tokens[..index], depth + 1)?;
                    let member = ExprNode::Leaf(right[0].clone());
                    return Ok(Some(branch(def.operator, token, vec![left, member], tokens)));
                }

                let left = parse_nested(&tokens[..index], depth + 1)?;
                let right = parse_nested(&tokens[index + 1..], depth + 1)?;
                return Ok(Some(branch(def.operator, token, vec![left, right], tokens)));
            }
        }
    }

    Ok(None)
}

fn parse_prefix(operator: Operator, tokens: &[Token], depth: usize) -> PResult<ExprNode> {
    let operand_tokens = &tokens[1..];

    // `-5` is a literal, not an expression.
    if operator == Operator::Negate {
        if let [number] = operand_tokens {
            if number.kind == TokenKind::NumberDecimal {
                return Ok(ExprNode::Leaf(Token::new(
                    TokenKind::NumberDecimal,
                    format!("-{}", number.text),
                    tokens[0].span.merge(number.span),
                )));
            }
        }
    }

    let operand = parse_nested(operand_tokens, depth + 1)?;
    Ok(branch(operator, &tokens[0], vec![operand], tokens))
}

fn branch(operator: Operator, token: &Token, operands: Vec<ExprNode>, tokens: &[Token]) -> ExprNode {
    ExprNode::Branch {
        operator,
        operator_token: token.clone(),
        operands,
        span: span_of(tokens),
    }
}

fn record(deferred: &mut Option<PseudoError>, err: PseudoError) {
    if deferred.is_none() {
        *deferred = Some(err);
    }
}

/* ============================================================================
 * Special Forms
 * ============================================================================
 */

fn try_special_forms(
    tokens: &[Token],
    deferred: &mut Option<PseudoError>,
    depth: usize,
) -> PResult<Option<ExprNode>> {
    let last = tokens.len() - 1;
    let span = span_of(tokens);

    // NEW Name(args)
    if tokens[0].kind == TokenKind::New {
        let well_formed = tokens.len() >= 4
            && tokens[1].kind == TokenKind::Name
            && tokens[2].kind == TokenKind::ParenOpen
            && matching_close(tokens, 2) == Some(last);
        if !well_formed {
            record(
                deferred,
                PseudoError::parse_error("Expected NEW ClassName(arguments)", span)
                    .with_help("a class is instantiated with NEW ClassName(...), even without arguments"),
            );
            return Ok(None);
        }
        let args = parse_list(&tokens[3..last], depth + 1)?;
        return Ok(Some(ExprNode::ClassInstantiation {
            class_name: tokens[1].clone(),
            args,
            span,
        }));
    }

    // target(args)
    if tokens[last].kind == TokenKind::ParenClose {
        if let Some(open) = matching_open(tokens, last) {
            if open > 0 {
                match parse_nested(&tokens[..open], depth + 1) {
                    Ok(callee) => {
                        let args = parse_list(&tokens[open + 1..last], depth + 1)?;
                        return Ok(Some(ExprNode::FunctionCall {
                            callee: Box::new(callee),
                            args,
                            span,
                        }));
                    }
                    Err(err) => record(deferred, err),
                }
            } else {
                // (expr)
                let inner = &tokens[1..last];
                if inner.is_empty() {
                    return Err(PseudoError::parse_error("Empty parentheses", span));
                }
                return parse_nested(inner, depth + 1).map(Some);
            }
        } else {
            record(deferred, PseudoError::parse_error("Unbalanced parentheses", span));
        }
    }

    // target[i, j]
    if tokens[last].kind == TokenKind::BracketClose {
        match matching_open(tokens, last) {
            Some(open) if open > 0 => {
                let target = parse_nested(&tokens[..open], depth + 1)?;
                let inner = &tokens[open + 1..last];
                if inner.is_empty() {
                    return Err(PseudoError::parse_error(
                        "Expected at least one array index",
                        span,
                    ));
                }
                let indices = parse_list(inner, depth + 1)?;
                return Ok(Some(ExprNode::ArrayAccess {
                    target: Box::new(target),
                    indices,
                    span,
                }));
            }
            Some(_) => record(
                deferred,
                PseudoError::parse_error("Array literals are not supported", span),
            ),
            None => record(deferred, PseudoError::parse_error("Unbalanced brackets", span)),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lexer::lex;

    fn parse(source: &str) -> PResult<ExprNode> {
        let tokens = lex(source, &Config::default()).unwrap();
        parse_expression(&tokens)
    }

    fn operator_of(node: &ExprNode) -> Option<Operator> {
        match node {
            ExprNode::Branch { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let node = parse("10 - 4 - 3").unwrap();
        let ExprNode::Branch { operands, .. } = &node else {
            panic!("expected branch");
        };
        assert_eq!(operator_of(&operands[0]), Some(Operator::Subtract));
        assert_eq!(node.fmt_text(), "10 - 4 - 3");
    }

    #[test]
    fn minus_after_operator_is_negation() {
        let node = parse("a * -b").unwrap();
        let ExprNode::Branch { operator, operands, .. } = &node else {
            panic!("expected branch");
        };
        assert_eq!(*operator, Operator::Multiply);
        assert_eq!(operator_of(&operands[1]), Some(Operator::Negate));
    }

    #[test]
    fn method_call_on_member() {
        let node = parse("obj.items[2].Describe(1, \"x\")").unwrap();
        let ExprNode::FunctionCall { callee, args, .. } = &node else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(operator_of(callee), Some(Operator::Access));
    }

    #[test]
    fn pointer_forms() {
        assert_eq!(operator_of(&parse("^x").unwrap()), Some(Operator::PointerReference));
        assert_eq!(operator_of(&parse("p^").unwrap()), Some(Operator::PointerDereference));
        assert_eq!(operator_of(&parse("p^.next").unwrap()), Some(Operator::Access));
    }

    #[test]
    fn instantiation() {
        let node = parse("NEW Pet(\"Rex\", 3)").unwrap();
        assert!(matches!(node, ExprNode::ClassInstantiation { ref args, .. } if args.len() == 2));
    }

    #[test]
    fn malformed_inputs_fail() {
        assert!(parse("1 +").is_err());
        assert!(parse("* 2").is_err());
        assert!(parse("a.(b)").is_err());
        assert!(parse("()").is_err());
        assert!(parse("f(1,)").is_err());
        assert!(parse("NEW Pet").is_err());
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let node = parse("1 + 2 * 3").unwrap();
        let ExprNode::Branch { operator, operands, .. } = &node else {
            panic!("expected branch");
        };
        assert_eq!(*operator, Operator::Add);
        assert!(matches!(&operands[0], ExprNode::Leaf(t) if t.text == "1"));
        assert_eq!(operator_of(&operands[1]), Some(Operator::Multiply));
    }

    #[test]
    fn parentheses_override_precedence() {
        let node = parse("(1 + 2) * 3").unwrap();
        let ExprNode::Branch { operator, operands, .. } = &node else {
            panic!("expected branch");
        };
        assert_eq!(*operator, Operator::Multiply);
        assert_eq!(operator_of(&operands[0]), Some(Operator::Add));
        assert!(matches!(&operands[1], ExprNode::Leaf(t) if t.text == "3"));
    }

    #[test]
    fn negative_number_is_a_single_literal() {
        let node = parse("-5").unwrap();
        let ExprNode::Leaf(token) = &node else {
            panic!("expected leaf, got {:?}", node);
        };
        assert_eq!(token.kind, TokenKind::NumberDecimal);
        assert_eq!(token.text, "-5");

        assert_eq!(operator_of(&parse("-x").unwrap()), Some(Operator::Negate));
    }

    #[test]
    fn nesting_limit_is_a_parse_error() {
        // Deep enough to hit the limit; the spare stack keeps the test
        // independent of the runner's thread size.
        let result = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let source = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
                parse(&source)
            })
            .expect("failed to spawn thread")
            .join()
            .expect("thread panicked");

        let err = result.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Parse);
        assert!(err.message.contains("nested too deeply"));
    }

    #[test]
    fn nesting_within_the_limit_parses() {
        let depth = MAX_EXPRESSION_DEPTH / 2;
        let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        let result = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || parse(&source).map(|node| node.fmt_text()))
            .expect("failed to spawn thread")
            .join()
            .expect("thread panicked");
        assert!(result.is_ok());
    }
}
