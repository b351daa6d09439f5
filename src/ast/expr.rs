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

use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;

/// Every operator the expression parser knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    StringConcatenate,
    Multiply,
    Divide,
    IntegerDivide,
    Mod,
    Not,
    Negate,
    PointerReference,
    PointerDereference,
    Access,
}

/// Where an operator sits relative to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Binary,
    /// Binary when something that can end an operand precedes it,
    /// otherwise unary prefix (minus).
    BinaryOrUnaryPrefix,
    UnaryPrefix,
    UnaryPostfix,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Or => "OR",
            Operator::And => "AND",
            Operator::EqualTo => "=",
            Operator::NotEqualTo => "<>",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::Add => "+",
            Operator::Subtract | Operator::Negate => "-",
            Operator::StringConcatenate => "&",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::IntegerDivide => "DIV",
            Operator::Mod => "MOD",
            Operator::Not => "NOT",
            Operator::PointerReference | Operator::PointerDereference => "^",
            Operator::Access => ".",
        }
    }
}

/// An expression AST node.
///
/// Type syntax shares this tree: a type is a `Leaf` holding a name, an
/// `ArrayType` or a `RangeType`. Every node owns its children and records
/// the span of all tokens it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// A literal, a name, or SUPER.
    Leaf(Token),

    /// An operator applied to one (unary) or two (binary) operands.
    Branch {
        operator: Operator,
        operator_token: Token,
        operands: Vec<ExprNode>,
        span: Span,
    },

    /// `callee(args)`
    FunctionCall {
        callee: Box<ExprNode>,
        args: Vec<ExprNode>,
        span: Span,
    },

    /// `target[i, j]`
    ArrayAccess {
        target: Box<ExprNode>,
        indices: Vec<ExprNode>,
        span: Span,
    },

    /// `NEW ClassName(args)`
    ClassInstantiation {
        class_name: Token,
        args: Vec<ExprNode>,
        span: Span,
    },

    /// `ARRAY[low:high, ...] OF element`, or `ARRAY OF element` without
    /// bounds (parameters only).
    ArrayType {
        bounds: Option<Vec<(ExprNode, ExprNode)>>,
        element: Box<ExprNode>,
        span: Span,
    },

    /// `low..high`
    RangeType { low: i64, high: i64, span: Span },
}

impl ExprNode {
    pub fn span(&self) -> Span {
        match self {
            ExprNode::Leaf(token) => token.span,
            ExprNode::Branch { span, .. }
            | ExprNode::FunctionCall { span, .. }
            | ExprNode::ArrayAccess { span, .. }
            | ExprNode::ClassInstantiation { span, .. }
            | ExprNode::ArrayType { span, .. }
            | ExprNode::RangeType { span, .. } => *span,
        }
    }

    /// The name token if this node is a bare name.
    pub fn as_name(&self) -> Option<&Token> {
        match self {
            ExprNode::Leaf(token) if token.kind == TokenKind::Name => Some(token),
            _ => None,
        }
    }

    /// The literal token if this node is a literal.
    pub fn as_literal(&self) -> Option<&Token> {
        match self {
            ExprNode::Leaf(token) if token.kind.is_literal() => Some(token),
            _ => None,
        }
    }

    /// Renders the node back to readable source text, used for
    /// "while evaluating ..." context and type names.
    pub fn fmt_text(&self) -> String {
        match self {
            ExprNode::Leaf(token) => token.fmt_text(),
            ExprNode::Branch {
                operator,
                operands,
                ..
            } => match (operator, operands.as_slice()) {
                (Operator::Access, [left, right]) => {
                    format!("{}.{}", left.fmt_text(), right.fmt_text())
                }
                (Operator::PointerDereference, [operand]) => format!("{}^", operand.fmt_text()),
                (Operator::Not, [operand]) => format!("NOT {}", operand.fmt_text()),
                (op, [operand]) => format!("{}{}", op.symbol(), operand.fmt_text()),
                (op, [left, right]) => {
                    format!("{} {} {}", left.fmt_text(), op.symbol(), right.fmt_text())
                }
                (op, _) => op.symbol().to_string(),
            },
            ExprNode::FunctionCall { callee, args, .. } => {
                format!("{}({})", callee.fmt_text(), join(args))
            }
            ExprNode::ArrayAccess {
                target, indices, ..
            } => format!("{}[{}]", target.fmt_text(), join(indices)),
            ExprNode::ClassInstantiation {
                class_name, args, ..
            } => format!("NEW {}({})", class_name.text, join(args)),
            ExprNode::ArrayType {
                bounds, element, ..
            } => match bounds {
                Some(bounds) => {
                    let dims = bounds
                        .iter()
                        .map(|(low, high)| format!("{}:{}", low.fmt_text(), high.fmt_text()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("ARRAY[{}] OF {}", dims, element.fmt_text())
                }
                None => format!("ARRAY OF {}", element.fmt_text()),
            },
            ExprNode::RangeType { low, high, .. } => format!("{}..{}", low, high),
        }
    }
}

fn join(nodes: &[ExprNode]) -> String {
    nodes
        .iter()
        .map(ExprNode::fmt_text)
        .collect::<Vec<_>>()
        .join(", ")
}
