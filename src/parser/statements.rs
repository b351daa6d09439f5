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

//! Statement builders.
//!
//! One function per grammar shape. Each receives the captures of a
//! successful pattern match (indexed by pattern position) and materializes
//! the sub-expressions, types and parameter lists. A builder that fails
//! makes the matcher move on to the next candidate grammar.

use crate::ast::class::{AccessModifier, FileMode};
use crate::ast::expr::ExprNode;
use crate::ast::param::{Parameter, PassMode};
use crate::ast::stmt::Stmt;
use crate::error::{PResult, PseudoError};
use crate::lexer::token::{Token, TokenKind};
use crate::parser::expressions::{parse_expression, parse_expression_list};
use crate::parser::helpers::{find_top_level, parse_name_list, span_of, split_top_level};
use crate::parser::matcher::Captures;
use crate::parser::types::parse_type;

/* ============================================================================
 * Declarations
 * ============================================================================
 */

pub fn declare(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Declare {
        names: parse_name_list(c.tokens(1), "variable")?,
        var_type: parse_type(c.tokens(3))?,
    })
}

pub fn constant(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Constant {
        name: c.token(1).clone(),
        value: c.token(3).clone(),
    })
}

pub fn define(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Define {
        name: c.token(1).clone(),
        values: parse_expression_list(c.tokens(3))?,
        set_type: c.token(6).clone(),
    })
}

pub fn type_enum(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::TypeEnum {
        name: c.token(1).clone(),
        variants: parse_name_list(c.tokens(4), "enum value")?,
    })
}

pub fn type_pointer(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::TypePointer {
        name: c.token(1).clone(),
        target: parse_type(c.tokens(4))?,
    })
}

pub fn type_set(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::TypeSet {
        name: c.token(1).clone(),
        element: parse_type(c.tokens(5))?,
    })
}

pub fn type_record(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::TypeRecord {
        name: c.token(1).clone(),
    })
}

/* ============================================================================
 * Simple Statements
 * ============================================================================
 */

pub fn assignment(c: &Captures) -> PResult<Stmt> {
    let target = parse_expression(c.tokens(0))?;
    if !is_assignable_target(&target) {
        return Err(PseudoError::parse_error(
            format!("Cannot assign to \"{}\"", target.fmt_text()),
            target.span(),
        )
        .with_help("the left side of <- must be a variable, array element, field or dereferenced pointer"));
    }
    Ok(Stmt::Assignment {
        target,
        value: parse_expression(c.tokens(2))?,
    })
}

/// Names, array accesses, field accesses and dereferences can be assigned.
pub fn is_assignable_target(node: &ExprNode) -> bool {
    use crate::ast::expr::Operator;
    match node {
        ExprNode::Leaf(token) => token.kind == TokenKind::Name,
        ExprNode::ArrayAccess { target, .. } => is_assignable_target(target),
        ExprNode::Branch {
            operator: Operator::Access,
            operands,
            ..
        } => operands
            .first()
            .map(|left| {
                is_assignable_target(left)
                    || matches!(left, ExprNode::FunctionCall { .. })
                    || matches!(left, ExprNode::Leaf(t) if t.kind == TokenKind::Super)
            })
            .unwrap_or(false),
        ExprNode::Branch {
            operator: Operator::PointerDereference,
            ..
        } => true,
        _ => false,
    }
}

pub fn output(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Output {
        values: parse_expression_list(c.tokens(1))?,
    })
}

pub fn input(c: &Captures) -> PResult<Stmt> {
    let target = parse_expression(c.tokens(1))?;
    if !is_assignable_target(&target) {
        return Err(PseudoError::parse_error(
            format!("Cannot INPUT into \"{}\"", target.fmt_text()),
            target.span(),
        ));
    }
    Ok(Stmt::Input { target })
}

pub fn return_value(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Return {
        value: parse_expression(c.tokens(1))?,
    })
}

pub fn call(c: &Captures) -> PResult<Stmt> {
    match parse_expression(c.tokens(1))? {
        ExprNode::FunctionCall { callee, args, .. } => Ok(Stmt::Call {
            target: *callee,
            args,
        }),
        target @ (ExprNode::Leaf(_) | ExprNode::Branch { .. }) => Ok(Stmt::Call {
            target,
            args: Vec::new(),
        }),
        other => Err(PseudoError::parse_error(
            format!("\"{}\" is not a procedure call", other.fmt_text()),
            other.span(),
        )),
    }
}

/* ============================================================================
 * Control Flow
 * ============================================================================
 */

pub fn if_header(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::If {
        condition: parse_expression(c.tokens(1))?,
    })
}

pub fn else_split(_: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Else)
}

pub fn case_header(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Case {
        value: parse_expression(c.tokens(2))?,
    })
}

pub fn case_branch(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::CaseBranch {
        value: parse_expression(c.tokens(0))?,
    })
}

pub fn case_branch_range(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::CaseBranchRange {
        low: parse_expression(c.tokens(0))?,
        high: parse_expression(c.tokens(2))?,
    })
}

pub fn otherwise(c: &Captures) -> PResult<Stmt> {
    match c.tokens(1) {
        [] => Ok(Stmt::Otherwise),
        [colon] if colon.kind == TokenKind::Colon => Ok(Stmt::Otherwise),
        rest => Err(PseudoError::parse_error(
            "Unexpected tokens after OTHERWISE",
            span_of(rest),
        )),
    }
}

pub fn for_header(c: &Captures) -> PResult<Stmt> {
    let step = if c.len() > 6 {
        Some(parse_expression(c.tokens(7))?)
    } else {
        None
    };
    Ok(Stmt::For {
        variable: c.token(1).clone(),
        from: parse_expression(c.tokens(3))?,
        to: parse_expression(c.tokens(5))?,
        step,
    })
}

pub fn for_end(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::ForEnd {
        variable: c.token(1).clone(),
    })
}

pub fn while_header(c: &Captures) -> PResult<Stmt> {
    let mut tokens = c.tokens(1);
    if let [rest @ .., last] = tokens {
        if last.kind == TokenKind::Do {
            tokens = rest;
        }
    }
    if tokens.is_empty() {
        return Err(PseudoError::parse_error("Expected a condition after WHILE", c.span));
    }
    Ok(Stmt::While {
        condition: parse_expression(tokens)?,
    })
}

pub fn repeat(_: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Repeat)
}

pub fn until(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Until {
        condition: parse_expression(c.tokens(1))?,
    })
}

pub fn end(_: &Captures) -> PResult<Stmt> {
    Ok(Stmt::End)
}

/* ============================================================================
 * Subroutines
 * ============================================================================
 */

pub fn function(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Function {
        name: c.token(1).clone(),
        params: parse_parameters(c.tokens(3))?,
        returns: parse_type(c.tokens(6))?,
    })
}

pub fn function_no_params(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Function {
        name: c.token(1).clone(),
        params: Vec::new(),
        returns: parse_type(c.tokens(3))?,
    })
}

pub fn procedure(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Procedure {
        name: c.token(1).clone(),
        params: parse_parameters(c.tokens(3))?,
    })
}

pub fn procedure_no_params(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Procedure {
        name: c.token(1).clone(),
        params: Vec::new(),
    })
}

/// Parses `[BYREF|BYVAL] name : type, ...`.
///
/// A pass-mode keyword applies to its parameter and to every following
/// parameter until another pass-mode keyword appears.
pub fn parse_parameters(tokens: &[Token]) -> PResult<Vec<Parameter>> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut mode = PassMode::ByVal;

    for part in split_top_level(tokens, TokenKind::Comma)? {
        let mut part = part;
        match part.first().map(|t| t.kind) {
            Some(TokenKind::ByRef) => {
                mode = PassMode::ByRef;
                part = &part[1..];
            }
            Some(TokenKind::ByVal) => {
                mode = PassMode::ByVal;
                part = &part[1..];
            }
            _ => {}
        }

        let span = span_of(part);
        let name = match part.first() {
            Some(token) if token.kind == TokenKind::Name => token.clone(),
            _ => {
                return Err(PseudoError::parse_error("Expected a parameter name", span)
                    .with_help("parameters are written [BYREF|BYVAL] name : type"))
            }
        };

        let colon = find_top_level(part, TokenKind::Colon);
        if colon != Some(1) || part.len() < 3 {
            return Err(PseudoError::parse_error(
                format!("Expected \":\" and a type after parameter \"{}\"", name.text),
                span,
            ));
        }

        if params.iter().any(|p| p.name.text == name.text) {
            return Err(PseudoError::parse_error(
                format!("Duplicate parameter name \"{}\"", name.text),
                name.span,
            ));
        }

        params.push(Parameter {
            name,
            param_type: parse_type(&part[2..])?,
            mode,
        });
    }

    Ok(params)
}

/* ============================================================================
 * Files
 * ============================================================================
 */

pub fn open_file(c: &Captures) -> PResult<Stmt> {
    let mode = match c.token(3).kind {
        TokenKind::Read => FileMode::Read,
        TokenKind::Write => FileMode::Write,
        TokenKind::Append => FileMode::Append,
        _ => FileMode::Random,
    };
    Ok(Stmt::OpenFile {
        filename: parse_expression(c.tokens(1))?,
        mode,
    })
}

fn file_and_expr(c: &Captures) -> PResult<(ExprNode, ExprNode)> {
    Ok((parse_expression(c.tokens(1))?, parse_expression(c.tokens(3))?))
}

pub fn read_file(c: &Captures) -> PResult<Stmt> {
    let (filename, target) = file_and_expr(c)?;
    Ok(Stmt::ReadFile { filename, target })
}

pub fn write_file(c: &Captures) -> PResult<Stmt> {
    let (filename, value) = file_and_expr(c)?;
    Ok(Stmt::WriteFile { filename, value })
}

pub fn close_file(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::CloseFile {
        filename: parse_expression(c.tokens(1))?,
    })
}

pub fn seek(c: &Captures) -> PResult<Stmt> {
    let (filename, position) = file_and_expr(c)?;
    Ok(Stmt::Seek { filename, position })
}

pub fn get_record(c: &Captures) -> PResult<Stmt> {
    let (filename, target) = file_and_expr(c)?;
    Ok(Stmt::GetRecord { filename, target })
}

pub fn put_record(c: &Captures) -> PResult<Stmt> {
    let (filename, value) = file_and_expr(c)?;
    Ok(Stmt::PutRecord { filename, value })
}

/* ============================================================================
 * Classes
 * ============================================================================
 */

pub fn class_header(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::Class {
        name: c.token(1).clone(),
        inherits: (c.len() > 2).then(|| c.token(3).clone()),
    })
}

fn access(c: &Captures) -> AccessModifier {
    if c.token(0).kind == TokenKind::Private {
        AccessModifier::Private
    } else {
        AccessModifier::Public
    }
}

pub fn class_property(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::ClassProperty {
        access: access(c),
        names: parse_name_list(c.tokens(1), "property")?,
        var_type: parse_type(c.tokens(3))?,
    })
}

pub fn class_procedure(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::ClassProcedure {
        access: access(c),
        name: c.token(2).clone(),
        params: parse_parameters(c.tokens(4))?,
    })
}

pub fn class_procedure_no_params(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::ClassProcedure {
        access: access(c),
        name: c.token(2).clone(),
        params: Vec::new(),
    })
}

pub fn class_function(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::ClassFunction {
        access: access(c),
        name: c.token(2).clone(),
        params: parse_parameters(c.tokens(4))?,
        returns: parse_type(c.tokens(7))?,
    })
}

pub fn class_function_no_params(c: &Captures) -> PResult<Stmt> {
    Ok(Stmt::ClassFunction {
        access: access(c),
        name: c.token(2).clone(),
        params: Vec::new(),
        returns: parse_type(c.tokens(4))?,
    })
}
