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

//! Statement and block execution.

use std::cmp::Ordering;

use crate::ast::expr::ExprNode;
use crate::ast::stmt::{BranchNode, ProgramNode, Statement, Stmt};
use crate::error::{PResult, PseudoError, ResultExt};
use crate::interpreter::coerce::is_text_type;
use crate::interpreter::display::render;
use crate::interpreter::helpers::literal_value;
use crate::interpreter::types::is_declaration;
use crate::interpreter::{Runtime, Scope};
use crate::io::OutputValue;
use crate::lexer::token::Token;
use crate::span::Span;
use crate::types::{TypeArena, VariableType};
use crate::value::{TypedValue, Value, Variable};

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum ExecSignal {
    /// Continue with the next statement.
    None,
    /// A RETURN ran; unwind to the calling routine.
    Return(TypedValue),
}

impl<'r> Runtime<'r> {
    /// Runs the top-level statements. Declarations were handled by
    /// `prepare` and are skipped.
    pub(crate) fn exec_program(&mut self, nodes: &[ProgramNode]) -> PResult<()> {
        for node in nodes {
            if is_declaration(node.head().statement_type) {
                continue;
            }
            self.exec_node(node)?;
        }
        Ok(())
    }

    /// Runs a statement group, stopping at the first RETURN.
    pub(crate) fn exec_group(&mut self, nodes: &[ProgramNode]) -> PResult<ExecSignal> {
        for node in nodes {
            if let ExecSignal::Return(value) = self.exec_node(node)? {
                return Ok(ExecSignal::Return(value));
            }
        }
        Ok(ExecSignal::None)
    }

    /// Runs a group inside a fresh transparent scope.
    fn exec_scoped(&mut self, nodes: &[ProgramNode]) -> PResult<ExecSignal> {
        self.scoped(Scope::new(false), |rt| rt.exec_group(nodes))
    }

    fn exec_node(&mut self, node: &ProgramNode) -> PResult<ExecSignal> {
        match node {
            ProgramNode::Statement(statement) => {
                self.tick(statement.span)?;
                self.exec_statement(statement).general_span(statement.span)
            }
            ProgramNode::Block(block) => {
                let header = block.header();
                self.tick(header.span)?;
                self.exec_block(block).map_err(|err| err.or_span(header.span))
            }
        }
    }

    /* ============================================================================
     * Blocks
     * ============================================================================
     */

    fn exec_block(&mut self, block: &BranchNode) -> PResult<ExecSignal> {
        let header = block.header();
        self.check_stack(header.span)?;
        match &header.node {
            Stmt::If { condition } => {
                let taken = self.eval_boolean(condition).general_span(header.span)?;
                if taken {
                    self.exec_scoped(&block.groups[0])
                } else if let Some(otherwise) = block.groups.get(1) {
                    self.exec_scoped(otherwise)
                } else {
                    Ok(ExecSignal::None)
                }
            }

            Stmt::Case { value } => self.exec_case(block, value),

            Stmt::For { variable, from, to, step } => {
                self.exec_for(block, variable, from, to, step.as_ref())
            }

            Stmt::While { condition } => loop {
                if !self.eval_boolean(condition).general_span(header.span)? {
                    return Ok(ExecSignal::None);
                }
                if let ExecSignal::Return(value) = self.exec_scoped(&block.groups[0])? {
                    return Ok(ExecSignal::Return(value));
                }
                self.tick(header.span)?;
            },

            Stmt::Repeat => {
                let condition = match block.terminator().map(|end| &end.node) {
                    Some(Stmt::Until { condition }) => condition,
                    _ => return Err(PseudoError::runtime_error("REPEAT without UNTIL", Some(header.span))),
                };
                let until_span = block.terminator().map(|end| end.span).unwrap_or(header.span);
                loop {
                    let (signal, done) = self.scoped(Scope::new(false), |rt| {
                        let signal = rt.exec_group(&block.groups[0])?;
                        if matches!(signal, ExecSignal::Return(_)) {
                            return Ok((signal, true));
                        }
                        let done = rt.eval_boolean(condition).general_span(until_span)?;
                        Ok((signal, done))
                    })?;
                    if matches!(signal, ExecSignal::Return(_)) || done {
                        return Ok(signal);
                    }
                    self.tick(until_span)?;
                }
            }

            Stmt::Function { .. } | Stmt::Procedure { .. } | Stmt::Class { .. } | Stmt::TypeRecord { .. } => {
                Err(PseudoError::runtime_error(
                    format!("{} can only be declared at the top level", header.statement_type.display_name()),
                    Some(header.span),
                ))
            }

            _ => Err(PseudoError::runtime_error(
                format!("Unexpected {} block", header.statement_type.display_name()),
                Some(header.span),
            )),
        }
    }

    fn exec_case(&mut self, block: &BranchNode, subject: &ExprNode) -> PResult<ExecSignal> {
        let subject = self.eval(subject, None)?;
        let branches = block.controls.len().saturating_sub(1);

        for index in 1..branches {
            let control = &block.controls[index];
            let matched = match &control.node {
                Stmt::CaseBranch { value } => {
                    let candidate = self.eval(value, Some(subject.ty))?;
                    self.values_equal(&subject, &candidate, control.span)?
                }
                Stmt::CaseBranchRange { low, high } => {
                    let low = self.eval(low, Some(subject.ty))?;
                    let high = self.eval(high, Some(subject.ty))?;
                    self.compare(&subject, &low, control.span)? != Ordering::Less
                        && self.compare(&subject, &high, control.span)? != Ordering::Greater
                }
                Stmt::Otherwise => true,
                _ => false,
            };
            if matched {
                return match block.groups.get(index) {
                    Some(group) => self.exec_scoped(group),
                    None => Ok(ExecSignal::None),
                };
            }
        }
        Ok(ExecSignal::None)
    }

    fn exec_for(
        &mut self,
        block: &BranchNode,
        variable: &Token,
        from: &ExprNode,
        to: &ExprNode,
        step: Option<&ExprNode>,
    ) -> PResult<ExecSignal> {
        let header_span = block.header().span;
        let bound = |rt: &mut Self, expr: &ExprNode, what: &str| -> PResult<i64> {
            let tv = rt.eval(expr, Some(TypeArena::INTEGER))?;
            match tv.value {
                Value::Integer(n) => Ok(n),
                _ => Err(PseudoError::type_error(
                    format!("The {} of a FOR loop must be an INTEGER, found {}", what, rt.types.name(tv.ty)),
                    Some(expr.span()),
                )),
            }
        };

        let start = bound(self, from, "start")?;
        let end = bound(self, to, "end")?;
        let step_by = match step {
            Some(expr) => bound(self, expr, "step")?,
            None => 1,
        };
        if step_by == 0 {
            return Err(PseudoError::runtime_error(
                "The STEP of a FOR loop cannot be 0",
                step.map(ExprNode::span),
            ));
        }

        let body = &block.groups[0];
        let in_range = |i: i64| if step_by > 0 { i <= end } else { i >= end };

        if body.is_empty() {
            let iterations = if in_range(start) {
                (end as i128 - start as i128) / step_by as i128 + 1
            } else {
                0
            };
            self.tick_many(u64::try_from(iterations).unwrap_or(u64::MAX), header_span)?;
            return Ok(ExecSignal::None);
        }

        let loop_var = |i: i64| Variable::new(variable.text.clone(), TypeArena::INTEGER, Some(Value::Integer(i)), false, Some(header_span));

        // A body that declares nothing can share one scope and one binding.
        if block.is_simple() {
            return self.scoped(Scope::new(false), |rt| {
                let var = rt.declare_variable(loop_var(start), variable.span)?;
                let mut i = start;
                while in_range(i) {
                    var.borrow_mut().value = Some(Value::Integer(i));
                    if let ExecSignal::Return(value) = rt.exec_group(body)? {
                        return Ok(ExecSignal::Return(value));
                    }
                    rt.tick(header_span)?;
                    match i.checked_add(step_by) {
                        Some(next) => i = next,
                        None => break,
                    }
                }
                Ok(ExecSignal::None)
            });
        }

        let mut i = start;
        while in_range(i) {
            let signal = self.scoped(Scope::new(false), |rt| {
                rt.declare_variable(loop_var(i), variable.span)?;
                rt.exec_group(body)
            })?;
            if let ExecSignal::Return(value) = signal {
                return Ok(ExecSignal::Return(value));
            }
            self.tick(header_span)?;
            match i.checked_add(step_by) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(ExecSignal::None)
    }

    /* ============================================================================
     * Statements
     * ============================================================================
     */

    pub(crate) fn exec_statement(&mut self, statement: &Statement) -> PResult<ExecSignal> {
        let span = statement.span;
        match &statement.node {
            Stmt::Declare { names, var_type } => {
                let ty = self.resolve_type(var_type)?;
                self.require_sized(ty, var_type.span())?;
                for name in names {
                    let value = self.default_value(ty, self.config.initialization.normal_variables_default);
                    self.declare_variable(Variable::new(name.text.clone(), ty, value, true, Some(span)), name.span)?;
                }
            }

            Stmt::Constant { name, value } => {
                let tv = literal_value(value)?;
                self.declare_variable(Variable::new(name.text.clone(), tv.ty, Some(tv.value), false, Some(span)), name.span)?;
            }

            Stmt::Define { name, values, set_type } => {
                let ty = self.resolve_named_type(&set_type.text, set_type.span)?;
                let element = match self.types.get(ty) {
                    VariableType::Set(set) => set.element,
                    _ => {
                        return Err(PseudoError::type_error(
                            format!("\"{}\" is not a set type", set_type.text),
                            Some(set_type.span),
                        ))
                    }
                };
                let mut members: Vec<TypedValue> = Vec::with_capacity(values.len());
                for value in values {
                    let tv = self.eval(value, Some(element))?;
                    let coerced = TypedValue::new(element, self.coerce(tv, element, value.span())?);
                    let mut duplicate = false;
                    for existing in &members {
                        if self.values_equal(existing, &coerced, value.span())? {
                            duplicate = true;
                            break;
                        }
                    }
                    if !duplicate {
                        members.push(coerced);
                    }
                }
                let set = Value::Set {
                    ty,
                    values: members.into_iter().map(|tv| tv.value).collect(),
                };
                self.declare_variable(Variable::new(name.text.clone(), ty, Some(set), true, Some(span)), name.span)?;
            }

            Stmt::TypeEnum { .. } | Stmt::TypePointer { .. } | Stmt::TypeSet { .. } => {
                return Err(PseudoError::runtime_error(
                    "TYPE can only be declared at the top level",
                    Some(span),
                ))
            }

            Stmt::Assignment { target, value } => {
                let place = self.place(target)?;
                let tv = self.eval(value, Some(place.ty))?;
                self.assign(&place, tv, value.span())?;
            }

            Stmt::Output { values } => {
                let mut rendered = Vec::with_capacity(values.len());
                for value in values {
                    let tv = self.eval(value, None)?;
                    rendered.push(OutputValue {
                        type_name: self.types.name(tv.ty),
                        text: render(&self.types, &tv.value),
                    });
                }
                self.io.output(&rendered);
            }

            Stmt::Input { target } => {
                let place = self.place(target)?;
                if !is_text_type(&self.types, place.ty) {
                    return Err(PseudoError::type_error(
                        format!("Cannot INPUT a value of type {}", self.types.name(place.ty)),
                        Some(target.span()),
                    ));
                }
                let prompt = format!("Enter the value for \"{}\"", place.text);
                let text = self.io.input(&prompt, &self.types.name(place.ty)).map_err(|err| err.or_span(span))?;
                let value = self.parse_text(&text, place.ty, target.span())?;
                self.write_place(&place, value, target.span())?;
            }

            Stmt::Return { value } => return self.exec_return(value, span),

            Stmt::Call { target, args } => self.call_statement(target, args, span)?,

            Stmt::OpenFile { filename, mode } => self.exec_open_file(filename, *mode, span)?,
            Stmt::ReadFile { filename, target } => self.exec_read_file(filename, target, span)?,
            Stmt::WriteFile { filename, value } => self.exec_write_file(filename, value, span)?,
            Stmt::CloseFile { filename } => self.exec_close_file(filename, span)?,
            Stmt::Seek { filename, position } => self.exec_seek(filename, position, span)?,
            Stmt::GetRecord { filename, target } => self.exec_get_record(filename, target, span)?,
            Stmt::PutRecord { filename, value } => self.exec_put_record(filename, value, span)?,

            _ => {}
        }
        Ok(ExecSignal::None)
    }

    fn exec_return(&mut self, value: &ExprNode, span: Span) -> PResult<ExecSignal> {
        let Some(frame) = self.frames.last() else {
            return Err(PseudoError::runtime_error("RETURN can only be used inside a FUNCTION", Some(span)));
        };
        let Some(returns) = frame.routine.returns else {
            return Err(PseudoError::runtime_error(
                format!("The procedure {} cannot return a value", frame.routine.name),
                Some(span),
            )
            .with_help("declare it as a FUNCTION with RETURNS"));
        };

        let tv = self.eval(value, Some(returns))?;
        let value = self.coerce(tv, returns, span)?;
        let ty = self.value_type(&value, returns);
        Ok(ExecSignal::Return(TypedValue::new(ty, value)))
    }
}
