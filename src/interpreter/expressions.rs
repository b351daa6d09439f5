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

//! Expression evaluation.
//!
//! Every expression evaluates to a [`TypedValue`]. An optional expected
//! type flows down from the context (assignment target, parameter, CASE
//! subject) and is used to pick between enum variants of the same name and
//! to choose the pointer type for `^x`.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::ast::expr::{ExprNode, Operator};
use crate::error::{PResult, PseudoError, ResultExt};
use crate::interpreter::display::render;
use crate::interpreter::helpers::{expect_boolean, expect_integer, expect_string, literal_value};
use crate::interpreter::Runtime;
use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;
use crate::types::{TypeArena, TypeId, VariableType};
use crate::value::{TypedValue, Value};

impl<'r> Runtime<'r> {
    /// Evaluates an expression.
    pub(crate) fn eval(&mut self, expr: &ExprNode, expected: Option<TypeId>) -> PResult<TypedValue> {
        if !matches!(expr, ExprNode::Leaf(_)) {
            self.check_stack(expr.span())?;
        }
        match expr {
            ExprNode::Leaf(token) => self.eval_leaf(token, expected),

            ExprNode::Branch {
                operator,
                operands,
                span,
                ..
            } => self.eval_operator(expr, *operator, operands, *span, expected),

            ExprNode::FunctionCall { callee, args, span } => match self.call_expression(callee, args, *span)? {
                Some(value) => Ok(value),
                None => Err(PseudoError::runtime_error(
                    format!("The procedure {} does not return a value", callee.fmt_text()),
                    Some(*span),
                )
                .with_help("use CALL to run a procedure")),
            },

            ExprNode::ArrayAccess { target, indices, span } => {
                if self.is_place_expr(expr) {
                    let place = self.place(expr)?;
                    return self.read_place(&place, *span);
                }
                let array = self.eval(target, None)?;
                let indices = self.eval_indices(indices)?;
                let element = self.types.as_array(array.ty).map(|a| a.element);
                match (array.value, element) {
                    (Value::Array(array), Some(element)) => {
                        let offset = array
                            .offset(&indices)
                            .map_err(|reason| PseudoError::runtime_error(format!("Cannot index: {}", reason), Some(*span)))?;
                        match array.data.into_iter().nth(offset).flatten() {
                            Some(value) => {
                                let ty = self.value_type(&value, element);
                                Ok(TypedValue::new(ty, value))
                            }
                            None => Err(PseudoError::runtime_error(
                                format!("\"{}\" is used before it has a value", expr.fmt_text()),
                                Some(*span),
                            )),
                        }
                    }
                    _ => Err(PseudoError::type_error(
                        format!("Cannot index a {}", self.types.name(array.ty)),
                        Some(target.span()),
                    )),
                }
            }

            ExprNode::ClassInstantiation { class_name, args, span } => self.instantiate(class_name, args, *span),

            ExprNode::ArrayType { span, .. } | ExprNode::RangeType { span, .. } => Err(PseudoError::type_error(
                "A type cannot be used as a value",
                Some(*span),
            )),
        }
    }

    fn eval_leaf(&mut self, token: &Token, expected: Option<TypeId>) -> PResult<TypedValue> {
        match token.kind {
            TokenKind::Name => {
                if self.lookup_variable(&token.text).is_some() {
                    let place = self.place(&ExprNode::Leaf(token.clone()))?;
                    return self.read_place(&place, token.span);
                }
                if let Some((ty, index)) = self.enum_variant(&token.text, expected) {
                    return Ok(TypedValue::new(ty, Value::Enum { ty, index }));
                }
                Err(self.undeclared(&token.text, token.span))
            }
            TokenKind::Super => Err(PseudoError::runtime_error(
                "SUPER can only be used to call a method, as in SUPER.Name(...)",
                Some(token.span),
            )),
            _ => literal_value(token),
        }
    }

    pub(crate) fn eval_boolean(&mut self, expr: &ExprNode) -> PResult<bool> {
        let tv = self.eval(expr, Some(TypeArena::BOOLEAN))?;
        expect_boolean(&tv, "The condition", &self.types).map_err(|err| err.or_span(expr.span()))
    }

    pub(crate) fn eval_integer(&mut self, expr: &ExprNode) -> PResult<i64> {
        let tv = self.eval(expr, Some(TypeArena::INTEGER))?;
        expect_integer(&tv, "The value", &self.types).map_err(|err| err.or_span(expr.span()))
    }

    pub(crate) fn eval_string(&mut self, expr: &ExprNode) -> PResult<String> {
        let tv = self.eval(expr, Some(TypeArena::STRING))?;
        expect_string(&tv, "The value", &self.types).map_err(|err| err.or_span(expr.span()))
    }

    /* ============================================================================
     * Operators
     * ============================================================================
     */

    fn eval_operator(
        &mut self,
        expr: &ExprNode,
        operator: Operator,
        operands: &[ExprNode],
        span: Span,
        expected: Option<TypeId>,
    ) -> PResult<TypedValue> {
        match (operator, operands) {
            (Operator::Access | Operator::PointerDereference, _) if self.is_place_expr(expr) => {
                let place = self.place(expr)?;
                self.read_place(&place, span)
            }

            (Operator::Access, [left, right]) => {
                let member = right
                    .as_name()
                    .ok_or_else(|| PseudoError::runtime_error("Expected a member name after \".\"", Some(right.span())))?;
                let object = self.eval(left, None)?;
                self.member_value(object, member, span)
            }

            (Operator::PointerReference, [operand]) => self.eval_reference(operand, span, expected),

            (Operator::Not, [operand]) => {
                let value = self.eval_boolean(operand)?;
                Ok(TypedValue::boolean(!value))
            }

            (Operator::Negate, [operand]) => {
                let tv = self.eval(operand, None)?;
                match tv.value {
                    Value::Integer(n) => n
                        .checked_neg()
                        .map(TypedValue::integer)
                        .ok_or_else(|| overflow(span)),
                    Value::Real(x) => Ok(TypedValue::real(-x)),
                    _ => Err(PseudoError::type_error(
                        format!("Cannot negate a {}", self.types.name(tv.ty)),
                        Some(span),
                    )),
                }
            }

            (Operator::And, [left, right]) => {
                if !self.eval_boolean(left)? {
                    return Ok(TypedValue::boolean(false));
                }
                self.eval_boolean(right).map(TypedValue::boolean)
            }

            (Operator::Or, [left, right]) => {
                if self.eval_boolean(left)? {
                    return Ok(TypedValue::boolean(true));
                }
                self.eval_boolean(right).map(TypedValue::boolean)
            }

            (_, [left, right]) => {
                let left_value = self.eval(left, None)?;
                let right_hint = match self.types.get(left_value.ty) {
                    VariableType::Enum(_) | VariableType::Pointer(_) => Some(left_value.ty),
                    _ => None,
                };
                let right_value = self.eval(right, right_hint)?;
                self.binary(operator, left_value, right_value, span)
                    .context_with(|| format!("while evaluating {}", expr.fmt_text()))
            }

            _ => Err(PseudoError::runtime_error(
                format!("Malformed use of operator {}", operator.symbol()),
                Some(span),
            )),
        }
    }

    /// `object.member` where `object` is a computed value.
    fn member_value(&mut self, object: TypedValue, member: &Token, span: Span) -> PResult<TypedValue> {
        match object.value {
            Value::Record { ty, fields } => {
                let (index, field_ty) = self
                    .types
                    .as_record(ty)
                    .and_then(|r| r.field(&member.text))
                    .ok_or_else(|| {
                        PseudoError::runtime_error(
                            format!("{} has no field \"{}\"", self.types.name(ty), member.text),
                            Some(member.span),
                        )
                    })?;
                match fields.into_iter().nth(index).flatten() {
                    Some(value) => Ok(TypedValue::new(field_ty, value)),
                    None => Err(PseudoError::runtime_error(
                        format!("Field \"{}\" is used before it has a value", member.text),
                        Some(span),
                    )),
                }
            }
            Value::Class(instance) => {
                let (binding, ty) = self.property_binding(&instance, &member.text, member.span)?;
                let value = binding.borrow().value.clone();
                match value {
                    Some(value) => {
                        let ty = self.value_type(&value, ty);
                        Ok(TypedValue::new(ty, value))
                    }
                    None => Err(PseudoError::runtime_error(
                        format!("Property \"{}\" is used before it has a value", member.text),
                        Some(span),
                    )),
                }
            }
            _ => Err(PseudoError::type_error(
                format!("A {} has no members", self.types.name(object.ty)),
                Some(span),
            )),
        }
    }

    /// `^x`: a pointer to the binding `x` names.
    fn eval_reference(&mut self, operand: &ExprNode, span: Span, expected: Option<TypeId>) -> PResult<TypedValue> {
        let place = self.place(operand)?;
        if !place.path.is_empty() {
            return Err(PseudoError::runtime_error(
                format!("Cannot point to \"{}\"", place.text),
                Some(operand.span()),
            )
            .with_help("pointers can refer to variables, properties and pointer targets, not to array elements or fields"));
        }

        let pointer_ty = match expected.map(|ty| (ty, self.types.get(ty))) {
            Some((ty, VariableType::Pointer(p)))
                if p.target.is_some_and(|t| crate::types::types_equal(&self.types, t, place.ty)) =>
            {
                ty
            }
            _ => self.pointer_type_for(place.ty, span)?,
        };

        Ok(TypedValue::new(
            pointer_ty,
            Value::Pointer {
                ty: pointer_ty,
                target: Some(place.root),
            },
        ))
    }

    fn binary(&self, operator: Operator, left: TypedValue, right: TypedValue, span: Span) -> PResult<TypedValue> {
        match operator {
            Operator::Add | Operator::Subtract | Operator::Multiply => self.arithmetic(operator, left, right, span),

            Operator::Divide => {
                let (a, b) = self.reals(&left, &right, operator, span)?;
                if b == 0.0 {
                    return Err(division_by_zero(span));
                }
                Ok(TypedValue::real(a / b))
            }

            Operator::IntegerDivide | Operator::Mod => {
                let (Value::Integer(a), Value::Integer(b)) = (&left.value, &right.value) else {
                    return Err(PseudoError::type_error(
                        format!(
                            "{} needs two INTEGERs, found {} and {}",
                            operator.symbol(),
                            self.types.name(left.ty),
                            self.types.name(right.ty)
                        ),
                        Some(span),
                    )
                    .with_help("use / for REAL division"));
                };
                if *b == 0 {
                    return Err(division_by_zero(span));
                }
                let result = if operator == Operator::IntegerDivide {
                    a.checked_div(*b)
                } else {
                    a.checked_rem(*b)
                };
                result.map(TypedValue::integer).ok_or_else(|| overflow(span))
            }

            Operator::StringConcatenate => {
                let text = |tv: &TypedValue| match &tv.value {
                    Value::String(s) => Some(s.clone()),
                    Value::Char(c) => Some(c.to_string()),
                    _ => None,
                };
                match (text(&left), text(&right)) {
                    (Some(a), Some(b)) => Ok(TypedValue::string(a + &b)),
                    _ if self.config.coercion.concat_any => Ok(TypedValue::string(
                        render(&self.types, &left.value) + &render(&self.types, &right.value),
                    )),
                    _ => Err(PseudoError::type_error(
                        format!(
                            "& joins STRINGs, found {} and {}",
                            self.types.name(left.ty),
                            self.types.name(right.ty)
                        ),
                        Some(span),
                    )
                    .with_help("convert with NUM_TO_STR, or set coercion.concat_any")),
                }
            }

            Operator::EqualTo => self.values_equal(&left, &right, span).map(TypedValue::boolean),
            Operator::NotEqualTo => self.values_equal(&left, &right, span).map(|eq| TypedValue::boolean(!eq)),

            Operator::LessThan | Operator::LessThanEqual | Operator::GreaterThan | Operator::GreaterThanEqual => {
                let ordering = self.compare(&left, &right, span)?;
                let result = match operator {
                    Operator::LessThan => ordering == Ordering::Less,
                    Operator::LessThanEqual => ordering != Ordering::Greater,
                    Operator::GreaterThan => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(TypedValue::boolean(result))
            }

            _ => Err(PseudoError::runtime_error(
                format!("{} is not a binary operator", operator.symbol()),
                Some(span),
            )),
        }
    }

    fn arithmetic(&self, operator: Operator, left: TypedValue, right: TypedValue, span: Span) -> PResult<TypedValue> {
        if let (Value::Integer(a), Value::Integer(b)) = (&left.value, &right.value) {
            let result = match operator {
                Operator::Add => a.checked_add(*b),
                Operator::Subtract => a.checked_sub(*b),
                _ => a.checked_mul(*b),
            };
            return result.map(TypedValue::integer).ok_or_else(|| overflow(span));
        }

        let (a, b) = self.reals(&left, &right, operator, span)?;
        let result = match operator {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            _ => a * b,
        };
        Ok(TypedValue::real(result))
    }

    fn reals(&self, left: &TypedValue, right: &TypedValue, operator: Operator, span: Span) -> PResult<(f64, f64)> {
        let real = |value: &Value| match value {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(x) => Some(*x),
            _ => None,
        };
        match (real(&left.value), real(&right.value)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => {
                let mut err = PseudoError::type_error(
                    format!(
                        "Cannot use {} on {} and {}",
                        operator.symbol(),
                        self.types.name(left.ty),
                        self.types.name(right.ty)
                    ),
                    Some(span),
                );
                if operator == Operator::Add
                    && matches!(left.value, Value::String(_) | Value::Char(_))
                    && matches!(right.value, Value::String(_) | Value::Char(_))
                {
                    err = err.with_help("use & to join strings");
                }
                Err(err)
            }
        }
    }

    /* ============================================================================
     * Comparison
     * ============================================================================
     */

    /// `=` between two values.
    ///
    /// # Errors
    /// Comparing values of unrelated types is a type error unless
    /// `equality.allow_different_types` is set, in which case they are
    /// simply unequal.
    pub(crate) fn values_equal(&self, left: &TypedValue, right: &TypedValue, span: Span) -> PResult<bool> {
        match self.equal(&left.value, &right.value) {
            Some(eq) => Ok(eq),
            None if self.config.equality.allow_different_types => Ok(false),
            None => {
                let mut err = PseudoError::type_error(
                    format!(
                        "Cannot compare a {} with a {}",
                        self.types.name(left.ty),
                        self.types.name(right.ty)
                    ),
                    Some(span),
                )
                .with_help("set equality.allow_different_types to treat such values as unequal");
                if matches!(
                    (&left.value, &right.value),
                    (Value::Integer(_), Value::Real(_)) | (Value::Real(_), Value::Integer(_))
                ) {
                    err = err.with_help("set equality.coerce_int_real to compare INTEGERs with REALs");
                } else if matches!(
                    (&left.value, &right.value),
                    (Value::String(_), Value::Char(_)) | (Value::Char(_), Value::String(_))
                ) {
                    err = err.with_help("set equality.coerce_string_char to compare STRINGs with CHARs");
                }
                Err(err)
            }
        }
    }

    /// Structural equality. `None` when the values cannot be compared.
    fn equal(&self, left: &Value, right: &Value) -> Option<bool> {
        let equality = &self.config.equality;
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Some(a == b),
            (Value::Real(a), Value::Real(b)) => Some(a == b),
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
                equality.coerce_int_real.then(|| *a as f64 == *b)
            }
            (Value::String(a), Value::String(b)) => Some(a == b),
            (Value::Char(a), Value::Char(b)) => Some(a == b),
            (Value::String(s), Value::Char(c)) | (Value::Char(c), Value::String(s)) => {
                equality.coerce_string_char.then(|| {
                    let mut chars = s.chars();
                    chars.next() == Some(*c) && chars.next().is_none()
                })
            }
            (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
            (Value::Date(a), Value::Date(b)) => Some(a == b),
            (Value::Enum { ty: ta, index: a }, Value::Enum { ty: tb, index: b }) => (ta == tb).then_some(a == b),
            (Value::Pointer { target: a, .. }, Value::Pointer { target: b, .. }) => Some(match (a, b) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }),
            (Value::Class(a), Value::Class(b)) => Some(Rc::ptr_eq(a, b)),
            (Value::Array(a), Value::Array(b)) => {
                if a.bounds != b.bounds {
                    return Some(false);
                }
                self.all_equal(&a.data, &b.data)
            }
            (Value::Record { ty: ta, fields: a }, Value::Record { ty: tb, fields: b }) => {
                if ta != tb {
                    return None;
                }
                self.all_equal(a, b)
            }
            (Value::Set { values: a, .. }, Value::Set { values: b, .. }) => {
                let contains = |haystack: &[Value], needle: &Value| haystack.iter().any(|v| self.equal(v, needle) == Some(true));
                Some(a.iter().all(|v| contains(b, v)) && b.iter().all(|v| contains(a, v)))
            }
            _ => None,
        }
    }

    fn all_equal(&self, left: &[Option<Value>], right: &[Option<Value>]) -> Option<bool> {
        if left.len() != right.len() {
            return Some(false);
        }
        for pair in left.iter().zip(right) {
            let eq = match pair {
                (Some(a), Some(b)) => self.equal(a, b)?,
                (None, None) => true,
                _ => false,
            };
            if !eq {
                return Some(false);
            }
        }
        Some(true)
    }

    /// Ordering for `<`, `<=`, `>` and `>=`.
    pub(crate) fn compare(&self, left: &TypedValue, right: &TypedValue, span: Span) -> PResult<Ordering> {
        let text = |value: &Value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Char(c) => Some(c.to_string()),
            _ => None,
        };
        let ordering = match (&left.value, &right.value) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(_) | Value::Real(_), Value::Integer(_) | Value::Real(_)) => {
                let (a, b) = self.reals(left, right, Operator::LessThan, span)?;
                a.partial_cmp(&b)
            }
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Enum { ty: ta, index: a }, Value::Enum { ty: tb, index: b }) if ta == tb => Some(a.cmp(b)),
            (a, b) => match (text(a), text(b)) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        };
        ordering.ok_or_else(|| {
            PseudoError::type_error(
                format!(
                    "Cannot order a {} and a {}",
                    self.types.name(left.ty),
                    self.types.name(right.ty)
                ),
                Some(span),
            )
        })
    }
}

fn overflow(span: Span) -> PseudoError {
    PseudoError::runtime_error("INTEGER overflow", Some(span)).with_help("use REAL values for very large numbers")
}

fn division_by_zero(span: Span) -> PseudoError {
    PseudoError::runtime_error("Division by zero", Some(span))
}
