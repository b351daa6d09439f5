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

//! Assignable locations.
//!
//! A [`Place`] is a variable binding plus a path into its value (array
//! elements, record fields). Class properties and pointer targets are
//! bindings of their own, so reaching one re-roots the place on that
//! binding instead of extending the path.

use crate::ast::expr::{ExprNode, Operator};
use crate::error::{PResult, PseudoError};
use crate::interpreter::Runtime;
use crate::lexer::token::TokenKind;
use crate::span::Span;
use crate::types::{TypeId, VariableType};
use crate::value::{TypedValue, Value, VarRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Flat offset into an array.
    Index(usize),
    /// Field position in a record.
    Field(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Place {
    pub root: VarRef,
    pub path: Vec<Step>,
    pub ty: TypeId,
    /// Source text, for messages.
    pub text: String,
}

impl<'r> Runtime<'r> {
    /// Whether `expr` denotes storage rather than a computed value.
    pub(crate) fn is_place_expr(&self, expr: &ExprNode) -> bool {
        match expr {
            ExprNode::Leaf(token) if token.kind == TokenKind::Name => self.lookup_variable(&token.text).is_some(),
            ExprNode::ArrayAccess { target, .. } => self.is_place_expr(target),
            ExprNode::Branch {
                operator: Operator::Access,
                operands,
                ..
            } => matches!(operands.first(), Some(left) if self.is_place_expr(left)),
            ExprNode::Branch {
                operator: Operator::PointerDereference,
                ..
            } => true,
            _ => false,
        }
    }

    /// Resolves an expression to the storage it names.
    pub(crate) fn place(&mut self, expr: &ExprNode) -> PResult<Place> {
        match expr {
            ExprNode::Leaf(token) if token.kind == TokenKind::Name => {
                let root = self.variable(&token.text, token.span)?;
                let ty = root.borrow().ty;
                Ok(Place {
                    root,
                    path: Vec::new(),
                    ty,
                    text: token.text.clone(),
                })
            }

            ExprNode::ArrayAccess { target, indices, span } => {
                let mut place = self.place(target)?;
                let element = match self.types.as_array(place.ty) {
                    Some(array) => array.element,
                    None => {
                        return Err(PseudoError::type_error(
                            format!("\"{}\" is a {}, not an array", place.text, self.types.name(place.ty)),
                            Some(target.span()),
                        ))
                    }
                };
                let indices = self.eval_indices(indices)?;
                let offset = self.peek(&place, *span, |value| match value {
                    Value::Array(array) => array
                        .offset(&indices)
                        .map_err(|reason| PseudoError::runtime_error(format!("Cannot index \"{}\": {}", place.text, reason), Some(*span))),
                    _ => Err(PseudoError::runtime_error(format!("\"{}\" is not an array", place.text), Some(*span))),
                })?;
                place.path.push(Step::Index(offset));
                place.ty = element;
                place.text = expr.fmt_text();
                Ok(place)
            }

            ExprNode::Branch {
                operator: Operator::Access,
                operands,
                span,
                ..
            } => {
                let [left, right] = operands.as_slice() else {
                    return Err(PseudoError::runtime_error("Malformed member access", Some(*span)));
                };
                let member = right
                    .as_name()
                    .ok_or_else(|| PseudoError::runtime_error("Expected a member name after \".\"", Some(right.span())))?;
                let mut place = self.place(left)?;

                if let Some(record) = self.types.as_record(place.ty) {
                    let (index, field_ty) = record.field(&member.text).ok_or_else(|| {
                        PseudoError::runtime_error(
                            format!("Record {} has no field \"{}\"", record.name, member.text),
                            Some(member.span),
                        )
                    })?;
                    place.path.push(Step::Field(index));
                    place.ty = field_ty;
                    place.text = expr.fmt_text();
                    return Ok(place);
                }

                if self.types.as_class(place.ty).is_some() {
                    let instance = self.peek(&place, *span, |value| match value {
                        Value::Class(instance) => Ok(instance.clone()),
                        _ => Err(PseudoError::runtime_error(format!("\"{}\" is not an object", place.text), Some(*span))),
                    })?;
                    let (root, ty) = self.property_binding(&instance, &member.text, member.span)?;
                    return Ok(Place {
                        root,
                        path: Vec::new(),
                        ty,
                        text: expr.fmt_text(),
                    });
                }

                Err(PseudoError::type_error(
                    format!("\"{}\" is a {}, which has no members", place.text, self.types.name(place.ty)),
                    Some(left.span()),
                ))
            }

            ExprNode::Branch {
                operator: Operator::PointerDereference,
                operands,
                span,
                ..
            } => {
                let pointer = match operands.first() {
                    Some(operand) => self.eval(operand, None)?,
                    None => return Err(PseudoError::runtime_error("Malformed dereference", Some(*span))),
                };
                let (root, ty) = self.pointer_target(&pointer, *span)?;
                Ok(Place {
                    root,
                    path: Vec::new(),
                    ty,
                    text: expr.fmt_text(),
                })
            }

            other => Err(PseudoError::runtime_error(
                format!("\"{}\" cannot be assigned to", other.fmt_text()),
                Some(other.span()),
            )
            .with_help("only variables, array elements, fields, properties and dereferenced pointers can be assigned")),
        }
    }

    /// The binding a pointer value points at, with the pointed-to type.
    pub(crate) fn pointer_target(&self, pointer: &TypedValue, span: Span) -> PResult<(VarRef, TypeId)> {
        let target_ty = match self.types.get(pointer.ty) {
            VariableType::Pointer(p) => p.target,
            _ => None,
        };
        match (&pointer.value, target_ty) {
            (Value::Pointer { target: Some(var), .. }, Some(ty)) => Ok((var.clone(), ty)),
            (Value::Pointer { target: None, .. }, _) => Err(PseudoError::runtime_error(
                "The pointer does not point to anything",
                Some(span),
            )),
            _ => Err(PseudoError::type_error(
                format!("Cannot dereference a {}", self.types.name(pointer.ty)),
                Some(span),
            )),
        }
    }

    /// Evaluates array indices.
    pub(crate) fn eval_indices(&mut self, indices: &[ExprNode]) -> PResult<Vec<i64>> {
        indices.iter().map(|index| self.eval_integer(index)).collect()
    }

    /// Runs `f` on the current value of a place without copying it.
    pub(crate) fn peek<T>(&self, place: &Place, span: Span, f: impl FnOnce(&Value) -> PResult<T>) -> PResult<T> {
        let var = place.root.try_borrow().map_err(|_| busy(&place.text, span))?;
        let mut current = var.value.as_ref();
        for step in &place.path {
            current = match (current, step) {
                (Some(Value::Array(array)), Step::Index(offset)) => array.data.get(*offset).and_then(Option::as_ref),
                (Some(Value::Record { fields, .. }), Step::Field(index)) => fields.get(*index).and_then(Option::as_ref),
                _ => None,
            };
        }
        match current {
            Some(value) => f(value),
            None => Err(uninitialized(&place.text, span)),
        }
    }

    /// Reads the value stored at a place.
    pub(crate) fn read_place(&mut self, place: &Place, span: Span) -> PResult<TypedValue> {
        let value = self.peek(place, span, |value| Ok(value.clone()))?;
        Ok(TypedValue::new(self.value_type(&value, place.ty), value))
    }

    /// The precise type of a value stored at a place of type `declared`.
    ///
    /// Objects carry their own class; unsized array parameters carry their
    /// bounds in the value.
    pub(crate) fn value_type(&mut self, value: &Value, declared: TypeId) -> TypeId {
        match value {
            Value::Class(instance) => instance.try_borrow().map(|i| i.class).unwrap_or(declared),
            Value::Array(array) if matches!(self.types.as_array(declared), Some(ty) if ty.bounds.is_none()) => {
                self.types.array(array.element, Some(array.bounds.clone()))
            }
            _ => declared,
        }
    }

    /// Stores a value at a place.
    ///
    /// # Errors
    /// Fails for read-only bindings (constants, loop variables) and for
    /// paths through uninitialized values.
    pub(crate) fn write_place(&self, place: &Place, value: Value, span: Span) -> PResult<()> {
        let mut var = place.root.try_borrow_mut().map_err(|_| busy(&place.text, span))?;
        if !var.mutable {
            return Err(PseudoError::runtime_error(
                format!("Cannot assign to \"{}\", which is read-only", var.name),
                Some(span),
            ));
        }

        let mut slot = &mut var.value;
        for step in &place.path {
            let current = match slot {
                Some(value) => value,
                None => return Err(uninitialized(&place.text, span)),
            };
            slot = match (current, step) {
                (Value::Array(array), Step::Index(offset)) => array
                    .data
                    .get_mut(*offset)
                    .ok_or_else(|| PseudoError::runtime_error(format!("Index into \"{}\" is out of bounds", place.text), Some(span)))?,
                (Value::Record { fields, .. }, Step::Field(index)) => fields
                    .get_mut(*index)
                    .ok_or_else(|| PseudoError::runtime_error(format!("No such field in \"{}\"", place.text), Some(span)))?,
                _ => return Err(PseudoError::runtime_error(format!("\"{}\" changed shape", place.text), Some(span))),
            };
        }
        *slot = Some(value);
        Ok(())
    }

    /// Coerces a value to a place's type and stores a private copy of it.
    pub(crate) fn assign(&mut self, place: &Place, tv: TypedValue, span: Span) -> PResult<()> {
        let value = self.coerce(tv, place.ty, span)?;
        self.write_place(place, value.deep_clone(), span)
    }
}

fn uninitialized(text: &str, span: Span) -> PseudoError {
    PseudoError::runtime_error(format!("\"{}\" is used before it has a value", text), Some(span))
        .with_help("assign a value first, or set initialization.normal_variables_default")
}

fn busy(text: &str, span: Span) -> PseudoError {
    PseudoError::runtime_error(format!("\"{}\" is already in use by this statement", text), Some(span))
}
