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

//! Coercion, default values and text parsing.

use crate::error::{PResult, PseudoError};
use crate::globals::time::parse_date;
use crate::interpreter::Runtime;
use crate::span::Span;
use crate::types::{types_assignable, PrimitiveType, TypeArena, TypeId, VariableType};
use crate::value::{ArrayValue, TypedValue, Value};

impl<'r> Runtime<'r> {
    /// Converts a value so it can be stored at type `target`.
    ///
    /// Assignable values pass through (arrays take the target's bounds).
    /// Beyond that only the widening conversions INTEGER → REAL and
    /// CHAR → STRING always apply; REAL → INTEGER and STRING → CHAR depend
    /// on the coercion config.
    pub(crate) fn coerce(&self, tv: TypedValue, target: TypeId, span: Span) -> PResult<Value> {
        if let VariableType::IntegerRange { low, high } = self.types.get(target) {
            let (low, high) = (*low, *high);
            let n = match (&tv.value, self.types.is_integer_like(tv.ty)) {
                (Value::Integer(n), _) => *n,
                (Value::Real(x), false) if self.config.coercion.real_to_int => truncate(*x, span)?,
                _ => return Err(self.mismatch(tv.ty, target, span)),
            };
            if n < low || n > high {
                return Err(PseudoError::runtime_error(
                    format!("Value {} is outside the range {}..{}", n, low, high),
                    Some(span),
                ));
            }
            return Ok(Value::Integer(n));
        }

        match types_assignable(&self.types, self.config, target, tv.ty) {
            Ok(()) => return Ok(self.rebound(tv.value, target)),
            Err(incompatibility) => {
                let converted = match (self.types.get(target), tv.value) {
                    (VariableType::Primitive(PrimitiveType::Real), Value::Integer(n)) => Some(Value::Real(n as f64)),
                    (VariableType::Primitive(PrimitiveType::String), Value::Char(c)) => Some(Value::String(c.to_string())),
                    (VariableType::Primitive(PrimitiveType::Integer), Value::Real(x)) => {
                        if !self.config.coercion.real_to_int {
                            return Err(incompatibility
                                .into_error(format!(
                                    "Cannot store a {} in a {}",
                                    self.types.name(tv.ty),
                                    self.types.name(target)
                                ))
                                .or_span(span)
                                .with_help("use INT(x) or ROUND(x, 0), or set coercion.real_to_int"));
                        }
                        Some(Value::Integer(truncate(x, span)?))
                    }
                    (VariableType::Primitive(PrimitiveType::Char), Value::String(s)) => {
                        let mut chars = s.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) if self.config.coercion.string_to_char => Some(Value::Char(c)),
                            (Some(_), None) => {
                                return Err(PseudoError::type_error(
                                    "Cannot store a STRING in a CHAR",
                                    Some(span),
                                )
                                .with_help("set coercion.string_to_char to allow one-character strings"))
                            }
                            _ => {
                                return Err(PseudoError::runtime_error(
                                    format!("Cannot store the {}-character string \"{}\" in a CHAR", s.chars().count(), s),
                                    Some(span),
                                ))
                            }
                        }
                    }
                    _ => None,
                };
                converted.ok_or_else(|| {
                    incompatibility
                        .into_error(format!(
                            "Cannot store a {} in a {}",
                            self.types.name(tv.ty),
                            self.types.name(target)
                        ))
                        .or_span(span)
                })
            }
        }
    }

    fn mismatch(&self, from: TypeId, to: TypeId, span: Span) -> PseudoError {
        PseudoError::type_error(
            format!("Cannot store a {} in a {}", self.types.name(from), self.types.name(to)),
            Some(span),
        )
    }

    /// Gives an array value the bounds of a sized target array type.
    fn rebound(&self, value: Value, target: TypeId) -> Value {
        match (value, self.types.as_array(target)) {
            (Value::Array(array), Some(ty)) => match &ty.bounds {
                Some(bounds) if *bounds != array.bounds => Value::Array(ArrayValue {
                    element: array.element,
                    bounds: bounds.clone(),
                    data: array.data,
                }),
                _ => Value::Array(array),
            },
            (value, _) => value,
        }
    }

    /// The initial value of a new variable of type `ty`.
    ///
    /// `scalar_default` selects whether scalars start with their configured
    /// default or uninitialized. Array elements follow
    /// `initialization.arrays_default`; records and sets always exist,
    /// class variables start uninitialized.
    pub(crate) fn default_value(&self, ty: TypeId, scalar_default: bool) -> Option<Value> {
        let init = &self.config.initialization;
        match self.types.get(ty) {
            VariableType::Primitive(p) => scalar_default.then(|| match p {
                PrimitiveType::Integer => Value::Integer(init.default_integer),
                PrimitiveType::Real => Value::Real(init.default_real),
                PrimitiveType::String => Value::String(init.default_string.clone()),
                PrimitiveType::Char => Value::Char(init.default_char),
                PrimitiveType::Boolean => Value::Boolean(init.default_boolean),
                PrimitiveType::Date => Value::Date(init.default_date),
            }),
            VariableType::IntegerRange { low, high } => {
                scalar_default.then(|| Value::Integer(init.default_integer.clamp(*low, *high)))
            }
            VariableType::Enum(_) => scalar_default.then_some(Value::Enum { ty, index: 0 }),
            VariableType::Array(array) => {
                let bounds = array.bounds.clone()?;
                let size = crate::types::total_size(&bounds) as usize;
                let element = self.default_value(array.element, init.arrays_default);
                Some(Value::Array(ArrayValue {
                    element: array.element,
                    bounds,
                    data: vec![element; size],
                }))
            }
            VariableType::Record(record) => Some(Value::Record {
                ty,
                fields: record
                    .fields
                    .iter()
                    .map(|(_, field)| self.default_value(*field, scalar_default))
                    .collect(),
            }),
            VariableType::Set(_) => Some(Value::Set { ty, values: Vec::new() }),
            VariableType::Pointer(_) => Some(Value::Pointer { ty, target: None }),
            VariableType::Class(_) => None,
        }
    }

    /// Parses user or file text as a value of type `ty`.
    pub(crate) fn parse_text(&self, text: &str, ty: TypeId, span: Span) -> PResult<Value> {
        let invalid = || {
            PseudoError::runtime_error(
                format!("\"{}\" is not a valid {}", text, self.types.name(ty)),
                Some(span),
            )
        };

        match self.types.get(ty) {
            VariableType::Primitive(PrimitiveType::Integer) => text.trim().parse::<i64>().map(Value::Integer).map_err(|_| invalid()),
            VariableType::Primitive(PrimitiveType::Real) => match text.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Value::Real(x)),
                _ => Err(invalid()),
            },
            VariableType::Primitive(PrimitiveType::String) => Ok(Value::String(text.to_string())),
            VariableType::Primitive(PrimitiveType::Char) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(invalid().with_help("enter exactly one character")),
                }
            }
            VariableType::Primitive(PrimitiveType::Boolean) => match text.trim() {
                "TRUE" => Ok(Value::Boolean(true)),
                "FALSE" => Ok(Value::Boolean(false)),
                _ => Err(invalid().with_help("enter TRUE or FALSE")),
            },
            VariableType::Primitive(PrimitiveType::Date) => parse_date(text.trim())
                .map(Value::Date)
                .ok_or_else(|| invalid().with_help("enter a date as DD/MM/YYYY")),
            VariableType::IntegerRange { low, high } => {
                let n = text.trim().parse::<i64>().map_err(|_| invalid())?;
                if n < *low || n > *high {
                    return Err(invalid().with_detail(format!("the value must be between {} and {}", low, high)));
                }
                Ok(Value::Integer(n))
            }
            VariableType::Enum(e) => e
                .variants
                .iter()
                .position(|v| v == text.trim())
                .map(|index| Value::Enum { ty, index })
                .ok_or_else(|| invalid().with_help(format!("enter one of: {}", e.variants.join(", ")))),
            _ => Err(PseudoError::runtime_error(
                format!("Cannot read a value of type {} from text", self.types.name(ty)),
                Some(span),
            )),
        }
    }
}

/// REAL → INTEGER, toward zero.
fn truncate(x: f64, span: Span) -> PResult<i64> {
    let x = x.trunc();
    if !x.is_finite() || x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err(PseudoError::runtime_error(
            format!("{} does not fit in an INTEGER", x),
            Some(span),
        ));
    }
    Ok(x as i64)
}

/// Whether a value of `ty` can be written as a single line of text.
pub(crate) fn is_text_type(types: &TypeArena, ty: TypeId) -> bool {
    matches!(
        types.get(ty),
        VariableType::Primitive(_) | VariableType::IntegerRange { .. } | VariableType::Enum(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::filesystem::MemoryFileSystem;
    use crate::globals::Builtins;
    use crate::io::CapturedIo;

    #[test]
    fn widening_conversions_always_apply() {
        let config = Config::default();
        let builtins = Builtins::standard();
        let mut io = CapturedIo::new();
        let mut fs = MemoryFileSystem::new();
        let rt = Runtime::new(&config, &builtins, &mut io, &mut fs);

        let span = Span::default();
        assert!(matches!(rt.coerce(TypedValue::integer(3), TypeArena::REAL, span), Ok(Value::Real(x)) if x == 3.0));
        assert!(rt.coerce(TypedValue::real(3.5), TypeArena::INTEGER, span).is_err());
        assert!(matches!(
            rt.coerce(TypedValue::string("a"), TypeArena::CHAR, span),
            Ok(Value::Char('a'))
        ));
        assert!(rt.coerce(TypedValue::string("ab"), TypeArena::CHAR, span).is_err());
    }

    #[test]
    fn real_to_int_truncates_when_enabled() {
        let mut config = Config::default();
        config.coercion.real_to_int = true;
        let builtins = Builtins::standard();
        let mut io = CapturedIo::new();
        let mut fs = MemoryFileSystem::new();
        let rt = Runtime::new(&config, &builtins, &mut io, &mut fs);

        assert!(matches!(
            rt.coerce(TypedValue::real(-3.7), TypeArena::INTEGER, Span::default()),
            Ok(Value::Integer(-3))
        ));
    }

    #[test]
    fn parse_text_by_type() {
        let config = Config::default();
        let builtins = Builtins::standard();
        let mut io = CapturedIo::new();
        let mut fs = MemoryFileSystem::new();
        let rt = Runtime::new(&config, &builtins, &mut io, &mut fs);

        let span = Span::default();
        assert!(matches!(rt.parse_text(" 42 ", TypeArena::INTEGER, span), Ok(Value::Integer(42))));
        assert!(matches!(rt.parse_text("TRUE", TypeArena::BOOLEAN, span), Ok(Value::Boolean(true))));
        assert!(rt.parse_text("yes", TypeArena::BOOLEAN, span).is_err());
        assert!(rt.parse_text("31/02/2024", TypeArena::DATE, span).is_err());
        assert!(matches!(rt.parse_text("x", TypeArena::CHAR, span), Ok(Value::Char('x'))));
    }
}
