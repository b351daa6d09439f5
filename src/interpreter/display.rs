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

//! Rendering values as text for OUTPUT and WRITEFILE.

use std::cell::RefCell;
use std::rc::Rc;

use crate::globals::time::format_date;
use crate::types::TypeArena;
use crate::value::{ArrayValue, ClassInstance, Value};

/// Formats a REAL. Integral values keep a trailing `.0` so they stay
/// distinguishable from INTEGERs.
pub fn format_real(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// Renders any value.
///
/// Primitives render as their literal text without quotes; composite
/// values render their contents, with `?` for uninitialized slots.
pub fn render(types: &TypeArena, value: &Value) -> String {
    Renderer { types, seen: Vec::new() }.value(value)
}

struct Renderer<'a> {
    types: &'a TypeArena,

    /// Instances currently being rendered; a class graph may be cyclic.
    seen: Vec<*const RefCell<ClassInstance>>,
}

impl Renderer<'_> {
    fn value(&mut self, value: &Value) -> String {
        match value {
            Value::Integer(n) => n.to_string(),
            Value::Real(x) => format_real(*x),
            Value::String(s) => s.clone(),
            Value::Char(c) => c.to_string(),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            Value::Date(date) => format_date(date),

            Value::Array(array) => self.array(array, 0, 0).0,

            Value::Record { ty, fields } => {
                let names = self.types.as_record(*ty).map(|r| r.fields.clone()).unwrap_or_default();
                let body = names
                    .iter()
                    .zip(fields)
                    .map(|((name, _), field)| format!("{}: {}", name, self.slot(field.as_ref())))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {{{}}}", self.types.name(*ty), body)
            }

            Value::Enum { ty, index } => self
                .types
                .as_enum(*ty)
                .and_then(|e| e.variants.get(*index).cloned())
                .unwrap_or_else(|| "?".to_string()),

            Value::Set { values, .. } => {
                let body = values.iter().map(|v| self.value(v)).collect::<Vec<_>>().join(", ");
                format!("{{{}}}", body)
            }

            Value::Pointer { target: Some(target), .. } => match target.try_borrow() {
                Ok(var) => format!("^{}", var.name),
                Err(_) => "^?".to_string(),
            },
            Value::Pointer { target: None, .. } => "^(nothing)".to_string(),

            Value::Class(instance) => self.instance(instance),
        }
    }

    fn slot(&mut self, value: Option<&Value>) -> String {
        match value {
            Some(v) => self.value(v),
            None => "?".to_string(),
        }
    }

    /// Renders dimension `dim` starting at flat offset `start`; returns the
    /// text and the offset after it.
    fn array(&mut self, array: &ArrayValue, dim: usize, start: usize) -> (String, usize) {
        let Some((low, high)) = array.bounds.get(dim) else {
            let text = self.slot(array.data.get(start).and_then(Option::as_ref));
            return (text, start + 1);
        };

        let mut offset = start;
        let mut parts = Vec::new();
        for _ in *low..=*high {
            let (text, next) = self.array(array, dim + 1, offset);
            parts.push(text);
            offset = next;
        }
        (format!("[{}]", parts.join(", ")), offset)
    }

    fn instance(&mut self, instance: &Rc<RefCell<ClassInstance>>) -> String {
        let ptr = Rc::as_ptr(instance);
        let Ok(object) = instance.try_borrow() else {
            return "?".to_string();
        };
        let name = self.types.name(object.class);
        if self.seen.contains(&ptr) {
            return format!("{} {{...}}", name);
        }
        self.seen.push(ptr);

        let order = self
            .types
            .as_class(object.class)
            .map(|c| c.properties.iter().map(|p| p.name.clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        let body = order
            .iter()
            .filter_map(|prop| object.properties.get(prop).map(|var| (prop, var)))
            .map(|(prop, var)| {
                let text = match var.try_borrow() {
                    Ok(var) => self.slot(var.value.as_ref()),
                    Err(_) => "?".to_string(),
                };
                format!("{}: {}", prop, text)
            })
            .collect::<Vec<_>>()
            .join(", ");

        self.seen.pop();
        format!("{} {{{}}}", name, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayType, VariableType};

    #[test]
    fn reals_keep_a_fraction() {
        assert_eq!(format_real(5.0), "5.0");
        assert_eq!(format_real(2.5), "2.5");
        assert_eq!(format_real(-0.125), "-0.125");
    }

    #[test]
    fn primitives_render_without_quotes() {
        let types = TypeArena::new();
        assert_eq!(render(&types, &Value::Boolean(true)), "TRUE");
        assert_eq!(render(&types, &Value::String("hi".into())), "hi");
        assert_eq!(render(&types, &Value::Char('x')), "x");
    }

    #[test]
    fn arrays_render_by_dimension() {
        let mut types = TypeArena::new();
        let _ = types.alloc(VariableType::Array(ArrayType {
            element: TypeArena::INTEGER,
            bounds: Some(vec![(1, 2), (1, 2)]),
        }));
        let array = Value::Array(ArrayValue {
            element: TypeArena::INTEGER,
            bounds: vec![(1, 2), (1, 2)],
            data: vec![Some(Value::Integer(1)), Some(Value::Integer(2)), Some(Value::Integer(3)), None],
        });
        assert_eq!(render(&types, &array), "[[1, 2], [3, ?]]");
    }
}
