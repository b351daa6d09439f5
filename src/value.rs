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

//! Runtime values and variable bindings.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::span::Span;
use crate::types::{PrimitiveType, TypeArena, TypeId};

/// A shared, mutable variable binding.
///
/// BYREF parameters and pointers alias the same binding by cloning the
/// `Rc`; everything else gets its own binding.
pub type VarRef = Rc<RefCell<Variable>>;

/// A named storage slot.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,

    /// The declared type. For `ARRAY OF T` parameters this is the unsized
    /// array type; the value carries the real bounds.
    pub ty: TypeId,

    /// `None` until the variable is initialized.
    pub value: Option<Value>,

    /// False for constants and loop variables.
    pub mutable: bool,

    /// The statement that created the binding.
    pub declared_at: Option<Span>,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: TypeId, value: Option<Value>, mutable: bool, declared_at: Option<Span>) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
            mutable,
            declared_at,
        }
    }

    pub fn into_ref(self) -> VarRef {
        Rc::new(RefCell::new(self))
    }
}

/// The contents of an array variable.
///
/// Elements are stored flat in row-major order.
#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub element: TypeId,
    pub bounds: Vec<(i64, i64)>,
    pub data: Vec<Option<Value>>,
}

impl ArrayValue {
    /// Converts a multi-dimensional index into a flat offset.
    ///
    /// # Returns
    /// - `Ok(offset)` for an in-bounds index
    /// - `Err(message)` naming the offending dimension otherwise
    pub fn offset(&self, indices: &[i64]) -> Result<usize, String> {
        if indices.len() != self.bounds.len() {
            return Err(format!(
                "expected {} {}, found {}",
                self.bounds.len(),
                if self.bounds.len() == 1 { "index" } else { "indices" },
                indices.len()
            ));
        }

        let mut offset: usize = 0;
        for (index, (low, high)) in indices.iter().zip(&self.bounds) {
            if index < low || index > high {
                return Err(format!("index {} is out of bounds {}:{}", index, low, high));
            }
            let length = (high - low + 1) as usize;
            offset = offset * length + (index - low) as usize;
        }
        Ok(offset)
    }
}

/// An instance of a class.
#[derive(Debug, Clone)]
pub struct ClassInstance {
    pub class: TypeId,

    /// One binding per property, inherited properties included. Method
    /// bodies see these bindings directly by name.
    pub properties: HashMap<String, VarRef>,
}

/// A runtime value.
///
/// `Clone` is shallow for class instances and pointers; use
/// [`Value::deep_clone`] at assignment and parameter boundaries.
#[derive(Debug, Clone)]
pub enum Value {
    /* ----------------------------- */
    /* PRIMITIVES                    */
    /* ----------------------------- */
    Integer(i64),
    Real(f64),
    String(String),
    Char(char),
    Boolean(bool),
    Date(NaiveDate),

    /* ----------------------------- */
    /* COMPOSITES                    */
    /* ----------------------------- */
    Array(ArrayValue),

    Record {
        ty: TypeId,
        fields: Vec<Option<Value>>,
    },

    Enum {
        ty: TypeId,
        index: usize,
    },

    Set {
        ty: TypeId,
        values: Vec<Value>,
    },

    /// `None` is a pointer that has not been pointed anywhere.
    Pointer {
        ty: TypeId,
        target: Option<VarRef>,
    },

    Class(Rc<RefCell<ClassInstance>>),
}

impl Value {
    /// The primitive type of a primitive value.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Integer(_) => Some(PrimitiveType::Integer),
            Value::Real(_) => Some(PrimitiveType::Real),
            Value::String(_) => Some(PrimitiveType::String),
            Value::Char(_) => Some(PrimitiveType::Char),
            Value::Boolean(_) => Some(PrimitiveType::Boolean),
            Value::Date(_) => Some(PrimitiveType::Date),
            _ => None,
        }
    }

    /// Copies the value so that no mutable state is shared with the
    /// original. Class instances get fresh property bindings; pointers keep
    /// pointing at the same variable.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(array) => Value::Array(ArrayValue {
                element: array.element,
                bounds: array.bounds.clone(),
                data: array
                    .data
                    .iter()
                    .map(|v| v.as_ref().map(Value::deep_clone))
                    .collect(),
            }),
            Value::Record { ty, fields } => Value::Record {
                ty: *ty,
                fields: fields
                    .iter()
                    .map(|v| v.as_ref().map(Value::deep_clone))
                    .collect(),
            },
            Value::Set { ty, values } => Value::Set {
                ty: *ty,
                values: values.iter().map(Value::deep_clone).collect(),
            },
            Value::Class(instance) => {
                let instance = instance.borrow();
                let properties = instance
                    .properties
                    .iter()
                    .map(|(name, var)| {
                        let var = var.borrow();
                        let copy = Variable {
                            value: var.value.as_ref().map(Value::deep_clone),
                            ..var.clone()
                        };
                        (name.clone(), copy.into_ref())
                    })
                    .collect();
                Value::Class(Rc::new(RefCell::new(ClassInstance {
                    class: instance.class,
                    properties,
                })))
            }
            other => other.clone(),
        }
    }
}

/// A value paired with the type it was produced at.
#[derive(Debug, Clone)]
pub struct TypedValue {
    pub ty: TypeId,
    pub value: Value,
}

impl TypedValue {
    pub fn new(ty: TypeId, value: Value) -> Self {
        Self { ty, value }
    }

    pub fn integer(n: i64) -> Self {
        Self::new(TypeArena::INTEGER, Value::Integer(n))
    }

    pub fn real(n: f64) -> Self {
        Self::new(TypeArena::REAL, Value::Real(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(TypeArena::STRING, Value::String(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(TypeArena::BOOLEAN, Value::Boolean(b))
    }

    /// Wraps a primitive value with its own type. Non-primitive values
    /// must be given an explicit type with [`TypedValue::new`].
    pub fn from_primitive(value: Value) -> Option<Self> {
        value
            .primitive_type()
            .map(|p| Self::new(TypeArena::primitive(p), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_offsets_are_row_major() {
        let array = ArrayValue {
            element: TypeArena::INTEGER,
            bounds: vec![(1, 2), (0, 2)],
            data: vec![None; 6],
        };
        assert_eq!(array.offset(&[1, 0]), Ok(0));
        assert_eq!(array.offset(&[2, 1]), Ok(4));
        assert!(array.offset(&[3, 0]).is_err());
        assert!(array.offset(&[1]).is_err());
    }

    #[test]
    fn deep_clone_detaches_class_properties() {
        let prop = Variable::new("x", TypeArena::INTEGER, Some(Value::Integer(1)), true, None).into_ref();
        let mut properties = HashMap::new();
        properties.insert("x".to_string(), prop.clone());
        let original = Value::Class(Rc::new(RefCell::new(ClassInstance {
            class: TypeId(6),
            properties,
        })));

        let copy = original.deep_clone();
        prop.borrow_mut().value = Some(Value::Integer(2));

        let Value::Class(copy) = copy else {
            panic!("expected class instance");
        };
        let copy = copy.borrow();
        let value = copy.properties["x"].borrow().value.clone();
        assert!(matches!(value, Some(Value::Integer(1))));
    }
}
