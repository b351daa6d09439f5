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

//! Concrete types.
//!
//! Types live in an arena and are referenced by [`TypeId`]. This keeps
//! self-referential pointer types (`TYPE Node = ^Node` style chains through
//! records) and class hierarchies (whose method tables reference their base
//! class) free of reference cycles: the graph is made of indices.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::class::AccessModifier;
use crate::ast::param::PassMode;
use crate::ast::stmt::BranchNode;

/// Type compatibility rules
pub mod compat;

pub use compat::{check_class_methods_compatible, types_assignable, types_equal, Incompatibility};

/// Handle to a type stored in a [`TypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/* ============================================================================
 * Type Variants
 * ============================================================================
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Real,
    String,
    Char,
    Boolean,
    Date,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::Integer,
        PrimitiveType::Real,
        PrimitiveType::String,
        PrimitiveType::Char,
        PrimitiveType::Boolean,
        PrimitiveType::Date,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
            PrimitiveType::String => "STRING",
            PrimitiveType::Char => "CHAR",
            PrimitiveType::Boolean => "BOOLEAN",
            PrimitiveType::Date => "DATE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub element: TypeId,
    /// Inclusive bounds per dimension; `None` for `ARRAY OF T` parameters.
    pub bounds: Option<Vec<(i64, i64)>>,
}

impl ArrayType {
    pub fn total_size(&self) -> Option<u64> {
        self.bounds.as_ref().map(|bounds| total_size(bounds))
    }
}

/// Number of elements described by a list of inclusive bounds.
pub fn total_size(bounds: &[(i64, i64)]) -> u64 {
    bounds
        .iter()
        .map(|(low, high)| high.saturating_sub(*low).saturating_add(1).max(0) as u64)
        .fold(1u64, |acc, len| acc.saturating_mul(len))
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerType {
    pub name: String,
    /// `None` only while the target is being resolved.
    pub target: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<(String, TypeId)>,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<(usize, TypeId)> {
        self.fields
            .iter()
            .position(|(field, _)| field == name)
            .map(|index| (index, self.fields[index].1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetType {
    pub name: String,
    pub element: TypeId,
}

/// Whether a routine returns a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Function,
    Procedure,
}

impl RoutineKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RoutineKind::Function => "FUNCTION",
            RoutineKind::Procedure => "PROCEDURE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeId,
    pub mode: PassMode,
}

/// A resolved function, procedure or method.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub kind: RoutineKind,
    pub access: AccessModifier,
    pub params: Vec<ParamDef>,
    pub returns: Option<TypeId>,
    pub body: Rc<BranchNode>,
    /// The class that declares this method, for methods.
    pub owner: Option<TypeId>,
}

impl Routine {
    pub fn is_constructor(&self) -> bool {
        self.name == "NEW"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeId,
    pub access: AccessModifier,
    pub owner: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub name: String,
    pub base: Option<TypeId>,
    /// Every property, inherited ones first.
    pub properties: Vec<PropertyDef>,
    /// Names of the methods declared by this class itself.
    pub own_methods: Vec<String>,
    /// Every callable method, own methods overriding inherited ones.
    pub all_methods: HashMap<String, Rc<Routine>>,
}

impl ClassType {
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Every type a variable can have.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableType {
    Primitive(PrimitiveType),
    Array(ArrayType),
    Pointer(PointerType),
    Record(RecordType),
    Enum(EnumType),
    Set(SetType),
    Class(ClassType),
    /// An INTEGER restricted to `low..=high`.
    IntegerRange { low: i64, high: i64 },
}

/* ============================================================================
 * Arena
 * ============================================================================
 */

/// Owns every type created while a program runs.
///
/// The six primitives are allocated first, at fixed ids.
#[derive(Debug, Clone)]
pub struct TypeArena {
    types: Vec<VariableType>,

    /// Anonymous array and range types, shared by every declaration that
    /// spells the same type.
    interned: HashMap<Interned, TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Interned {
    Array(TypeId, Option<Vec<(i64, i64)>>),
    Range(i64, i64),
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub const INTEGER: TypeId = TypeId(0);
    pub const REAL: TypeId = TypeId(1);
    pub const STRING: TypeId = TypeId(2);
    pub const CHAR: TypeId = TypeId(3);
    pub const BOOLEAN: TypeId = TypeId(4);
    pub const DATE: TypeId = TypeId(5);

    pub fn new() -> Self {
        Self {
            types: PrimitiveType::ALL
                .into_iter()
                .map(VariableType::Primitive)
                .collect(),
            interned: HashMap::new(),
        }
    }

    pub fn primitive(p: PrimitiveType) -> TypeId {
        match p {
            PrimitiveType::Integer => Self::INTEGER,
            PrimitiveType::Real => Self::REAL,
            PrimitiveType::String => Self::STRING,
            PrimitiveType::Char => Self::CHAR,
            PrimitiveType::Boolean => Self::BOOLEAN,
            PrimitiveType::Date => Self::DATE,
        }
    }

    pub fn alloc(&mut self, ty: VariableType) -> TypeId {
        self.types.push(ty);
        TypeId(self.types.len() - 1)
    }

    /// The array type with the given element type and bounds.
    pub fn array(&mut self, element: TypeId, bounds: Option<Vec<(i64, i64)>>) -> TypeId {
        let key = Interned::Array(element, bounds.clone());
        if let Some(id) = self.interned.get(&key) {
            return *id;
        }
        let id = self.alloc(VariableType::Array(ArrayType { element, bounds }));
        self.interned.insert(key, id);
        id
    }

    /// The integer range type `low..high`.
    pub fn range(&mut self, low: i64, high: i64) -> TypeId {
        let key = Interned::Range(low, high);
        if let Some(id) = self.interned.get(&key) {
            return *id;
        }
        let id = self.alloc(VariableType::IntegerRange { low, high });
        self.interned.insert(key, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &VariableType {
        &self.types[id.0]
    }

    /// Replaces a type, used to finish types allocated before their
    /// contents were known (pointers, classes).
    pub fn set(&mut self, id: TypeId, ty: VariableType) {
        self.types[id.0] = ty;
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_primitive(&self, id: TypeId, p: PrimitiveType) -> bool {
        matches!(self.get(id), VariableType::Primitive(q) if *q == p)
    }

    /// INTEGER or an integer range.
    pub fn is_integer_like(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            VariableType::Primitive(PrimitiveType::Integer) | VariableType::IntegerRange { .. }
        )
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.is_integer_like(id) || self.is_primitive(id, PrimitiveType::Real)
    }

    pub fn as_array(&self, id: TypeId) -> Option<&ArrayType> {
        match self.get(id) {
            VariableType::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_record(&self, id: TypeId) -> Option<&RecordType> {
        match self.get(id) {
            VariableType::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_class(&self, id: TypeId) -> Option<&ClassType> {
        match self.get(id) {
            VariableType::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_enum(&self, id: TypeId) -> Option<&EnumType> {
        match self.get(id) {
            VariableType::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// True if `class` is `ancestor` or inherits from it.
    pub fn is_subclass(&self, class: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(class);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.types.len() {
                return false;
            }
            current = self.as_class(id).and_then(|c| c.base);
        }
        false
    }

    /// A readable name for diagnostics and INPUT prompts.
    pub fn name(&self, id: TypeId) -> String {
        TypeName { arena: self, id }.to_string()
    }
}

struct TypeName<'a> {
    arena: &'a TypeArena,
    id: TypeId,
}

impl fmt::Display for TypeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arena.get(self.id) {
            VariableType::Primitive(p) => write!(f, "{}", p.name()),
            VariableType::Array(array) => {
                match &array.bounds {
                    Some(bounds) => {
                        let dims = bounds
                            .iter()
                            .map(|(low, high)| format!("{}:{}", low, high))
                            .collect::<Vec<_>>()
                            .join(", ");
                        write!(f, "ARRAY[{}] OF ", dims)?;
                    }
                    None => write!(f, "ARRAY OF ")?,
                }
                write!(f, "{}", self.arena.name(array.element))
            }
            VariableType::Pointer(p) => write!(f, "{}", p.name),
            VariableType::Record(r) => write!(f, "{}", r.name),
            VariableType::Enum(e) => write!(f, "{}", e.name),
            VariableType::Set(s) => write!(f, "{}", s.name),
            VariableType::Class(c) => write!(f, "{}", c.name),
            VariableType::IntegerRange { low, high } => write!(f, "{}..{}", low, high),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_have_fixed_ids() {
        let arena = TypeArena::new();
        assert_eq!(arena.name(TypeArena::DATE), "DATE");
        assert_eq!(PrimitiveType::from_name("REAL"), Some(PrimitiveType::Real));
        assert_eq!(PrimitiveType::from_name("real"), None);
    }

    #[test]
    fn array_names_and_sizes() {
        let mut arena = TypeArena::new();
        let id = arena.alloc(VariableType::Array(ArrayType {
            element: TypeArena::CHAR,
            bounds: Some(vec![(1, 3), (0, 4)]),
        }));
        assert_eq!(arena.name(id), "ARRAY[1:3, 0:4] OF CHAR");
        assert_eq!(arena.as_array(id).and_then(ArrayType::total_size), Some(15));
    }

    #[test]
    fn anonymous_types_are_shared() {
        let mut arena = TypeArena::new();
        let a = arena.array(TypeArena::INTEGER, Some(vec![(1, 10)]));
        let b = arena.array(TypeArena::INTEGER, Some(vec![(1, 10)]));
        let c = arena.array(TypeArena::INTEGER, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(arena.range(1, 5), arena.range(1, 5));
    }
}
