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

//! Type equality, assignability and override compatibility.

use std::collections::HashSet;

use crate::config::Config;
use crate::error::{PResult, PseudoError};
use crate::types::{PrimitiveType, Routine, TypeArena, TypeId, VariableType};

/// Why one type cannot be used where another is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct Incompatibility {
    pub reason: String,
    /// A suggestion, sometimes naming the config option that would allow it.
    pub help: Option<String>,
}

impl Incompatibility {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            help: None,
        }
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Converts into a type error.
    pub fn into_error(self, message: impl Into<String>) -> PseudoError {
        let err = PseudoError::type_error(message, None).with_detail(self.reason);
        match self.help {
            Some(help) => err.with_help(help),
            None => err,
        }
    }
}

/* ============================================================================
 * Equality
 * ============================================================================
 */

/// Structural type equality.
///
/// Records, enums and classes are nominal: equal only to themselves.
/// Arrays, pointers, sets and ranges compare structurally. Pointer cycles
/// are handled by assuming a pair already under comparison is equal.
pub fn types_equal(arena: &TypeArena, a: TypeId, b: TypeId) -> bool {
    equal_inner(arena, a, b, &mut HashSet::new())
}

fn equal_inner(arena: &TypeArena, a: TypeId, b: TypeId, visited: &mut HashSet<(TypeId, TypeId)>) -> bool {
    if a == b {
        return true;
    }
    if !visited.insert((a, b)) {
        return true;
    }

    match (arena.get(a), arena.get(b)) {
        (VariableType::Primitive(x), VariableType::Primitive(y)) => x == y,
        (VariableType::Array(x), VariableType::Array(y)) => {
            x.bounds == y.bounds && equal_inner(arena, x.element, y.element, visited)
        }
        (VariableType::Pointer(x), VariableType::Pointer(y)) => match (x.target, y.target) {
            (Some(p), Some(q)) => equal_inner(arena, p, q, visited),
            _ => false,
        },
        (VariableType::Set(x), VariableType::Set(y)) => equal_inner(arena, x.element, y.element, visited),
        (
            VariableType::IntegerRange { low: l1, high: h1 },
            VariableType::IntegerRange { low: l2, high: h2 },
        ) => l1 == l2 && h1 == h2,
        _ => false,
    }
}

/* ============================================================================
 * Assignability
 * ============================================================================
 */

/// Can a value of type `ext` be stored where `base` is expected?
///
/// # Returns
/// - `Ok(())` when it can
/// - `Err(incompatibility)` with the reason otherwise
pub fn types_assignable(arena: &TypeArena, config: &Config, base: TypeId, ext: TypeId) -> Result<(), Incompatibility> {
    if types_equal(arena, base, ext) {
        return Ok(());
    }

    let mismatch = || {
        Incompatibility::new(format!(
            "type {} is not assignable to type {}",
            arena.name(ext),
            arena.name(base)
        ))
    };

    match (arena.get(base), arena.get(ext)) {
        (VariableType::Primitive(PrimitiveType::Integer), VariableType::IntegerRange { .. }) => Ok(()),

        (
            VariableType::IntegerRange { low, high },
            VariableType::IntegerRange { low: ext_low, high: ext_high },
        ) => {
            if low <= ext_low && ext_high <= high {
                Ok(())
            } else {
                Err(Incompatibility::new(format!(
                    "range {}..{} does not fit inside range {}..{}",
                    ext_low, ext_high, low, high
                )))
            }
        }

        (VariableType::Array(b), VariableType::Array(e)) => {
            if !types_equal(arena, b.element, e.element) {
                return Err(Incompatibility::new(format!(
                    "array element types differ: {} and {}",
                    arena.name(e.element),
                    arena.name(b.element)
                )));
            }

            let (base_bounds, ext_bounds) = match (&b.bounds, &e.bounds) {
                (None, _) => return Ok(()),
                (Some(_), None) => {
                    return Err(Incompatibility::new(
                        "an array of unknown size cannot be stored in a fixed-size array",
                    ))
                }
                (Some(base_bounds), Some(ext_bounds)) => (base_bounds, ext_bounds),
            };

            let lengths = |bounds: &[(i64, i64)]| {
                bounds
                    .iter()
                    .map(|(low, high)| high - low + 1)
                    .collect::<Vec<_>>()
            };

            if config.coercion.arrays_same_length && lengths(base_bounds) == lengths(ext_bounds) {
                return Ok(());
            }
            if config.coercion.arrays_same_total_size
                && crate::types::total_size(base_bounds) == crate::types::total_size(ext_bounds)
            {
                return Ok(());
            }

            let err = Incompatibility::new(format!(
                "array bounds differ: {} and {}",
                arena.name(ext),
                arena.name(base)
            ));
            Err(if crate::types::total_size(base_bounds) == crate::types::total_size(ext_bounds) {
                err.with_help(if lengths(base_bounds) == lengths(ext_bounds) {
                    "set coercion.arrays_same_length to allow arrays with the same lengths"
                } else {
                    "set coercion.arrays_same_total_size to allow arrays with the same number of elements"
                })
            } else {
                err
            })
        }

        (VariableType::Pointer(_), VariableType::Pointer(_)) => Err(Incompatibility::new(format!(
            "pointer types {} and {} point to different types",
            arena.name(ext),
            arena.name(base)
        ))),

        (VariableType::Set(_), VariableType::Set(_)) => Err(Incompatibility::new(format!(
            "set types {} and {} have different element types",
            arena.name(ext),
            arena.name(base)
        ))),

        (VariableType::Class(_), VariableType::Class(_)) => {
            if arena.is_subclass(ext, base) {
                Ok(())
            } else {
                Err(Incompatibility::new(format!(
                    "class {} does not inherit from {}",
                    arena.name(ext),
                    arena.name(base)
                )))
            }
        }

        _ => Err(mismatch()),
    }
}

/* ============================================================================
 * Overrides
 * ============================================================================
 */

/// Checks that every method of `derived` that overrides a method of `base`
/// keeps a compatible signature.
///
/// - access modifier, routine kind, parameter count and pass modes must match
/// - parameter types may only widen (the base parameter type must be
///   assignable to the derived one)
/// - return types may only narrow (the derived return type must be
///   assignable to the base one)
///
/// The constructor NEW is exempt from the parameter rules.
pub fn check_class_methods_compatible(arena: &TypeArena, config: &Config, base: TypeId, derived: TypeId) -> PResult<()> {
    let (Some(base_class), Some(derived_class)) = (arena.as_class(base), arena.as_class(derived)) else {
        return Ok(());
    };

    for name in &derived_class.own_methods {
        let (Some(base_method), Some(derived_method)) =
            (base_class.all_methods.get(name), derived_class.all_methods.get(name))
        else {
            continue;
        };

        check_override(arena, config, base_method, derived_method).map_err(|incompatibility| {
            incompatibility.into_error(format!(
                "Method {} of class {} is not compatible with the method it overrides in {}",
                name, derived_class.name, base_class.name
            ))
        })?;
    }

    Ok(())
}

fn check_override(arena: &TypeArena, config: &Config, base: &Routine, derived: &Routine) -> Result<(), Incompatibility> {
    if base.access != derived.access {
        return Err(Incompatibility::new(format!(
            "it is {} but the overridden method is {}",
            derived.access.keyword(),
            base.access.keyword()
        )));
    }

    if base.kind != derived.kind {
        return Err(Incompatibility::new(format!(
            "it is a {} but the overridden method is a {}",
            derived.kind.keyword(),
            base.kind.keyword()
        )));
    }

    if !base.is_constructor() {
        if base.params.len() != derived.params.len() {
            return Err(Incompatibility::new(format!(
                "it takes {} parameters but the overridden method takes {}",
                derived.params.len(),
                base.params.len()
            )));
        }

        for (b, d) in base.params.iter().zip(&derived.params) {
            if b.mode != d.mode {
                return Err(Incompatibility::new(format!(
                    "parameter {} is {} but the overridden parameter is {}",
                    d.name,
                    d.mode.keyword(),
                    b.mode.keyword()
                )));
            }
            types_assignable(arena, config, d.ty, b.ty).map_err(|inner| {
                Incompatibility::new(format!(
                    "parameter {} has type {}, which does not accept every {} ({})",
                    d.name,
                    arena.name(d.ty),
                    arena.name(b.ty),
                    inner.reason
                ))
            })?;
        }
    }

    if let (Some(base_ret), Some(derived_ret)) = (base.returns, derived.returns) {
        types_assignable(arena, config, base_ret, derived_ret).map_err(|inner| {
            Incompatibility::new(format!(
                "it returns {}, which is not assignable to {} ({})",
                arena.name(derived_ret),
                arena.name(base_ret),
                inner.reason
            ))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayType, PointerType};

    #[test]
    fn self_referential_pointers_compare_equal() {
        let mut arena = TypeArena::new();
        let a = arena.alloc(VariableType::Pointer(PointerType {
            name: "A".into(),
            target: None,
        }));
        let b = arena.alloc(VariableType::Pointer(PointerType {
            name: "B".into(),
            target: None,
        }));
        arena.set(a, VariableType::Pointer(PointerType { name: "A".into(), target: Some(a) }));
        arena.set(b, VariableType::Pointer(PointerType { name: "B".into(), target: Some(b) }));
        assert!(types_equal(&arena, a, b));
    }

    #[test]
    fn ranges_nest() {
        let mut arena = TypeArena::new();
        let config = Config::default();
        let wide = arena.alloc(VariableType::IntegerRange { low: 1, high: 10 });
        let narrow = arena.alloc(VariableType::IntegerRange { low: 2, high: 5 });
        assert!(types_assignable(&arena, &config, wide, narrow).is_ok());
        assert!(types_assignable(&arena, &config, narrow, wide).is_err());
        assert!(types_assignable(&arena, &config, TypeArena::INTEGER, narrow).is_ok());
        assert!(types_assignable(&arena, &config, narrow, TypeArena::INTEGER).is_err());
    }

    #[test]
    fn unsized_array_accepts_any_bounds() {
        let mut arena = TypeArena::new();
        let config = Config::default();
        let open = arena.alloc(VariableType::Array(ArrayType { element: TypeArena::INTEGER, bounds: None }));
        let sized = arena.alloc(VariableType::Array(ArrayType {
            element: TypeArena::INTEGER,
            bounds: Some(vec![(1, 5)]),
        }));
        let reals = arena.alloc(VariableType::Array(ArrayType {
            element: TypeArena::REAL,
            bounds: Some(vec![(1, 5)]),
        }));
        assert!(types_assignable(&arena, &config, open, sized).is_ok());
        assert!(types_assignable(&arena, &config, open, reals).is_err());
        assert!(types_assignable(&arena, &config, sized, open).is_err());
    }
}
