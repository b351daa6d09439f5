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

//! Builtin function registry.
//!
//! Builtins are leaf computations over primitive values. The table is built
//! once with [`Builtins::standard`] and passed by reference to the runtime.

use std::collections::HashMap;

use crate::interpreter::files::FileTable;
use crate::value::Value;

/// String functions: LEFT, RIGHT, MID, LENGTH, case conversion, number parsing
pub mod string;

/// Math functions: INT, RAND, RANDOMBETWEEN, ROUND, POW, EXP, SQRT, trigonometry
pub mod math;

/// Date functions: DAY, MONTH, YEAR, DAYINDEX, SETDATE, TODAY
pub mod time;

/// File queries: EOF
pub mod files;

/// What a builtin parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    Integer,
    /// REAL; INTEGER arguments are converted.
    Real,
    /// INTEGER or REAL, passed through unchanged.
    Number,
    /// STRING; CHAR arguments are converted.
    String,
    /// CHAR; one-character STRING arguments are converted.
    Char,
    /// STRING or CHAR, passed through unchanged.
    Text,
    Boolean,
    Date,
}

impl BuiltinType {
    pub fn describe(&self) -> &'static str {
        match self {
            BuiltinType::Integer => "an INTEGER",
            BuiltinType::Real => "a REAL",
            BuiltinType::Number => "a number",
            BuiltinType::String => "a STRING",
            BuiltinType::Char => "a CHAR",
            BuiltinType::Text => "a STRING or CHAR",
            BuiltinType::Boolean => "a BOOLEAN",
            BuiltinType::Date => "a DATE",
        }
    }

    /// Converts an argument to the form the builtin expects.
    ///
    /// # Returns
    /// - `Some(value)` if the argument is acceptable
    /// - `None` otherwise
    pub fn accept(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (BuiltinType::Integer, v @ Value::Integer(_)) => Some(v),
            (BuiltinType::Real, Value::Integer(n)) => Some(Value::Real(n as f64)),
            (BuiltinType::Real, v @ Value::Real(_)) => Some(v),
            (BuiltinType::Number, v @ (Value::Integer(_) | Value::Real(_))) => Some(v),
            (BuiltinType::String, v @ Value::String(_)) => Some(v),
            (BuiltinType::String, Value::Char(c)) => Some(Value::String(c.to_string())),
            (BuiltinType::Char, v @ Value::Char(_)) => Some(v),
            (BuiltinType::Char, Value::String(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            (BuiltinType::Text, v @ (Value::String(_) | Value::Char(_))) => Some(v),
            (BuiltinType::Boolean, v @ Value::Boolean(_)) => Some(v),
            (BuiltinType::Date, v @ Value::Date(_)) => Some(v),
            _ => None,
        }
    }
}

/// Runtime state a builtin may inspect.
pub struct BuiltinContext<'a> {
    pub files: &'a FileTable,
}

/// Native implementation of a builtin. Arguments have already been checked
/// against the parameter list; an `Err` carries the failure message.
pub type BuiltinFn = fn(&[Value], &BuiltinContext) -> Result<Value, String>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub params: &'static [BuiltinType],
    pub run: BuiltinFn,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// The table of builtin functions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    table: HashMap<&'static str, Builtin>,
}

impl Builtins {
    /// Every builtin of the language.
    pub fn standard() -> Self {
        let mut builtins = Self::default();
        string::install(&mut builtins);
        math::install(&mut builtins);
        time::install(&mut builtins);
        files::install(&mut builtins);
        builtins
    }

    pub fn register(&mut self, name: &'static str, params: &'static [BuiltinType], run: BuiltinFn) {
        self.table.insert(name, Builtin { name, params, run });
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.table.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/* ============================================================================
 * Argument Helpers
 * ============================================================================
 */

pub(crate) fn int_arg(args: &[Value], index: usize) -> Result<i64, String> {
    match args.get(index) {
        Some(Value::Integer(n)) => Ok(*n),
        _ => Err(format!("argument {} must be an INTEGER", index + 1)),
    }
}

pub(crate) fn real_arg(args: &[Value], index: usize) -> Result<f64, String> {
    match args.get(index) {
        Some(Value::Real(n)) => Ok(*n),
        Some(Value::Integer(n)) => Ok(*n as f64),
        _ => Err(format!("argument {} must be a number", index + 1)),
    }
}

pub(crate) fn str_arg(args: &[Value], index: usize) -> Result<&str, String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(format!("argument {} must be a STRING", index + 1)),
    }
}

pub(crate) fn char_arg(args: &[Value], index: usize) -> Result<char, String> {
    match args.get(index) {
        Some(Value::Char(c)) => Ok(*c),
        _ => Err(format!("argument {} must be a CHAR", index + 1)),
    }
}

pub(crate) fn date_arg(args: &[Value], index: usize) -> Result<chrono::NaiveDate, String> {
    match args.get(index) {
        Some(Value::Date(d)) => Ok(*d),
        _ => Err(format!("argument {} must be a DATE", index + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_every_group() {
        let builtins = Builtins::standard();
        for name in ["LEFT", "MID", "ROUND", "RANDOMBETWEEN", "DAYINDEX", "TODAY", "EOF"] {
            assert!(builtins.contains(name), "missing {}", name);
        }
        assert!(!builtins.contains("left"));
    }

    #[test]
    fn argument_conversion() {
        assert!(matches!(BuiltinType::Real.accept(Value::Integer(2)), Some(Value::Real(r)) if r == 2.0));
        assert!(matches!(BuiltinType::Char.accept(Value::String("a".into())), Some(Value::Char('a'))));
        assert!(BuiltinType::Char.accept(Value::String("ab".into())).is_none());
        assert!(BuiltinType::Integer.accept(Value::Real(1.5)).is_none());
    }
}
