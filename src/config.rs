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

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PResult, PseudoError};

/// Interpreter configuration.
///
/// A plain value passed by reference into the tokenizer, the parser and the
/// runtime. Every option has a dotted name (`section.option`) so that
/// diagnostics can tell the user which toggle would change a behavior, and so
/// hosts can set options by name with [`Config::set`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub syntax: SyntaxConfig,
    pub coercion: CoercionConfig,
    pub equality: EqualityConfig,
    pub initialization: InitializationConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Treat `;` as a line break.
    pub semicolons_as_newlines: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionConfig {
    /// Arrays with different bounds but equal per-dimension lengths are
    /// assignable to each other.
    pub arrays_same_length: bool,

    /// Arrays with the same total number of elements are assignable to each
    /// other, whatever their shape.
    pub arrays_same_total_size: bool,

    /// REAL values may be stored into INTEGER variables (truncating).
    pub real_to_int: bool,

    /// STRING values of length one may be stored into CHAR variables.
    pub string_to_char: bool,

    /// `&` converts non-string operands to strings instead of failing.
    pub concat_any: bool,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            arrays_same_length: false,
            arrays_same_total_size: false,
            real_to_int: false,
            string_to_char: true,
            concat_any: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualityConfig {
    /// `5 = 5.0` compares numerically.
    pub coerce_int_real: bool,

    /// `'a' = "a"` compares as text.
    pub coerce_string_char: bool,

    /// Comparing unrelated types yields FALSE instead of an error.
    pub allow_different_types: bool,
}

impl Default for EqualityConfig {
    fn default() -> Self {
        Self {
            coerce_int_real: true,
            coerce_string_char: true,
            allow_different_types: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializationConfig {
    /// DECLAREd scalars start with the default value for their type
    /// instead of being uninitialized.
    pub normal_variables_default: bool,

    /// Array elements start with default values instead of being
    /// uninitialized.
    pub arrays_default: bool,

    /// Largest number of elements a single array may hold.
    pub array_max_size: usize,

    pub default_integer: i64,
    pub default_real: f64,
    pub default_string: String,
    pub default_char: char,
    pub default_boolean: bool,
    pub default_date: NaiveDate,
}

impl Default for InitializationConfig {
    fn default() -> Self {
        Self {
            normal_variables_default: true,
            arrays_default: true,
            array_max_size: 1_000_000,
            default_integer: 0,
            default_real: 0.0,
            default_string: String::new(),
            default_char: ' ',
            default_boolean: false,
            default_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of statements a program may execute.
    pub max_statements: u64,

    /// Maximum depth of nested function/procedure calls.
    pub max_call_depth: usize,

    /// Highest record number SEEK accepts in a RANDOM file.
    pub max_file_records: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_statements: 10_000_000,
            max_call_depth: 200,
            max_file_records: 1_000_000,
        }
    }
}

impl Config {
    /// Parses a configuration from JSON. Missing sections and options keep
    /// their defaults.
    pub fn from_json(text: &str) -> PResult<Self> {
        serde_json::from_str(text).map_err(|err| {
            PseudoError::runtime_error(format!("Invalid configuration: {}", err), None)
        })
    }

    pub fn to_json(&self) -> PResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| {
            PseudoError::runtime_error(format!("Could not serialize configuration: {}", err), None)
        })
    }

    /// Sets a single option by its dotted name, e.g.
    /// `config.set("coercion.arrays_same_total_size", json!(true))`.
    pub fn set(&mut self, key: &str, value: serde_json::Value) -> PResult<()> {
        let (section, option) = key.split_once('.').ok_or_else(|| {
            PseudoError::runtime_error(format!("Invalid configuration key \"{}\"", key), None)
                .with_help("keys have the form section.option")
        })?;

        let mut tree = serde_json::to_value(&*self).map_err(|err| {
            PseudoError::runtime_error(format!("Could not serialize configuration: {}", err), None)
        })?;

        let slot = tree
            .get_mut(section)
            .and_then(|s| s.get_mut(option))
            .ok_or_else(|| {
                PseudoError::runtime_error(format!("Unknown configuration option \"{}\"", key), None)
            })?;
        *slot = value;

        *self = serde_json::from_value(tree).map_err(|err| {
            PseudoError::runtime_error(
                format!("Invalid value for configuration option \"{}\": {}", key, err),
                None,
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_updates_nested_option() {
        let mut config = Config::default();
        config.set("coercion.arrays_same_total_size", json!(true)).unwrap();
        assert!(config.coercion.arrays_same_total_size);
    }

    #[test]
    fn set_rejects_unknown_option() {
        let mut config = Config::default();
        assert!(config.set("coercion.nonsense", json!(true)).is_err());
        assert!(config.set("nodot", json!(true)).is_err());
    }

    #[test]
    fn set_rejects_wrong_value_type() {
        let mut config = Config::default();
        assert!(config.set("runtime.max_statements", json!("lots")).is_err());
        assert_eq!(config.runtime.max_statements, 10_000_000);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "runtime": { "max_statements": 5 } }"#).unwrap();
        assert_eq!(config.runtime.max_statements, 5);
        assert_eq!(config.runtime.max_call_depth, 200);
        assert!(config.coercion.string_to_char);
    }
}
