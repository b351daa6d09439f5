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

/// Core parser orchestration:
/// - Owns the `Parser` struct (grammar registry + config)
/// - Exposes the main `parse(tokens, config)` entry point
/// - Matches one logical line and explains failures
pub mod parser;

/// Statement grammar registry: matchers, entries, context rules
pub mod grammar;

/// Pattern matching of one line against one grammar entry
pub mod matcher;

/// Logical line splitting (THEN / ELSE / CASE branch rules)
pub mod lines;

/// Block assembly with an explicit stack of open branch nodes
pub mod blocks;

/// Statement builders, one per grammar shape
pub mod statements;

/// Expression parsing:
/// - OR → AND → NOT → equality → comparison → additive → multiplicative
///   → negation → reference → dereference → member access
/// - calls, indexing, instantiation
pub mod expressions;

/// Type syntax: names, arrays, integer ranges
pub mod types;

/// Shared token-slice helpers:
/// - nesting-aware searching and splitting
/// - name lists
/// - keyword typo suggestions
pub mod helpers;

pub use expressions::{parse_expression, parse_expression_list};
pub use parser::{parse, Parser};
pub use types::parse_type;
