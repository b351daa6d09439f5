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

/// Expression nodes (also used for type syntax)
pub mod expr;

/// Statement payloads, statement kinds and the block-structured program tree
pub mod stmt;

/// Routine parameters and pass modes
pub mod param;

/// Access modifiers and file modes
pub mod class;

pub use class::{AccessModifier, FileMode};
pub use expr::{ExprNode, Fixity, Operator};
pub use param::{Parameter, PassMode};
pub use stmt::{BranchNode, Program, ProgramNode, Statement, StatementCategory, StatementType, Stmt};
