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

use crate::ast::expr::ExprNode;
use crate::lexer::token::Token;

/// How an argument is passed to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// The argument is evaluated, coerced and deep-cloned (the default).
    ByVal,
    /// The parameter aliases the caller's variable.
    ByRef,
}

impl PassMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            PassMode::ByVal => "BYVAL",
            PassMode::ByRef => "BYREF",
        }
    }
}

/// Represents **one declared parameter** of a function, procedure or method:
/// `BYREF Total : INTEGER`
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: Token,

    /// Type syntax, resolved when the routine is registered.
    pub param_type: ExprNode,

    pub mode: PassMode,
}
