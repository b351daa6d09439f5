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

use crate::globals::{str_arg, BuiltinContext, BuiltinType, Builtins};
use crate::value::Value;

pub fn install(builtins: &mut Builtins) {
    builtins.register("EOF", &[BuiltinType::String], eof);
}

/// TRUE when a file opened FOR READ has no more lines.
fn eof(args: &[Value], ctx: &BuiltinContext) -> Result<Value, String> {
    let name = str_arg(args, 0)?;
    ctx.files.eof(name).map(Value::Boolean)
}
