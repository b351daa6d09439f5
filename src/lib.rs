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

//! Interpreter for Cambridge-style structured pseudocode.
//!
//! The pipeline has three stages, each a plain function over the previous
//! stage's output:
//!
//! ```text
//! source ─ symbolize ─▶ symbols ─ tokenize ─▶ tokens ─ parse ─▶ Program ─ Runtime::run
//! ```
//!
//! Configuration is an explicit [`Config`] value passed to every stage. The
//! host supplies input/output through [`Io`] and file storage through
//! [`FileSystem`].

/// Source ranges
pub mod span;

/// Structured errors shared by every stage
pub mod error;

/// Rendering errors against source text
pub mod diagnostics;

/// Interpreter options
pub mod config;

/// Source text → symbols → tokens
pub mod lexer;

/// Statement, expression and type syntax trees
pub mod ast;

/// Tokens → program tree
pub mod parser;

/// Concrete types and compatibility rules
pub mod types;

/// Runtime values and variable bindings
pub mod value;

/// The tree-walking runtime
pub mod interpreter;

/// Builtin functions
pub mod globals;

/// File storage backends
pub mod filesystem;

/// Input and output callbacks
pub mod io;

pub use config::Config;
pub use error::{ErrorKind, PResult, PseudoError};
pub use filesystem::{FileSystem, LocalFileSystem, MemoryFileSystem};
pub use globals::Builtins;
pub use interpreter::Runtime;
pub use io::{CapturedIo, Io, OutputValue, StdIo};
pub use lexer::{symbolize, tokenize};
pub use parser::parse;

/// Stack reserved for the thread [`run_source`] runs a program on.
pub const RUN_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Stack [`run_source`] leaves unused below the runtime's budget.
const RUN_STACK_RESERVE: usize = 16 * 1024 * 1024;

/// Lexes, parses and runs a program with the standard builtins.
///
/// The work happens on a dedicated thread with a [`RUN_STACK_SIZE`] stack,
/// so recursive programs reach `runtime.max_call_depth` and fail with
/// `E_STACK` instead of overflowing the caller's stack. A panic inside the
/// interpreter is resumed on the calling thread.
pub fn run_source(
    source: &str,
    config: &Config,
    io: &mut (dyn Io + Send),
    fs: &mut (dyn FileSystem + Send),
) -> PResult<()> {
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name("pseudo-run".to_string())
            .stack_size(RUN_STACK_SIZE)
            .spawn_scoped(scope, move || run_pipeline(source, config, io, fs))
            .map_err(|err| {
                PseudoError::runtime_error(format!("Cannot start the interpreter thread: {}", err), None)
            })?;
        match worker.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    })
}

fn run_pipeline(source: &str, config: &Config, io: &mut dyn Io, fs: &mut dyn FileSystem) -> PResult<()> {
    let tokens = lexer::lex(source, config)?;
    let program = parse(&tokens, config)?;
    let builtins = Builtins::standard();
    let mut runtime =
        Runtime::new(config, &builtins, io, fs).with_stack_budget(RUN_STACK_SIZE - RUN_STACK_RESERVE);
    runtime.run(&program)
}
