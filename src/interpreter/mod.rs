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

//! Tree-walking runtime.
//!
//! The [`Runtime`] owns every piece of execution state: the type arena, the
//! scope stack, registered routines, the open-file table, the call frames
//! and the statement counter. Evaluation logic is split across submodules,
//! each adding an `impl Runtime` block:
//!
//!  - environment.rs → scope stack and variable lookup
//!  - types.rs       → type resolution and the pre-run pass
//!  - statements.rs  → statement and block execution
//!  - expressions.rs → expression evaluation and operators
//!  - places.rs      → assignable locations (variables, elements, fields)
//!  - calls.rs       → functions, procedures, builtins and methods
//!  - classes.rs     → instantiation and member access
//!  - files.rs       → the open-file table and file statements
//!  - coerce.rs      → coercion, default values and text parsing
//!  - display.rs     → rendering values for OUTPUT and WRITEFILE

pub mod calls;
pub mod classes;
pub mod coerce;
pub mod display;
pub mod environment;
pub mod expressions;
pub mod files;
pub mod helpers;
pub mod places;
pub mod statements;
pub mod types;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::stmt::Program;
use crate::config::Config;
use crate::error::{PResult, PseudoError};
use crate::filesystem::FileSystem;
use crate::globals::Builtins;
use crate::io::Io;
use crate::span::Span;
use crate::types::{Routine, TypeArena, TypeId};
use crate::value::ClassInstance;

pub use environment::Scope;
pub use files::FileTable;
pub use statements::ExecSignal;
use types::TypeSlot;

/// One active routine call.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub routine: Rc<Routine>,

    /// The receiver, for method calls.
    pub instance: Option<Rc<RefCell<ClassInstance>>>,
}

impl Frame {
    /// The class whose method is running.
    pub fn class(&self) -> Option<TypeId> {
        self.routine.owner
    }
}

/// Executes one parsed program.
pub struct Runtime<'r> {
    pub(crate) config: &'r Config,
    pub(crate) builtins: &'r Builtins,
    pub(crate) io: &'r mut dyn Io,
    pub(crate) fs: &'r mut dyn FileSystem,

    pub(crate) types: TypeArena,
    pub(crate) type_slots: HashMap<String, TypeSlot>,

    /// Innermost scope last. `scopes[0]` is the global scope.
    pub(crate) scopes: Vec<Scope>,

    pub(crate) functions: HashMap<String, Rc<Routine>>,
    pub(crate) files: FileTable,
    pub(crate) frames: Vec<Frame>,

    statements_executed: u64,

    /// Address of a local in `run`, the reference point for stack use.
    stack_base: usize,
    /// Native stack bytes execution may use below `stack_base`.
    stack_budget: usize,
}

/// Native stack a runtime may use unless told otherwise. Fits inside the
/// 2 MiB that spawned threads get by default.
pub const DEFAULT_STACK_BUDGET: usize = 1024 * 1024;

/// Address of the caller's stack frame, near enough.
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(std::ptr::addr_of!(marker)) as usize
}

impl<'r> Runtime<'r> {
    pub fn new(config: &'r Config, builtins: &'r Builtins, io: &'r mut dyn Io, fs: &'r mut dyn FileSystem) -> Self {
        Self {
            config,
            builtins,
            io,
            fs,
            types: TypeArena::new(),
            type_slots: HashMap::new(),
            scopes: vec![Scope::new(false)],
            functions: HashMap::new(),
            files: FileTable::default(),
            frames: Vec::new(),
            statements_executed: 0,
            stack_base: stack_position(),
            stack_budget: DEFAULT_STACK_BUDGET,
        }
    }

    /// Sets how much native stack execution may use before failing with
    /// `E_STACK`. Use it when running on a thread with a larger stack.
    pub fn with_stack_budget(mut self, bytes: usize) -> Self {
        self.stack_budget = bytes;
        self
    }

    /// Runs a program to completion.
    ///
    /// Types, classes and routines are registered and resolved first; the
    /// remaining top-level statements then run in order.
    pub fn run(&mut self, program: &Program) -> PResult<()> {
        tracing::debug!(nodes = program.nodes.len(), "starting execution");
        self.stack_base = stack_position();

        let result = self
            .prepare(&program.nodes)
            .and_then(|_| self.exec_program(&program.nodes));

        self.report_unclosed_files();

        match &result {
            Ok(()) => tracing::debug!(statements = self.statements_executed, "program finished"),
            Err(err) => tracing::debug!(statements = self.statements_executed, code = err.code, "program failed"),
        }
        result
    }

    /// Number of statements executed so far.
    pub fn statements_executed(&self) -> u64 {
        self.statements_executed
    }

    /// The types created by the program.
    pub fn types(&self) -> &TypeArena {
        &self.types
    }

    /// Fails with `E_STACK` once nested calls, blocks and expressions have
    /// used up the native stack budget.
    pub(crate) fn check_stack(&self, span: Span) -> PResult<()> {
        let used = self.stack_base.abs_diff(stack_position());
        if used > self.stack_budget {
            tracing::debug!(used, budget = self.stack_budget, "native stack budget exhausted");
            return Err(PseudoError::stack_exhausted(Some(span)));
        }
        Ok(())
    }

    /// Counts one executed statement.
    pub(crate) fn tick(&mut self, span: Span) -> PResult<()> {
        self.tick_many(1, span)
    }

    /// Counts several executed statements at once, used for loops whose
    /// body is empty.
    pub(crate) fn tick_many(&mut self, count: u64, span: Span) -> PResult<()> {
        self.statements_executed = self.statements_executed.saturating_add(count);
        let limit = self.config.runtime.max_statements;
        if self.statements_executed > limit {
            return Err(PseudoError::limit_error(
                format!("Too many statements executed (the limit is {})", limit),
                Some(span),
            )
            .with_help("check for an infinite loop, or raise runtime.max_statements"));
        }
        Ok(())
    }
}
