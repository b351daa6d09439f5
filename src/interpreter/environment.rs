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

use std::collections::HashMap;

use crate::error::{PResult, PseudoError};
use crate::interpreter::Runtime;
use crate::span::Span;
use crate::value::{VarRef, Variable};

/// One lexical scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Opaque scopes (routine bodies) hide every enclosing scope except the
    /// global one.
    pub opaque: bool,

    pub variables: HashMap<String, VarRef>,
}

impl Scope {
    pub fn new(opaque: bool) -> Self {
        Self {
            opaque,
            variables: HashMap::new(),
        }
    }

    /// A scope pre-populated with existing bindings (parameters, class
    /// properties).
    pub fn with_variables<I>(opaque: bool, variables: I) -> Self
    where
        I: IntoIterator<Item = (String, VarRef)>,
    {
        Self {
            opaque,
            variables: variables.into_iter().collect(),
        }
    }
}

impl<'r> Runtime<'r> {
    /// Runs `f` inside a new scope. The scope is popped whether or not `f`
    /// succeeds.
    pub(crate) fn scoped<T>(&mut self, scope: Scope, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let depth = self.scopes.len();
        self.scopes.push(scope);
        let result = f(self);
        self.scopes.truncate(depth);
        result
    }

    /// Finds a variable, innermost scope first.
    ///
    /// The search stops at the first opaque scope and then checks the
    /// global scope.
    pub(crate) fn lookup_variable(&self, name: &str) -> Option<VarRef> {
        for scope in self.scopes.iter().rev() {
            if let Some(var) = scope.variables.get(name) {
                return Some(var.clone());
            }
            if scope.opaque {
                break;
            }
        }
        self.scopes.first().and_then(|global| global.variables.get(name)).cloned()
    }

    /// Looks up a variable or fails with an "undeclared" error.
    pub(crate) fn variable(&self, name: &str, span: Span) -> PResult<VarRef> {
        self.lookup_variable(name).ok_or_else(|| self.undeclared(name, span))
    }

    pub(crate) fn undeclared(&self, name: &str, span: Span) -> PseudoError {
        let err = PseudoError::runtime_error(format!("Undeclared variable \"{}\"", name), Some(span));
        if self.functions.contains_key(name) || self.builtins.contains(name) {
            err.with_help(format!("{} is a function: call it with {}(...)", name, name))
        } else {
            err.with_help(format!("declare it first, e.g. DECLARE {} : INTEGER", name))
        }
    }

    /// Adds a binding to the innermost scope.
    ///
    /// # Errors
    /// Fails if the innermost scope already has a binding with this name.
    pub(crate) fn declare_variable(&mut self, variable: Variable, span: Span) -> PResult<VarRef> {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::new(false));
        }
        let last = self.scopes.len() - 1;
        let scope = &mut self.scopes[last];

        if let Some(existing) = scope.variables.get(&variable.name) {
            let mut err = PseudoError::runtime_error(
                format!("\"{}\" was already declared", variable.name),
                Some(span),
            );
            if let Some(previous) = existing.borrow().declared_at {
                err = err.with_general_span(previous);
            }
            return Err(err);
        }

        let name = variable.name.clone();
        let var = variable.into_ref();
        scope.variables.insert(name, var.clone());
        Ok(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::filesystem::MemoryFileSystem;
    use crate::globals::Builtins;
    use crate::io::CapturedIo;
    use crate::types::TypeArena;

    #[test]
    fn opaque_scopes_skip_to_global() {
        let config = Config::default();
        let builtins = Builtins::standard();
        let mut io = CapturedIo::new();
        let mut fs = MemoryFileSystem::new();
        let mut rt = Runtime::new(&config, &builtins, &mut io, &mut fs);

        fn declare(rt: &mut Runtime, name: &str) {
            rt.declare_variable(Variable::new(name, TypeArena::INTEGER, None, true, None), Span::default())
                .unwrap();
        }

        declare(&mut rt, "global");
        rt.scopes.push(Scope::new(false));
        declare(&mut rt, "outer");
        rt.scopes.push(Scope::new(true));
        declare(&mut rt, "local");

        assert!(rt.lookup_variable("local").is_some());
        assert!(rt.lookup_variable("global").is_some());
        assert!(rt.lookup_variable("outer").is_none());

        rt.scopes.pop();
        assert!(rt.lookup_variable("outer").is_some());
    }

    #[test]
    fn redeclaring_in_the_same_scope_fails() {
        let config = Config::default();
        let builtins = Builtins::standard();
        let mut io = CapturedIo::new();
        let mut fs = MemoryFileSystem::new();
        let mut rt = Runtime::new(&config, &builtins, &mut io, &mut fs);

        let var = || Variable::new("x", TypeArena::INTEGER, None, true, None);
        assert!(rt.declare_variable(var(), Span::default()).is_ok());
        assert!(rt.declare_variable(var(), Span::default()).is_err());

        let result = rt.scoped(Scope::new(false), |rt| rt.declare_variable(var(), Span::default()).map(|_| ()));
        assert!(result.is_ok());
        assert_eq!(rt.scopes.len(), 1);
    }
}
