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

//! Functions, procedures, methods and builtins.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::class::AccessModifier;
use crate::ast::expr::{ExprNode, Operator};
use crate::ast::param::PassMode;
use crate::error::{PResult, PseudoError, ResultExt};
use crate::globals::{Builtin, BuiltinContext};
use crate::interpreter::{ExecSignal, Frame, Runtime, Scope};
use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;
use crate::types::{types_equal, Routine, RoutineKind, TypeId};
use crate::value::{ClassInstance, TypedValue, Value, VarRef, Variable};

/// What a call expression refers to.
enum Callee<'b> {
    Routine {
        routine: Rc<Routine>,
        instance: Option<Rc<RefCell<ClassInstance>>>,
    },
    Builtin(&'b Builtin),
}

impl<'r> Runtime<'r> {
    /// Runs a call inside an expression. Procedures are rejected before
    /// they run.
    pub(crate) fn call_expression(&mut self, callee: &ExprNode, args: &[ExprNode], span: Span) -> PResult<Option<TypedValue>> {
        match self.resolve_callee(callee)? {
            Callee::Routine { routine, .. } if routine.kind == RoutineKind::Procedure => Err(PseudoError::runtime_error(
                format!("The procedure {} does not return a value", routine.name),
                Some(callee.span()),
            )
            .with_help(format!("run it on its own line with CALL {}(...)", routine.name))),
            Callee::Routine { routine, instance } => self.call_routine(routine, args, instance, span),
            Callee::Builtin(builtin) => self.call_builtin(builtin, args, span).map(Some),
        }
    }

    /// Runs a CALL statement.
    pub(crate) fn call_statement(&mut self, target: &ExprNode, args: &[ExprNode], span: Span) -> PResult<()> {
        match self.resolve_callee(target)? {
            Callee::Routine { routine, .. } if routine.kind == RoutineKind::Function => Err(PseudoError::runtime_error(
                format!("CALL can only run procedures, and {} is a function", routine.name),
                Some(target.span()),
            )
            .with_help("use the function inside an expression, e.g. x <- F(...)")),
            Callee::Routine { routine, instance } => self.call_routine(routine, args, instance, span).map(|_| ()),
            Callee::Builtin(builtin) => Err(PseudoError::runtime_error(
                format!("CALL can only run procedures, and {} is a builtin function", builtin.name),
                Some(target.span()),
            )),
        }
    }

    fn resolve_callee(&mut self, callee: &ExprNode) -> PResult<Callee<'r>> {
        let builtins: &'r crate::globals::Builtins = self.builtins;

        match callee {
            ExprNode::Leaf(token) if token.kind == TokenKind::Name => {
                if let Some(instance) = self.frames.last().and_then(|f| f.instance.clone()) {
                    let class = instance.borrow().class;
                    if let Some(method) = self.types.as_class(class).and_then(|c| c.all_methods.get(&token.text)) {
                        return Ok(Callee::Routine {
                            routine: method.clone(),
                            instance: Some(instance),
                        });
                    }
                }
                if let Some(routine) = self.functions.get(&token.text) {
                    return Ok(Callee::Routine {
                        routine: routine.clone(),
                        instance: None,
                    });
                }
                if let Some(builtin) = builtins.get(&token.text) {
                    return Ok(Callee::Builtin(builtin));
                }
                Err(self.undefined_function(token))
            }

            ExprNode::Branch {
                operator: Operator::Access,
                operands,
                span,
                ..
            } => {
                let [left, right] = operands.as_slice() else {
                    return Err(PseudoError::runtime_error("Malformed method call", Some(*span)));
                };
                let name = right
                    .as_name()
                    .ok_or_else(|| PseudoError::runtime_error("Expected a method name after \".\"", Some(right.span())))?;

                if matches!(left, ExprNode::Leaf(token) if token.kind == TokenKind::Super) {
                    return self.resolve_super(name, left.span());
                }

                let object = self.eval(left, None)?;
                let Value::Class(instance) = object.value else {
                    return Err(PseudoError::type_error(
                        format!("A {} has no methods", self.types.name(object.ty)),
                        Some(left.span()),
                    ));
                };
                let class = instance.borrow().class;
                let method = self.method(class, name)?;
                self.check_access(method.access, method.owner, &method.name, name.span)?;
                Ok(Callee::Routine {
                    routine: method,
                    instance: Some(instance),
                })
            }

            other => Err(PseudoError::runtime_error(
                format!("\"{}\" cannot be called", other.fmt_text()),
                Some(other.span()),
            )),
        }
    }

    /// `SUPER.name`: the base class implementation, on the current object.
    fn resolve_super(&self, name: &Token, span: Span) -> PResult<Callee<'r>> {
        let frame = self.frames.last();
        let (Some(owner), Some(instance)) = (frame.and_then(Frame::class), frame.and_then(|f| f.instance.clone())) else {
            return Err(PseudoError::runtime_error("SUPER can only be used inside a method", Some(span)));
        };
        let Some(base) = self.types.as_class(owner).and_then(|c| c.base) else {
            return Err(PseudoError::runtime_error(
                format!("{} does not inherit from another class", self.types.name(owner)),
                Some(span),
            ));
        };
        let method = self.method(base, name)?;
        Ok(Callee::Routine {
            routine: method,
            instance: Some(instance),
        })
    }

    fn method(&self, class: TypeId, name: &Token) -> PResult<Rc<Routine>> {
        let found = self.types.as_class(class).and_then(|c| c.all_methods.get(&name.text)).cloned();
        found.ok_or_else(|| {
            let mut err = PseudoError::runtime_error(
                format!("{} has no method \"{}\"", self.types.name(class), name.text),
                Some(name.span),
            );
            if self.types.as_class(class).is_some_and(|c| c.property(&name.text).is_some()) {
                err = err.with_help(format!("{} is a property, not a method", name.text));
            }
            err
        })
    }

    fn undefined_function(&self, token: &Token) -> PseudoError {
        if self.lookup_variable(&token.text).is_some() {
            return PseudoError::runtime_error(
                format!("\"{}\" is a variable, not a function", token.text),
                Some(token.span),
            );
        }
        PseudoError::runtime_error(format!("Undefined function \"{}\"", token.text), Some(token.span))
    }

    /// Fails when a PRIVATE member of `owner` is used from outside `owner`
    /// and its subclasses.
    pub(crate) fn check_access(&self, access: AccessModifier, owner: Option<TypeId>, name: &str, span: Span) -> PResult<()> {
        let (AccessModifier::Private, Some(owner)) = (access, owner) else {
            return Ok(());
        };
        let current = self.frames.last().and_then(Frame::class);
        if current.is_some_and(|class| self.types.is_subclass(class, owner)) {
            return Ok(());
        }
        Err(PseudoError::runtime_error(
            format!("\"{}\" is private to {}", name, self.types.name(owner)),
            Some(span),
        ))
    }

    /* ============================================================================
     * Routines
     * ============================================================================
     */

    /// Calls a user routine.
    ///
    /// Arguments are bound in the caller's scope, then the body runs in an
    /// opaque scope (below which, for methods, sit the object's properties).
    ///
    /// # Returns
    /// - `Some(value)` for functions
    /// - `None` for procedures
    pub(crate) fn call_routine(
        &mut self,
        routine: Rc<Routine>,
        args: &[ExprNode],
        instance: Option<Rc<RefCell<ClassInstance>>>,
        span: Span,
    ) -> PResult<Option<TypedValue>> {
        if self.frames.len() >= self.config.runtime.max_call_depth {
            return Err(PseudoError::stack_exhausted(Some(span)));
        }
        self.check_stack(span)?;
        if args.len() != routine.params.len() {
            return Err(PseudoError::runtime_error(
                format!(
                    "{} expects {} argument{}, found {}",
                    routine.name,
                    routine.params.len(),
                    if routine.params.len() == 1 { "" } else { "s" },
                    args.len()
                ),
                Some(span),
            ));
        }

        let mut bindings: Vec<(String, VarRef)> = Vec::with_capacity(args.len());
        for (param, arg) in routine.params.iter().zip(args) {
            let binding = match param.mode {
                PassMode::ByRef => self.bind_by_ref(param.ty, &param.name, arg)?,
                PassMode::ByVal => {
                    let tv = self.eval(arg, Some(param.ty))?;
                    let value = self.coerce(tv, param.ty, arg.span())?.deep_clone();
                    Variable::new(param.name.clone(), param.ty, Some(value), true, Some(routine.body.header().span)).into_ref()
                }
            };
            bindings.push((param.name.clone(), binding));
        }

        tracing::trace!(routine = %routine.name, depth = self.frames.len() + 1, "call");

        let depth = self.scopes.len();
        match &instance {
            Some(object) => {
                let properties: Vec<(String, VarRef)> = object
                    .borrow()
                    .properties
                    .iter()
                    .map(|(name, var)| (name.clone(), var.clone()))
                    .collect();
                self.scopes.push(Scope::with_variables(true, properties));
                self.scopes.push(Scope::with_variables(false, bindings));
            }
            None => self.scopes.push(Scope::with_variables(true, bindings)),
        }
        self.frames.push(Frame {
            routine: routine.clone(),
            instance,
        });

        let result = self.exec_group(&routine.body.groups[0]);

        self.frames.pop();
        self.scopes.truncate(depth);

        let signal = match result {
            Ok(signal) => signal,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => return Err(err).context_with(|| format!("while running {}", routine.name)),
        };

        match (signal, routine.kind) {
            (ExecSignal::Return(value), _) => Ok(Some(value)),
            (ExecSignal::None, RoutineKind::Procedure) => Ok(None),
            (ExecSignal::None, RoutineKind::Function) => Err(PseudoError::runtime_error(
                format!("Function {} finished without a RETURN", routine.name),
                Some(span),
            )
            .with_general_span(routine.body.span())),
        }
    }

    /// BYREF: the parameter shares the caller's binding.
    fn bind_by_ref(&mut self, param_ty: TypeId, param_name: &str, arg: &ExprNode) -> PResult<VarRef> {
        let Some(name) = arg.as_name() else {
            return Err(PseudoError::runtime_error(
                format!("BYREF parameter \"{}\" needs a variable, found \"{}\"", param_name, arg.fmt_text()),
                Some(arg.span()),
            ));
        };
        let var = self.variable(&name.text, name.span)?;
        let var_ty = var.borrow().ty;

        let matches = types_equal(&self.types, param_ty, var_ty)
            || match (self.types.as_array(param_ty), self.types.as_array(var_ty)) {
                (Some(p), Some(v)) => p.bounds.is_none() && types_equal(&self.types, p.element, v.element),
                _ => false,
            };
        if !matches {
            return Err(PseudoError::type_error(
                format!(
                    "BYREF parameter \"{}\" is a {}, but \"{}\" is a {}",
                    param_name,
                    self.types.name(param_ty),
                    name.text,
                    self.types.name(var_ty)
                ),
                Some(arg.span()),
            )
            .with_help("BYREF arguments must have exactly the parameter's type"));
        }
        Ok(var)
    }

    /* ============================================================================
     * Builtins
     * ============================================================================
     */

    fn call_builtin(&mut self, builtin: &Builtin, args: &[ExprNode], span: Span) -> PResult<TypedValue> {
        if args.len() != builtin.params.len() {
            return Err(PseudoError::runtime_error(
                format!(
                    "{} expects {} argument{}, found {}",
                    builtin.name,
                    builtin.params.len(),
                    if builtin.params.len() == 1 { "" } else { "s" },
                    args.len()
                ),
                Some(span),
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (param, arg)) in builtin.params.iter().zip(args).enumerate() {
            let tv = self.eval(arg, None)?;
            let type_name = self.types.name(tv.ty);
            let value = param.accept(tv.value).ok_or_else(|| {
                PseudoError::type_error(
                    format!(
                        "Argument {} of {} must be {}, found {}",
                        index + 1,
                        builtin.name,
                        param.describe(),
                        type_name
                    ),
                    Some(arg.span()),
                )
            })?;
            values.push(value);
        }

        let ctx = BuiltinContext { files: &self.files };
        let result = (builtin.run)(&values, &ctx)
            .map_err(|message| PseudoError::runtime_error(format!("{}: {}", builtin.name, message), Some(span)))?;
        TypedValue::from_primitive(result).ok_or_else(|| {
            PseudoError::runtime_error(format!("{} returned an unsupported value", builtin.name), Some(span))
        })
    }
}
