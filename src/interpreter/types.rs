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

//! Type resolution and the pre-run pass.
//!
//! Before any statement runs, every TYPE, CLASS, FUNCTION and PROCEDURE at
//! the top level is registered and resolved:
//!
//! 1. top-level CONSTANTs are bound (array bounds may use them)
//! 2. every type name is registered; pointer and class types get their
//!    arena slot immediately so they can be referenced before they are
//!    complete
//! 3. records, enums and sets are resolved, detecting types that contain
//!    themselves
//! 4. pointer targets are filled in
//! 5. classes are completed base-first, detecting circular inheritance and
//!    checking overrides
//! 6. functions and procedures are registered

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::class::AccessModifier;
use crate::ast::expr::ExprNode;
use crate::ast::param::Parameter;
use crate::ast::stmt::{BranchNode, ProgramNode, Statement, StatementType, Stmt};
use crate::error::{PResult, PseudoError, ResultExt};
use crate::interpreter::Runtime;
use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;
use crate::types::{
    check_class_methods_compatible, total_size, ClassType, EnumType, ParamDef, PointerType, PrimitiveType,
    PropertyDef, RecordType, Routine, RoutineKind, SetType, TypeArena, TypeId, VariableType,
};

/// Resolution state of a named type.
#[derive(Debug, Clone)]
pub(crate) enum TypeSlot {
    /// Declared but not yet resolved.
    Pending(ProgramNode),
    /// Being resolved; meeting it again means the type contains itself.
    Resolving,
    Resolved(TypeId),
}

/// Statements handled by the pre-run pass instead of in program order.
pub(crate) fn is_declaration(statement_type: StatementType) -> bool {
    matches!(
        statement_type,
        StatementType::Constant
            | StatementType::TypeEnum
            | StatementType::TypePointer
            | StatementType::TypeSet
            | StatementType::TypeRecord
            | StatementType::Class
            | StatementType::ClassInherits
            | StatementType::Function
            | StatementType::Procedure
    )
}

impl<'r> Runtime<'r> {
    /// Registers and resolves every top-level declaration.
    pub(crate) fn prepare(&mut self, nodes: &[ProgramNode]) -> PResult<()> {
        for node in nodes {
            if let ProgramNode::Statement(statement @ Statement { node: Stmt::Constant { .. }, .. }) = node {
                self.exec_statement(statement).general_span(statement.span)?;
            }
        }

        let mut pending = Vec::new();
        let mut pointers = Vec::new();
        let mut classes = Vec::new();

        for node in nodes {
            let head = node.head();
            let name = match &head.node {
                Stmt::TypeEnum { name, .. }
                | Stmt::TypePointer { name, .. }
                | Stmt::TypeSet { name, .. }
                | Stmt::TypeRecord { name }
                | Stmt::Class { name, .. } => name,
                _ => continue,
            };
            self.check_type_name_free(name)?;

            match (&head.node, node) {
                (Stmt::TypePointer { .. }, ProgramNode::Statement(statement)) => {
                    let id = self.types.alloc(VariableType::Pointer(PointerType {
                        name: name.text.clone(),
                        target: None,
                    }));
                    self.type_slots.insert(name.text.clone(), TypeSlot::Resolved(id));
                    pointers.push((id, statement.clone()));
                }
                (Stmt::Class { .. }, ProgramNode::Block(block)) => {
                    let id = self.types.alloc(VariableType::Class(ClassType {
                        name: name.text.clone(),
                        base: None,
                        properties: Vec::new(),
                        own_methods: Vec::new(),
                        all_methods: HashMap::new(),
                    }));
                    self.type_slots.insert(name.text.clone(), TypeSlot::Resolved(id));
                    classes.push((id, block.clone()));
                }
                _ => {
                    self.type_slots.insert(name.text.clone(), TypeSlot::Pending(node.clone()));
                    pending.push(name.clone());
                }
            }
        }

        for name in &pending {
            self.resolve_named_type(&name.text, name.span)?;
        }

        for (id, statement) in &pointers {
            if let Stmt::TypePointer { name, target } = &statement.node {
                let target = self.resolve_type(target).general_span(statement.span)?;
                self.types.set(
                    *id,
                    VariableType::Pointer(PointerType {
                        name: name.text.clone(),
                        target: Some(target),
                    }),
                );
            }
        }

        let mut done = HashSet::new();
        for index in 0..classes.len() {
            self.complete_class(index, &classes, &mut HashSet::new(), &mut done)?;
        }

        for node in nodes {
            if let ProgramNode::Block(block) = node {
                if matches!(block.header().node, Stmt::Function { .. } | Stmt::Procedure { .. }) {
                    self.register_routine(block)?;
                }
            }
        }

        tracing::debug!(
            types = self.type_slots.len(),
            functions = self.functions.len(),
            "registered declarations"
        );
        Ok(())
    }

    fn check_type_name_free(&self, name: &Token) -> PResult<()> {
        if PrimitiveType::from_name(&name.text).is_some() {
            return Err(PseudoError::type_error(
                format!("Cannot redefine the builtin type {}", name.text),
                Some(name.span),
            ));
        }
        if self.type_slots.contains_key(&name.text) {
            return Err(PseudoError::type_error(
                format!("Type \"{}\" was already declared", name.text),
                Some(name.span),
            ));
        }
        Ok(())
    }

    /* ============================================================================
     * Resolution
     * ============================================================================
     */

    /// Resolves a type name.
    pub(crate) fn resolve_named_type(&mut self, name: &str, span: Span) -> PResult<TypeId> {
        if let Some(primitive) = PrimitiveType::from_name(name) {
            return Ok(TypeArena::primitive(primitive));
        }

        match self.type_slots.get(name) {
            Some(TypeSlot::Resolved(id)) => Ok(*id),
            Some(TypeSlot::Resolving) => Err(PseudoError::type_error(
                format!("Type \"{}\" contains itself", name),
                Some(span),
            )
            .with_help("use a pointer type to refer to a type from inside itself")),
            Some(TypeSlot::Pending(node)) => {
                let node = node.clone();
                self.type_slots.insert(name.to_string(), TypeSlot::Resolving);
                let id = self.resolve_declaration(&node)?;
                self.type_slots.insert(name.to_string(), TypeSlot::Resolved(id));
                Ok(id)
            }
            None => {
                let mut err = PseudoError::type_error(format!("Unknown type \"{}\"", name), Some(span));
                if let Some(primitive) = PrimitiveType::ALL
                    .iter()
                    .find(|p| p.name().eq_ignore_ascii_case(name))
                {
                    err = err.with_help(format!("type names are case-sensitive: write {}", primitive.name()));
                }
                Err(err)
            }
        }
    }

    fn resolve_declaration(&mut self, node: &ProgramNode) -> PResult<TypeId> {
        let head = node.head();
        let resolved = match (&head.node, node) {
            (Stmt::TypeEnum { name, variants }, _) => Ok(self.types.alloc(VariableType::Enum(EnumType {
                name: name.text.clone(),
                variants: variants.iter().map(|v| v.text.clone()).collect(),
            }))),

            (Stmt::TypeSet { name, element }, _) => {
                let element = self.resolve_type(element)?;
                Ok(self.types.alloc(VariableType::Set(SetType {
                    name: name.text.clone(),
                    element,
                })))
            }

            (Stmt::TypeRecord { name }, ProgramNode::Block(block)) => {
                let mut fields: Vec<(String, TypeId)> = Vec::new();
                for member in block.groups.iter().flatten() {
                    let ProgramNode::Statement(Statement {
                        node: Stmt::Declare { names, var_type },
                        ..
                    }) = member
                    else {
                        continue;
                    };
                    let ty = self.resolve_type(var_type)?;
                    self.require_sized(ty, var_type.span())?;
                    for field in names {
                        if fields.iter().any(|(existing, _)| *existing == field.text) {
                            return Err(PseudoError::type_error(
                                format!("Field \"{}\" was already declared in {}", field.text, name.text),
                                Some(field.span),
                            ));
                        }
                        fields.push((field.text.clone(), ty));
                    }
                }
                Ok(self.types.alloc(VariableType::Record(RecordType {
                    name: name.text.clone(),
                    fields,
                })))
            }

            _ => Err(PseudoError::type_error("Invalid type declaration", Some(head.span))),
        };
        resolved.general_span(head.span)
    }

    /// Resolves type syntax to a concrete type.
    ///
    /// Array bounds are evaluated here, so a type inside a routine may use
    /// the routine's parameters.
    pub(crate) fn resolve_type(&mut self, node: &ExprNode) -> PResult<TypeId> {
        match node {
            ExprNode::Leaf(token) if token.kind == TokenKind::Name => self.resolve_named_type(&token.text, token.span),

            ExprNode::ArrayType { bounds, element, span } => {
                let element = self.resolve_type(element)?;
                let Some(bounds) = bounds else {
                    return Ok(self.types.array(element, None));
                };

                let mut resolved = Vec::with_capacity(bounds.len());
                for (low, high) in bounds {
                    let low_value = self.eval_integer(low)?;
                    let high_value = self.eval_integer(high)?;
                    if low_value > high_value {
                        return Err(PseudoError::type_error(
                            format!(
                                "Array lower bound {} is greater than the upper bound {}",
                                low_value, high_value
                            ),
                            Some(low.span().merge(high.span())),
                        ));
                    }
                    resolved.push((low_value, high_value));
                }

                let size = total_size(&resolved);
                let limit = self.config.initialization.array_max_size as u64;
                if size > limit {
                    return Err(PseudoError::type_error(
                        format!("Array of {} elements is larger than the limit of {}", size, limit),
                        Some(*span),
                    )
                    .with_help("raise initialization.array_max_size to allow larger arrays"));
                }

                Ok(self.types.array(element, Some(resolved)))
            }

            ExprNode::RangeType { low, high, .. } => Ok(self.types.range(*low, *high)),

            other => Err(PseudoError::type_error(
                format!("\"{}\" is not a type", other.fmt_text()),
                Some(other.span()),
            )),
        }
    }

    /// Variables and fields need array bounds; only parameters may be
    /// `ARRAY OF T`.
    pub(crate) fn require_sized(&self, ty: TypeId, span: Span) -> PResult<()> {
        match self.types.as_array(ty) {
            Some(array) if array.bounds.is_none() => Err(PseudoError::type_error(
                "An array without bounds can only be used as a parameter type",
                Some(span),
            )
            .with_help("give the bounds, e.g. ARRAY[1:10] OF INTEGER")),
            _ => Ok(()),
        }
    }

    /* ============================================================================
     * Classes
     * ============================================================================
     */

    fn complete_class(
        &mut self,
        index: usize,
        classes: &[(TypeId, Rc<BranchNode>)],
        in_progress: &mut HashSet<TypeId>,
        done: &mut HashSet<TypeId>,
    ) -> PResult<()> {
        let (id, block) = &classes[index];
        let id = *id;
        if done.contains(&id) {
            return Ok(());
        }

        let header = block.header();
        let Stmt::Class { name, inherits } = &header.node else {
            return Ok(());
        };
        in_progress.insert(id);

        let base = match inherits {
            Some(base_name) => {
                let base = self.resolve_named_type(&base_name.text, base_name.span)?;
                if self.types.as_class(base).is_none() {
                    return Err(PseudoError::type_error(
                        format!("\"{}\" is not a class and cannot be inherited from", base_name.text),
                        Some(base_name.span),
                    ));
                }
                if in_progress.contains(&base) {
                    return Err(PseudoError::type_error(
                        format!("Circular inheritance: {} inherits from itself", name.text),
                        Some(base_name.span),
                    )
                    .with_general_span(header.span));
                }
                if !done.contains(&base) {
                    if let Some(base_index) = classes.iter().position(|(c, _)| *c == base) {
                        self.complete_class(base_index, classes, in_progress, done)?;
                    }
                }
                Some(base)
            }
            None => None,
        };

        let mut class = match base.and_then(|b| self.types.as_class(b)) {
            Some(parent) => ClassType {
                name: name.text.clone(),
                base,
                properties: parent.properties.clone(),
                own_methods: Vec::new(),
                all_methods: parent.all_methods.clone(),
            },
            None => ClassType {
                name: name.text.clone(),
                base: None,
                properties: Vec::new(),
                own_methods: Vec::new(),
                all_methods: HashMap::new(),
            },
        };

        for member in block.groups.iter().flatten() {
            match member {
                ProgramNode::Statement(Statement {
                    node: Stmt::ClassProperty { access, names, var_type },
                    span,
                    ..
                }) => {
                    let ty = self.resolve_type(var_type).general_span(*span)?;
                    self.require_sized(ty, var_type.span())?;
                    if ty == id {
                        return Err(PseudoError::type_error(
                            format!("Class {} cannot contain a property of its own type", name.text),
                            Some(var_type.span()),
                        ));
                    }
                    for property in names {
                        if class.property(&property.text).is_some() {
                            return Err(PseudoError::type_error(
                                format!("Property \"{}\" was already declared", property.text),
                                Some(property.span),
                            ));
                        }
                        class.properties.push(PropertyDef {
                            name: property.text.clone(),
                            ty,
                            access: *access,
                            owner: id,
                        });
                    }
                }

                ProgramNode::Block(method) => {
                    let routine = self.build_routine(method, Some(id))?;
                    if class.own_methods.contains(&routine.name) {
                        return Err(PseudoError::type_error(
                            format!("Method \"{}\" was already declared in {}", routine.name, name.text),
                            Some(method.header().span),
                        ));
                    }
                    class.own_methods.push(routine.name.clone());
                    class.all_methods.insert(routine.name.clone(), Rc::new(routine));
                }

                _ => {}
            }
        }

        self.types.set(id, VariableType::Class(class));
        if let Some(base) = base {
            check_class_methods_compatible(&self.types, self.config, base, id).map_err(|err| err.or_span(header.span))?;
        }

        in_progress.remove(&id);
        done.insert(id);
        Ok(())
    }

    /* ============================================================================
     * Routines
     * ============================================================================
     */

    /// Resolves a routine's signature.
    pub(crate) fn build_routine(&mut self, block: &Rc<BranchNode>, owner: Option<TypeId>) -> PResult<Routine> {
        let header = block.header();
        let (name, access, params, returns, kind) = match &header.node {
            Stmt::Function { name, params, returns } => {
                (name, AccessModifier::Public, params, Some(returns), RoutineKind::Function)
            }
            Stmt::Procedure { name, params } => (name, AccessModifier::Public, params, None, RoutineKind::Procedure),
            Stmt::ClassFunction { access, name, params, returns } => {
                (name, *access, params, Some(returns), RoutineKind::Function)
            }
            Stmt::ClassProcedure { access, name, params } => (name, *access, params, None, RoutineKind::Procedure),
            _ => return Err(PseudoError::type_error("Not a function or procedure", Some(header.span))),
        };

        let params = self.resolve_parameters(params).general_span(header.span)?;
        let returns = match returns {
            Some(node) => {
                let ty = self.resolve_type(node).general_span(header.span)?;
                Some(ty)
            }
            None => None,
        };

        if name.text == "NEW" && kind == RoutineKind::Function {
            return Err(PseudoError::type_error("The constructor NEW must be a PROCEDURE", Some(name.span)));
        }

        Ok(Routine {
            name: name.text.clone(),
            kind,
            access,
            params,
            returns,
            body: block.clone(),
            owner,
        })
    }

    fn resolve_parameters(&mut self, params: &[Parameter]) -> PResult<Vec<ParamDef>> {
        params
            .iter()
            .map(|param| {
                Ok(ParamDef {
                    name: param.name.text.clone(),
                    ty: self.resolve_type(&param.param_type)?,
                    mode: param.mode,
                })
            })
            .collect()
    }

    fn register_routine(&mut self, block: &Rc<BranchNode>) -> PResult<()> {
        let routine = self.build_routine(block, None)?;
        let span = block.header().span;

        if self.builtins.contains(&routine.name) {
            return Err(PseudoError::type_error(
                format!("\"{}\" is the name of a builtin function", routine.name),
                Some(span),
            )
            .with_help("choose a different name"));
        }
        if self.functions.contains_key(&routine.name) {
            return Err(PseudoError::type_error(
                format!("{} \"{}\" was already declared", routine.kind.keyword(), routine.name),
                Some(span),
            ));
        }

        tracing::trace!(name = %routine.name, kind = routine.kind.keyword(), "registered routine");
        self.functions.insert(routine.name.clone(), Rc::new(routine));
        Ok(())
    }

    /* ============================================================================
     * Lookups
     * ============================================================================
     */

    /// Every resolved type with a name, in no particular order.
    fn named_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.type_slots.values().filter_map(|slot| match slot {
            TypeSlot::Resolved(id) => Some(*id),
            _ => None,
        })
    }

    /// The declared pointer type whose target is `target`.
    ///
    /// # Errors
    /// Fails when no pointer type, or more than one, targets `target`.
    pub(crate) fn pointer_type_for(&self, target: TypeId, span: Span) -> PResult<TypeId> {
        let candidates: Vec<TypeId> = self
            .named_types()
            .filter(|id| match self.types.get(*id) {
                VariableType::Pointer(PointerType { target: Some(t), .. }) => {
                    crate::types::types_equal(&self.types, *t, target)
                }
                _ => false,
            })
            .collect();

        match candidates.as_slice() {
            [id] => Ok(*id),
            [] => Err(PseudoError::type_error(
                format!("No pointer type points to {}", self.types.name(target)),
                Some(span),
            )
            .with_help(format!(
                "declare one, e.g. TYPE {}Pointer = ^{}",
                self.types.name(target),
                self.types.name(target)
            ))),
            _ => Err(PseudoError::type_error(
                format!(
                    "More than one pointer type points to {}; cannot tell which one to use",
                    self.types.name(target)
                ),
                Some(span),
            )
            .with_help("assign the pointer to a variable of the pointer type you want")),
        }
    }

    /// Finds an enum variant by name, preferring the expected type.
    pub(crate) fn enum_variant(&self, name: &str, expected: Option<TypeId>) -> Option<(TypeId, usize)> {
        let lookup = |id: TypeId| {
            self.types
                .as_enum(id)
                .and_then(|e| e.variants.iter().position(|v| v == name))
                .map(|index| (id, index))
        };
        if let Some(found) = expected.and_then(lookup) {
            return Some(found);
        }
        self.named_types().find_map(lookup)
    }
}
