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

//! Object creation and property access.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::expr::ExprNode;
use crate::error::{PResult, PseudoError};
use crate::interpreter::Runtime;
use crate::lexer::token::Token;
use crate::span::Span;
use crate::types::TypeId;
use crate::value::{ClassInstance, TypedValue, Value, VarRef, Variable};

impl<'r> Runtime<'r> {
    /// `NEW ClassName(args)`
    ///
    /// Every property gets its own default-initialized binding, then the
    /// constructor NEW runs on the new object if the class has one.
    pub(crate) fn instantiate(&mut self, class_name: &Token, args: &[ExprNode], span: Span) -> PResult<TypedValue> {
        let ty = self.resolve_named_type(&class_name.text, class_name.span)?;
        let Some(class) = self.types.as_class(ty) else {
            return Err(PseudoError::type_error(
                format!("\"{}\" is not a class", class_name.text),
                Some(class_name.span),
            ));
        };
        let properties_defs = class.properties.clone();
        let constructor = class.all_methods.get("NEW").cloned();

        let scalar_default = self.config.initialization.normal_variables_default;
        let properties: HashMap<String, VarRef> = properties_defs
            .iter()
            .map(|def| {
                let value = self.default_value(def.ty, scalar_default);
                (def.name.clone(), Variable::new(def.name.clone(), def.ty, value, true, None).into_ref())
            })
            .collect();

        let instance = Rc::new(RefCell::new(ClassInstance { class: ty, properties }));
        tracing::trace!(class = %class_name.text, "instantiate");

        match constructor {
            Some(constructor) => {
                self.check_access(constructor.access, constructor.owner, "NEW", class_name.span)?;
                self.call_routine(constructor, args, Some(instance.clone()), span)?;
            }
            None if !args.is_empty() => {
                return Err(PseudoError::runtime_error(
                    format!("{} has no constructor, so it takes no arguments", class_name.text),
                    Some(span),
                )
                .with_help(format!("declare PUBLIC PROCEDURE NEW(...) inside CLASS {}", class_name.text)));
            }
            None => {}
        }

        Ok(TypedValue::new(ty, Value::Class(instance)))
    }

    /// The binding of a property of an object, with the property's
    /// declared type.
    ///
    /// # Errors
    /// Fails for unknown properties and for PRIVATE properties used from
    /// outside the declaring class and its subclasses.
    pub(crate) fn property_binding(
        &self,
        instance: &Rc<RefCell<ClassInstance>>,
        name: &str,
        span: Span,
    ) -> PResult<(VarRef, TypeId)> {
        let object = instance
            .try_borrow()
            .map_err(|_| PseudoError::runtime_error("The object is already in use", Some(span)))?;
        let class = self.types.as_class(object.class);

        let Some(def) = class.and_then(|c| c.property(name)) else {
            let mut err = PseudoError::runtime_error(
                format!("{} has no property \"{}\"", self.types.name(object.class), name),
                Some(span),
            );
            if class.is_some_and(|c| c.all_methods.contains_key(name)) {
                err = err.with_help(format!("{} is a method: call it with {}(...)", name, name));
            }
            return Err(err);
        };

        self.check_access(def.access, Some(def.owner), name, span)?;

        let binding = object.properties.get(name).cloned().ok_or_else(|| {
            PseudoError::runtime_error(format!("Property \"{}\" is missing from the object", name), Some(span))
        })?;
        Ok((binding, def.ty))
    }
}
