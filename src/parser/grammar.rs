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

//! The statement grammar registry.
//!
//! Every statement shape is one [`GrammarEntry`]: its statement type, the
//! token-matcher sequence, its block category, where it may appear, and
//! the builder that turns the captured tokens into a [`Stmt`]. The registry
//! is built once, ahead of time, by [`Grammar::standard`].

use std::collections::HashMap;

use crate::ast::stmt::{StatementCategory, StatementType, Stmt};
use crate::error::{ErrorKind, PResult, PseudoError};
use crate::lexer::token::TokenKind;
use crate::parser::matcher::Captures;
use crate::parser::statements as build;

/* ============================================================================
 * Matchers
 * ============================================================================
 */

/// One element of a statement pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Exactly this token kind.
    Kind(TokenKind),
    /// Any single token.
    Any,
    /// Any run of tokens, possibly empty.
    ZeroOrMore,
    /// Any non-empty run of tokens.
    OneOrMore,
    /// A non-empty run later parsed as an expression (or expression list).
    Expression,
    /// A non-empty run later parsed as type syntax.
    TypeSyntax,
    /// A literal token; `-` followed by a number is folded into one.
    Literal,
    /// READ, WRITE, APPEND or RANDOM.
    FileMode,
    /// PUBLIC or PRIVATE.
    AccessModifier,
    /// One of the listed kinds.
    OneOf(&'static [TokenKind]),
}

impl Matcher {
    pub fn is_variadic(&self) -> bool {
        matches!(
            self,
            Matcher::ZeroOrMore | Matcher::OneOrMore | Matcher::Expression | Matcher::TypeSyntax
        )
    }

    /// Minimum number of tokens a variadic matcher must capture.
    pub fn min_len(&self) -> usize {
        match self {
            Matcher::ZeroOrMore => 0,
            _ => 1,
        }
    }

    /// Token kinds that can start a match, if the set is fixed.
    pub fn first_kinds(&self) -> Option<Vec<TokenKind>> {
        match self {
            Matcher::Kind(kind) => Some(vec![*kind]),
            Matcher::OneOf(kinds) => Some(kinds.to_vec()),
            Matcher::FileMode => Some(vec![
                TokenKind::Read,
                TokenKind::Write,
                TokenKind::Append,
                TokenKind::Random,
            ]),
            Matcher::AccessModifier => Some(vec![TokenKind::Public, TokenKind::Private]),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Matcher::Kind(kind) => kind.describe(),
            Matcher::Any => "a token".to_string(),
            Matcher::ZeroOrMore | Matcher::OneOrMore => "more tokens".to_string(),
            Matcher::Expression => "an expression".to_string(),
            Matcher::TypeSyntax => "a type".to_string(),
            Matcher::Literal => "a literal value".to_string(),
            Matcher::FileMode => "a file mode (READ, WRITE, APPEND or RANDOM)".to_string(),
            Matcher::AccessModifier => "PUBLIC or PRIVATE".to_string(),
            Matcher::OneOf(kinds) => kinds
                .iter()
                .map(TokenKind::describe)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

/* ============================================================================
 * Entries
 * ============================================================================
 */

/// Builds the statement payload from the captured tokens.
pub type Builder = fn(&Captures) -> PResult<Stmt>;

/// One registered statement shape.
#[derive(Debug, Clone)]
pub struct GrammarEntry {
    pub statement_type: StatementType,
    pub pattern: Vec<Matcher>,
    pub category: StatementCategory,

    /// The statement may only appear directly inside one of these blocks.
    pub inside: Option<&'static [StatementType]>,

    /// The statement may only appear outside every block.
    pub top_level_only: bool,

    /// For blocks: the only statements allowed directly inside.
    pub allow_only: Option<&'static [StatementType]>,

    /// For blocks: the statement type that closes them.
    pub end_type: Option<StatementType>,

    pub build: Builder,
}

impl GrammarEntry {
    pub fn new(statement_type: StatementType, pattern: &[Matcher], build: Builder) -> Self {
        Self {
            statement_type,
            pattern: pattern.to_vec(),
            category: StatementCategory::Normal,
            inside: None,
            top_level_only: false,
            allow_only: None,
            end_type: None,
            build,
        }
    }

    pub fn block(mut self, end_type: StatementType) -> Self {
        self.category = StatementCategory::Block;
        self.end_type = Some(end_type);
        self
    }

    pub fn block_end(mut self) -> Self {
        self.category = StatementCategory::BlockEnd;
        self
    }

    pub fn split(mut self, inside: &'static [StatementType]) -> Self {
        self.category = StatementCategory::BlockMultiSplit;
        self.inside = Some(inside);
        self
    }

    pub fn inside(mut self, inside: &'static [StatementType]) -> Self {
        self.inside = Some(inside);
        self
    }

    pub fn top_level(mut self) -> Self {
        self.top_level_only = true;
        self
    }

    pub fn allow_only(mut self, allowed: &'static [StatementType]) -> Self {
        self.allow_only = Some(allowed);
        self
    }
}

/* ============================================================================
 * Registry
 * ============================================================================
 */

/// All statement grammars, indexed by the kind of their first token.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    entries: Vec<GrammarEntry>,
    by_first: HashMap<TokenKind, Vec<usize>>,
    irregular: Vec<usize>,
}

impl Grammar {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    ///
    /// # Errors
    /// Rejects empty patterns, block entries without a closing statement,
    /// and patterns where two variadic matchers are adjacent, since the
    /// split point between them would be ambiguous.
    pub fn register(&mut self, entry: GrammarEntry) -> PResult<()> {
        if entry.category == StatementCategory::Block && entry.end_type.is_none() {
            return Err(PseudoError::new(
                ErrorKind::Parse,
                format!("Grammar for block {:?} has no closing statement", entry.statement_type),
                None,
            ));
        }

        if entry.pattern.is_empty() {
            return Err(PseudoError::new(
                ErrorKind::Parse,
                format!("Grammar for {:?} has an empty pattern", entry.statement_type),
                None,
            ));
        }

        if entry
            .pattern
            .windows(2)
            .any(|pair| pair[0].is_variadic() && pair[1].is_variadic())
        {
            return Err(PseudoError::new(
                ErrorKind::Parse,
                format!(
                    "Grammar for {:?} is ambiguous: two variadic matchers are adjacent",
                    entry.statement_type
                ),
                None,
            ));
        }

        let index = self.entries.len();
        match entry.pattern[0].first_kinds() {
            Some(kinds) => {
                for kind in kinds {
                    self.by_first.entry(kind).or_default().push(index);
                }
            }
            None => self.irregular.push(index),
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entry(&self, index: usize) -> &GrammarEntry {
        &self.entries[index]
    }

    /// Entries whose pattern starts with the given kind.
    pub fn starting_with(&self, kind: TokenKind) -> &[usize] {
        self.by_first.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entries without a fixed first token.
    pub fn irregular(&self) -> &[usize] {
        &self.irregular
    }

    /// The entry that opens blocks of the given header type.
    pub fn block_entry(&self, header: StatementType) -> Option<&GrammarEntry> {
        self.entries
            .iter()
            .find(|entry| entry.statement_type == header && entry.category == StatementCategory::Block)
    }

    /// Keywords that can start a statement, for typo suggestions.
    pub fn statement_keywords(&self) -> Vec<(&'static str, TokenKind)> {
        crate::lexer::keywords::KEYWORDS
            .iter()
            .filter(|(_, kind)| self.by_first.contains_key(kind))
            .copied()
            .collect()
    }

    /// The full statement grammar of the language.
    pub fn standard() -> PResult<Self> {
        use Matcher::*;
        use StatementType as S;
        use TokenKind as T;

        const CLASS_MEMBERS: &[StatementType] = &[
            StatementType::ClassProperty,
            StatementType::ClassProcedure,
            StatementType::ClassFunction,
        ];
        const CLASSES: &[StatementType] = &[StatementType::Class, StatementType::ClassInherits];
        const CASES: &[StatementType] = &[StatementType::Case];
        // NEW names the constructor.
        const METHOD_NAMES: &[TokenKind] = &[TokenKind::Name, TokenKind::New];

        let entries = vec![
            // Declarations
            GrammarEntry::new(S::Declare, &[Kind(T::Declare), OneOrMore, Kind(T::Colon), TypeSyntax], build::declare),
            GrammarEntry::new(
                S::Constant,
                &[Kind(T::Constant), Kind(T::Name), OneOf(&[T::EqualTo, T::Assignment]), Literal],
                build::constant,
            ),
            GrammarEntry::new(
                S::Define,
                &[Kind(T::Define), Kind(T::Name), Kind(T::ParenOpen), ZeroOrMore, Kind(T::ParenClose), Kind(T::Colon), Kind(T::Name)],
                build::define,
            ),
            GrammarEntry::new(
                S::TypeEnum,
                &[Kind(T::Type), Kind(T::Name), Kind(T::EqualTo), Kind(T::ParenOpen), OneOrMore, Kind(T::ParenClose)],
                build::type_enum,
            )
            .top_level(),
            GrammarEntry::new(
                S::TypePointer,
                &[Kind(T::Type), Kind(T::Name), Kind(T::EqualTo), Kind(T::Caret), TypeSyntax],
                build::type_pointer,
            )
            .top_level(),
            GrammarEntry::new(
                S::TypeSet,
                &[Kind(T::Type), Kind(T::Name), Kind(T::EqualTo), Kind(T::Set), Kind(T::Of), TypeSyntax],
                build::type_set,
            )
            .top_level(),
            GrammarEntry::new(S::TypeRecord, &[Kind(T::Type), Kind(T::Name)], build::type_record)
                .block(S::TypeEnd)
                .top_level()
                .allow_only(&[StatementType::Declare]),
            GrammarEntry::new(S::TypeEnd, &[Kind(T::EndType)], build::end).block_end(),
            // Simple statements
            GrammarEntry::new(S::Assignment, &[Expression, Kind(T::Assignment), Expression], build::assignment),
            GrammarEntry::new(S::Output, &[Kind(T::Output), Expression], build::output),
            GrammarEntry::new(S::Input, &[Kind(T::Input), Expression], build::input),
            GrammarEntry::new(S::Return, &[Kind(T::Return), Expression], build::return_value),
            GrammarEntry::new(S::Call, &[Kind(T::Call), Expression], build::call),
            // IF
            GrammarEntry::new(S::If, &[Kind(T::If), Expression, Kind(T::Then)], build::if_header).block(S::EndIf),
            GrammarEntry::new(S::Else, &[Kind(T::Else)], build::else_split).split(&[StatementType::If]),
            GrammarEntry::new(S::EndIf, &[Kind(T::EndIf)], build::end).block_end(),
            // CASE
            GrammarEntry::new(S::Case, &[Kind(T::Case), Kind(T::Of), Expression], build::case_header).block(S::EndCase),
            GrammarEntry::new(S::CaseBranch, &[Expression, Kind(T::Colon)], build::case_branch).split(CASES),
            GrammarEntry::new(
                S::CaseBranchRange,
                &[Expression, Kind(T::To), Expression, Kind(T::Colon)],
                build::case_branch_range,
            )
            .split(CASES),
            GrammarEntry::new(S::Otherwise, &[Kind(T::Otherwise), ZeroOrMore], build::otherwise).split(CASES),
            GrammarEntry::new(S::EndCase, &[Kind(T::EndCase)], build::end).block_end(),
            // FOR (the STEP form first, so the plain form never swallows STEP)
            GrammarEntry::new(
                S::ForStep,
                &[Kind(T::For), Kind(T::Name), Kind(T::Assignment), Expression, Kind(T::To), Expression, Kind(T::Step), Expression],
                build::for_header,
            )
            .block(S::ForEnd),
            GrammarEntry::new(
                S::For,
                &[Kind(T::For), Kind(T::Name), Kind(T::Assignment), Expression, Kind(T::To), Expression],
                build::for_header,
            )
            .block(S::ForEnd),
            GrammarEntry::new(S::ForEnd, &[Kind(T::Next), Kind(T::Name)], build::for_end).block_end(),
            // WHILE / REPEAT
            GrammarEntry::new(S::While, &[Kind(T::While), Expression], build::while_header).block(S::EndWhile),
            GrammarEntry::new(S::EndWhile, &[Kind(T::EndWhile)], build::end).block_end(),
            GrammarEntry::new(S::Repeat, &[Kind(T::Repeat)], build::repeat).block(S::Until),
            GrammarEntry::new(S::Until, &[Kind(T::Until), Expression], build::until).block_end(),
            // Subroutines
            GrammarEntry::new(
                S::Function,
                &[Kind(T::Function), Kind(T::Name), Kind(T::ParenOpen), ZeroOrMore, Kind(T::ParenClose), Kind(T::Returns), TypeSyntax],
                build::function,
            )
            .block(S::EndFunction)
            .top_level(),
            GrammarEntry::new(
                S::Function,
                &[Kind(T::Function), Kind(T::Name), Kind(T::Returns), TypeSyntax],
                build::function_no_params,
            )
            .block(S::EndFunction)
            .top_level(),
            GrammarEntry::new(S::EndFunction, &[Kind(T::EndFunction)], build::end).block_end(),
            GrammarEntry::new(
                S::Procedure,
                &[Kind(T::Procedure), Kind(T::Name), Kind(T::ParenOpen), ZeroOrMore, Kind(T::ParenClose)],
                build::procedure,
            )
            .block(S::EndProcedure)
            .top_level(),
            GrammarEntry::new(S::Procedure, &[Kind(T::Procedure), Kind(T::Name)], build::procedure_no_params)
                .block(S::EndProcedure)
                .top_level(),
            GrammarEntry::new(S::EndProcedure, &[Kind(T::EndProcedure)], build::end).block_end(),
            // Files
            GrammarEntry::new(S::OpenFile, &[Kind(T::OpenFile), Expression, Kind(T::For), FileMode], build::open_file),
            GrammarEntry::new(S::ReadFile, &[Kind(T::ReadFile), Expression, Kind(T::Comma), Expression], build::read_file),
            GrammarEntry::new(S::WriteFile, &[Kind(T::WriteFile), Expression, Kind(T::Comma), Expression], build::write_file),
            GrammarEntry::new(S::CloseFile, &[Kind(T::CloseFile), Expression], build::close_file),
            GrammarEntry::new(S::Seek, &[Kind(T::Seek), Expression, Kind(T::Comma), Expression], build::seek),
            GrammarEntry::new(S::GetRecord, &[Kind(T::GetRecord), Expression, Kind(T::Comma), Expression], build::get_record),
            GrammarEntry::new(S::PutRecord, &[Kind(T::PutRecord), Expression, Kind(T::Comma), Expression], build::put_record),
            // Classes
            GrammarEntry::new(S::ClassInherits, &[Kind(T::Class), Kind(T::Name), Kind(T::Inherits), Kind(T::Name)], build::class_header)
                .block(S::EndClass)
                .top_level()
                .allow_only(CLASS_MEMBERS),
            GrammarEntry::new(S::Class, &[Kind(T::Class), Kind(T::Name)], build::class_header)
                .block(S::EndClass)
                .top_level()
                .allow_only(CLASS_MEMBERS),
            GrammarEntry::new(S::EndClass, &[Kind(T::EndClass)], build::end).block_end(),
            GrammarEntry::new(S::ClassProperty, &[AccessModifier, OneOrMore, Kind(T::Colon), TypeSyntax], build::class_property)
                .inside(CLASSES),
            GrammarEntry::new(
                S::ClassProcedure,
                &[AccessModifier, Kind(T::Procedure), OneOf(METHOD_NAMES), Kind(T::ParenOpen), ZeroOrMore, Kind(T::ParenClose)],
                build::class_procedure,
            )
            .block(S::EndProcedure)
            .inside(CLASSES),
            GrammarEntry::new(S::ClassProcedure, &[AccessModifier, Kind(T::Procedure), OneOf(METHOD_NAMES)], build::class_procedure_no_params)
                .block(S::EndProcedure)
                .inside(CLASSES),
            GrammarEntry::new(
                S::ClassFunction,
                &[AccessModifier, Kind(T::Function), Kind(T::Name), Kind(T::ParenOpen), ZeroOrMore, Kind(T::ParenClose), Kind(T::Returns), TypeSyntax],
                build::class_function,
            )
            .block(S::EndFunction)
            .inside(CLASSES),
            GrammarEntry::new(
                S::ClassFunction,
                &[AccessModifier, Kind(T::Function), Kind(T::Name), Kind(T::Returns), TypeSyntax],
                build::class_function_no_params,
            )
            .block(S::EndFunction)
            .inside(CLASSES),
        ];

        let mut grammar = Grammar::new();
        for entry in entries {
            grammar.register(entry)?;
        }
        tracing::debug!(entries = grammar.entries.len(), "statement grammar registered");
        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_grammar_registers() {
        let grammar = Grammar::standard().unwrap();
        assert!(!grammar.starting_with(TokenKind::Declare).is_empty());
        assert_eq!(grammar.starting_with(TokenKind::Public).len(), 5);
        assert_eq!(grammar.irregular().len(), 3);
    }

    #[test]
    fn adjacent_variadics_are_rejected() {
        let mut grammar = Grammar::new();
        let entry = GrammarEntry::new(
            StatementType::Output,
            &[Matcher::Kind(TokenKind::Output), Matcher::Expression, Matcher::ZeroOrMore],
            build::output,
        );
        let err = grammar.register(entry).unwrap_err();
        assert!(err.message.contains("ambiguous"));
    }

    #[test]
    fn blocks_must_name_their_end() {
        let mut grammar = Grammar::new();
        let mut entry = GrammarEntry::new(
            StatementType::While,
            &[Matcher::Kind(TokenKind::While), Matcher::Expression],
            build::output,
        );
        entry.category = StatementCategory::Block;
        let err = grammar.register(entry).unwrap_err();
        assert!(err.message.contains("no closing statement"));

        let entry = GrammarEntry::new(
            StatementType::While,
            &[Matcher::Kind(TokenKind::While), Matcher::Expression],
            build::output,
        )
        .block(StatementType::EndWhile);
        assert!(grammar.register(entry).is_ok());
        assert_eq!(
            grammar.block_entry(StatementType::While).and_then(|e| e.end_type),
            Some(StatementType::EndWhile)
        );
    }
}
