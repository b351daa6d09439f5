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

use std::rc::Rc;

use crate::ast::class::{AccessModifier, FileMode};
use crate::ast::expr::ExprNode;
use crate::ast::param::Parameter;
use crate::lexer::token::Token;
use crate::span::Span;

/// Every statement kind known to the grammar registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Declare,
    Constant,
    Define,
    TypeEnum,
    TypePointer,
    TypeSet,
    TypeRecord,
    TypeEnd,
    Assignment,
    Output,
    Input,
    Return,
    Call,
    If,
    Else,
    EndIf,
    Case,
    CaseBranch,
    CaseBranchRange,
    Otherwise,
    EndCase,
    For,
    ForStep,
    ForEnd,
    While,
    EndWhile,
    Repeat,
    Until,
    Function,
    EndFunction,
    Procedure,
    EndProcedure,
    OpenFile,
    ReadFile,
    WriteFile,
    CloseFile,
    Seek,
    GetRecord,
    PutRecord,
    Class,
    ClassInherits,
    EndClass,
    ClassProperty,
    ClassProcedure,
    ClassFunction,
}

impl StatementType {
    /// Name used in diagnostics ("expected ENDIF").
    pub fn display_name(&self) -> &'static str {
        match self {
            StatementType::Declare => "DECLARE",
            StatementType::Constant => "CONSTANT",
            StatementType::Define => "DEFINE",
            StatementType::TypeEnum
            | StatementType::TypePointer
            | StatementType::TypeSet
            | StatementType::TypeRecord => "TYPE",
            StatementType::TypeEnd => "ENDTYPE",
            StatementType::Assignment => "assignment",
            StatementType::Output => "OUTPUT",
            StatementType::Input => "INPUT",
            StatementType::Return => "RETURN",
            StatementType::Call => "CALL",
            StatementType::If => "IF",
            StatementType::Else => "ELSE",
            StatementType::EndIf => "ENDIF",
            StatementType::Case => "CASE OF",
            StatementType::CaseBranch | StatementType::CaseBranchRange => "CASE branch",
            StatementType::Otherwise => "OTHERWISE",
            StatementType::EndCase => "ENDCASE",
            StatementType::For | StatementType::ForStep => "FOR",
            StatementType::ForEnd => "NEXT",
            StatementType::While => "WHILE",
            StatementType::EndWhile => "ENDWHILE",
            StatementType::Repeat => "REPEAT",
            StatementType::Until => "UNTIL",
            StatementType::Function | StatementType::ClassFunction => "FUNCTION",
            StatementType::EndFunction => "ENDFUNCTION",
            StatementType::Procedure | StatementType::ClassProcedure => "PROCEDURE",
            StatementType::EndProcedure => "ENDPROCEDURE",
            StatementType::OpenFile => "OPENFILE",
            StatementType::ReadFile => "READFILE",
            StatementType::WriteFile => "WRITEFILE",
            StatementType::CloseFile => "CLOSEFILE",
            StatementType::Seek => "SEEK",
            StatementType::GetRecord => "GETRECORD",
            StatementType::PutRecord => "PUTRECORD",
            StatementType::Class | StatementType::ClassInherits => "CLASS",
            StatementType::EndClass => "ENDCLASS",
            StatementType::ClassProperty => "class property",
        }
    }

    /// Statements that introduce declarations into the current scope.
    /// A loop body without any of these is "simple".
    pub fn declares(&self) -> bool {
        matches!(
            self,
            StatementType::Declare
                | StatementType::Constant
                | StatementType::Define
                | StatementType::TypeEnum
                | StatementType::TypePointer
                | StatementType::TypeSet
                | StatementType::TypeRecord
        )
    }
}

/// How a statement takes part in block assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementCategory {
    Normal,
    /// Opens a branch node and pushes it on the block stack.
    Block,
    /// Closes the innermost open branch node.
    BlockEnd,
    /// Starts a new body group in the innermost open branch node.
    BlockMultiSplit,
}

/// Statement payloads. One variant per grammar shape; several statement
/// types share a payload (FOR and FOR ... STEP, the block terminators).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /* ----------------------------- */
    /* DECLARATIONS                  */
    /* ----------------------------- */
    Declare {
        names: Vec<Token>,
        var_type: ExprNode,
    },

    Constant {
        name: Token,
        value: Token,
    },

    Define {
        name: Token,
        values: Vec<ExprNode>,
        set_type: Token,
    },

    TypeEnum {
        name: Token,
        variants: Vec<Token>,
    },

    TypePointer {
        name: Token,
        target: ExprNode,
    },

    TypeSet {
        name: Token,
        element: ExprNode,
    },

    TypeRecord {
        name: Token,
    },

    /* ----------------------------- */
    /* SIMPLE STATEMENTS             */
    /* ----------------------------- */
    Assignment {
        target: ExprNode,
        value: ExprNode,
    },

    Output {
        values: Vec<ExprNode>,
    },

    Input {
        target: ExprNode,
    },

    Return {
        value: ExprNode,
    },

    /// `CALL target(args)`; `CALL target` is a call with no arguments.
    Call {
        target: ExprNode,
        args: Vec<ExprNode>,
    },

    /* ----------------------------- */
    /* CONTROL FLOW                  */
    /* ----------------------------- */
    If {
        condition: ExprNode,
    },

    Else,

    Case {
        value: ExprNode,
    },

    CaseBranch {
        value: ExprNode,
    },

    CaseBranchRange {
        low: ExprNode,
        high: ExprNode,
    },

    Otherwise,

    For {
        variable: Token,
        from: ExprNode,
        to: ExprNode,
        step: Option<ExprNode>,
    },

    ForEnd {
        variable: Token,
    },

    While {
        condition: ExprNode,
    },

    Repeat,

    Until {
        condition: ExprNode,
    },

    /* ----------------------------- */
    /* SUBROUTINES                   */
    /* ----------------------------- */
    Function {
        name: Token,
        params: Vec<Parameter>,
        returns: ExprNode,
    },

    Procedure {
        name: Token,
        params: Vec<Parameter>,
    },

    /* ----------------------------- */
    /* FILES                         */
    /* ----------------------------- */
    OpenFile {
        filename: ExprNode,
        mode: FileMode,
    },

    ReadFile {
        filename: ExprNode,
        target: ExprNode,
    },

    WriteFile {
        filename: ExprNode,
        value: ExprNode,
    },

    CloseFile {
        filename: ExprNode,
    },

    Seek {
        filename: ExprNode,
        position: ExprNode,
    },

    GetRecord {
        filename: ExprNode,
        target: ExprNode,
    },

    PutRecord {
        filename: ExprNode,
        value: ExprNode,
    },

    /* ----------------------------- */
    /* CLASSES                       */
    /* ----------------------------- */
    Class {
        name: Token,
        inherits: Option<Token>,
    },

    ClassProperty {
        access: AccessModifier,
        names: Vec<Token>,
        var_type: ExprNode,
    },

    ClassProcedure {
        access: AccessModifier,
        name: Token,
        params: Vec<Parameter>,
    },

    ClassFunction {
        access: AccessModifier,
        name: Token,
        params: Vec<Parameter>,
        returns: ExprNode,
    },

    /// ENDIF, ENDCASE, ENDWHILE, ENDFUNCTION, ENDPROCEDURE, ENDTYPE, ENDCLASS
    End,
}

/// A statement matched against a grammar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub statement_type: StatementType,
    pub category: StatementCategory,
    pub node: Stmt,

    /// Every token of the logical line.
    pub span: Span,
}

impl Statement {
    pub fn new(statement_type: StatementType, category: StatementCategory, node: Stmt, span: Span) -> Self {
        Self {
            statement_type,
            category,
            node,
            span,
        }
    }
}

/// One entry of a statement group.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramNode {
    Statement(Statement),
    Block(Rc<BranchNode>),
}

impl ProgramNode {
    /// The first statement of the node: the statement itself, or the
    /// block header.
    pub fn head(&self) -> &Statement {
        match self {
            ProgramNode::Statement(statement) => statement,
            ProgramNode::Block(block) => block.header(),
        }
    }
}

/// A parsed block construct.
///
/// `controls` holds the header, every split (ELSE, CASE branches) and the
/// terminator. `groups[i]` is the body between `controls[i]` and
/// `controls[i + 1]`, so `groups.len() == controls.len() - 1` once the block
/// is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub controls: Vec<Statement>,
    pub groups: Vec<Vec<ProgramNode>>,
}

impl BranchNode {
    pub fn new(header: Statement) -> Self {
        Self {
            controls: vec![header],
            groups: vec![Vec::new()],
        }
    }

    pub fn header(&self) -> &Statement {
        &self.controls[0]
    }

    pub fn terminator(&self) -> Option<&Statement> {
        if self.controls.len() > 1 {
            self.controls.last()
        } else {
            None
        }
    }

    /// Span from the header to the terminator.
    pub fn span(&self) -> Span {
        let header = self.header().span;
        match self.terminator() {
            Some(end) => header.merge(end.span),
            None => header,
        }
    }

    /// True when no group (recursively) declares anything, so a loop may
    /// reuse one scope for every iteration.
    pub fn is_simple(&self) -> bool {
        self.groups.iter().all(|group| is_simple_group(group))
    }
}

pub fn is_simple_group(nodes: &[ProgramNode]) -> bool {
    nodes.iter().all(|node| match node {
        ProgramNode::Statement(statement) => !statement.statement_type.declares(),
        ProgramNode::Block(block) => {
            !block.header().statement_type.declares() && block.is_simple()
        }
    })
}

/// A whole parsed program: the top-level statement group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub nodes: Vec<ProgramNode>,
}

impl Program {
    /// Counts every statement, including block controls.
    pub fn statement_count(&self) -> usize {
        fn count(nodes: &[ProgramNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    ProgramNode::Statement(_) => 1,
                    ProgramNode::Block(block) => {
                        block.controls.len() + block.groups.iter().map(|g| count(g)).sum::<usize>()
                    }
                })
                .sum()
        }
        count(&self.nodes)
    }
}
