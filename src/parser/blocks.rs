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

//! Block assembly.
//!
//! Builds the program tree iteratively with an explicit stack of open
//! branch nodes. A block statement pushes a node, a split statement starts
//! a new body group in the innermost node, and a block end checks the
//! terminator against the innermost node and pops it into its parent group.

use std::rc::Rc;

use crate::ast::stmt::{BranchNode, Program, ProgramNode, Statement, StatementCategory, StatementType, Stmt};
use crate::error::{PResult, PseudoError};
use crate::parser::lines::Line;
use crate::parser::parser::{LineContext, Parser};

/// A block that has been opened but not yet closed.
struct OpenBlock {
    node: BranchNode,
    end_type: StatementType,
    allow_only: Option<&'static [StatementType]>,
}

impl OpenBlock {
    fn header_type(&self) -> StatementType {
        self.node.header().statement_type
    }

    fn current_group(&mut self) -> &mut Vec<ProgramNode> {
        let last = self.node.groups.len() - 1;
        &mut self.node.groups[last]
    }
}

impl<'c> Parser<'c> {
    /// Assembles logical lines into a program tree.
    ///
    /// # Errors
    /// - a terminator with no open block, or of the wrong kind
    /// - a split statement outside its block, or in the wrong position
    /// - blocks still open at the end of input
    pub(crate) fn assemble(&self, lines: Vec<Line>) -> PResult<Program> {
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut root: Vec<ProgramNode> = Vec::new();

        for line in &lines {
            let context = match stack.last() {
                Some(open) => LineContext {
                    top_level: false,
                    header: Some(open.header_type()),
                    allow_only: open.allow_only,
                    end_type: Some(open.end_type),
                },
                None => LineContext {
                    top_level: true,
                    ..Default::default()
                },
            };

            let statement = self.parse_line(line, context)?;

            match statement.category {
                StatementCategory::Normal => {
                    check_case_body(stack.last(), &statement)?;
                    push_node(&mut stack, &mut root, ProgramNode::Statement(statement));
                }

                StatementCategory::Block => {
                    check_case_body(stack.last(), &statement)?;
                    let entry = self.grammar.block_entry(statement.statement_type);
                    let Some(end_type) = entry.and_then(|e| e.end_type) else {
                        return Err(PseudoError::parse_error(
                            format!(
                                "{} has no registered closing statement",
                                statement.statement_type.display_name()
                            ),
                            statement.span,
                        ));
                    };
                    let allow_only = entry.and_then(|e| e.allow_only);
                    stack.push(OpenBlock {
                        node: BranchNode::new(statement),
                        end_type,
                        allow_only,
                    });
                }

                StatementCategory::BlockMultiSplit => {
                    let open = stack.last_mut().ok_or_else(|| {
                        PseudoError::parse_error(
                            format!("{} outside of a block", statement.statement_type.display_name()),
                            statement.span,
                        )
                    })?;
                    check_split(open, &statement)?;
                    open.node.controls.push(statement);
                    open.node.groups.push(Vec::new());
                }

                StatementCategory::BlockEnd => {
                    let Some(mut open) = stack.pop() else {
                        return Err(PseudoError::parse_error(
                            format!(
                                "Unexpected {}: there is no open block to close",
                                statement.statement_type.display_name()
                            ),
                            statement.span,
                        ));
                    };
                    check_end(&open, &statement)?;
                    open.node.controls.push(statement);
                    push_node(&mut stack, &mut root, ProgramNode::Block(Rc::new(open.node)));
                }
            }
        }

        if let Some(open) = stack.last() {
            let header = open.node.header();
            return Err(PseudoError::parse_error(
                format!("Unclosed {} block", header.statement_type.display_name()),
                header.span,
            )
            .with_help(format!(
                "add {} to close this block",
                open.end_type.display_name()
            )));
        }

        Ok(Program { nodes: root })
    }
}

fn push_node(stack: &mut [OpenBlock], root: &mut Vec<ProgramNode>, node: ProgramNode) {
    match stack.last_mut() {
        Some(open) => open.current_group().push(node),
        None => root.push(node),
    }
}

/// Statements inside CASE must follow a branch label.
fn check_case_body(open: Option<&OpenBlock>, statement: &Statement) -> PResult<()> {
    if let Some(open) = open {
        if open.header_type() == StatementType::Case && open.node.controls.len() == 1 {
            return Err(PseudoError::parse_error(
                "Expected a CASE branch (value : ) before any statement",
                statement.span,
            )
            .with_general_span(open.node.header().span));
        }
    }
    Ok(())
}

fn check_split(open: &OpenBlock, statement: &Statement) -> PResult<()> {
    let previous = open.node.controls.iter().skip(1).map(|s| s.statement_type);

    match statement.statement_type {
        StatementType::Else => {
            if previous.clone().any(|t| t == StatementType::Else) {
                return Err(PseudoError::parse_error("IF can only have one ELSE", statement.span)
                    .with_general_span(open.node.header().span));
            }
        }
        _ => {
            if previous.clone().any(|t| t == StatementType::Otherwise) {
                return Err(PseudoError::parse_error(
                    "OTHERWISE must be the last branch of a CASE",
                    statement.span,
                )
                .with_general_span(open.node.header().span));
            }
        }
    }
    Ok(())
}

fn check_end(open: &OpenBlock, statement: &Statement) -> PResult<()> {
    let header = open.node.header();

    if statement.statement_type != open.end_type {
        return Err(PseudoError::parse_error(
            format!(
                "Expected {} to close the {} block, found {}",
                open.end_type.display_name(),
                header.statement_type.display_name(),
                statement.statement_type.display_name()
            ),
            statement.span,
        )
        .with_general_span(header.span.merge(statement.span)));
    }

    if let (Stmt::For { variable, .. }, Stmt::ForEnd { variable: next }) = (&header.node, &statement.node) {
        if variable.text != next.text {
            return Err(PseudoError::parse_error(
                format!(
                    "NEXT {} does not match the loop variable {}",
                    next.text, variable.text
                ),
                next.span,
            )
            .with_general_span(header.span.merge(statement.span))
            .with_help(format!("write NEXT {}", variable.text)));
        }
    }

    if header.statement_type == StatementType::Case && open.node.controls.len() == 1 {
        return Err(PseudoError::parse_error("CASE needs at least one branch", header.span));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::ast::stmt::{ProgramNode, StatementType};
    use crate::config::Config;
    use crate::error::PResult;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn parse_source(source: &str) -> PResult<crate::ast::stmt::Program> {
        let config = Config::default();
        parse(&lex(source, &config)?, &config)
    }

    #[test]
    fn nested_blocks_assemble() {
        let program = parse_source(
            "FOR i <- 1 TO 3\n  IF i > 1 THEN\n    OUTPUT i\n  ELSE\n    OUTPUT 0\n  ENDIF\nNEXT i",
        )
        .unwrap();
        let ProgramNode::Block(for_block) = &program.nodes[0] else {
            panic!("expected block");
        };
        assert_eq!(for_block.controls.len(), 2);
        let ProgramNode::Block(if_block) = &for_block.groups[0][0] else {
            panic!("expected nested block");
        };
        assert_eq!(if_block.controls[1].statement_type, StatementType::Else);
        assert_eq!(if_block.groups.len(), 2);
    }

    #[test]
    fn mismatched_terminators_fail() {
        assert!(parse_source("IF x THEN\nOUTPUT 1\nENDWHILE").is_err());
        assert!(parse_source("ENDIF").is_err());
        assert!(parse_source("WHILE TRUE\nOUTPUT 1").is_err());
        assert!(parse_source("FOR i <- 1 TO 2\nNEXT j").is_err());
    }

    #[test]
    fn split_rules() {
        assert!(parse_source("IF a THEN\nELSE\nELSE\nENDIF").is_err());
        assert!(parse_source("ELSE").is_err());
        assert!(parse_source("CASE OF x\nOUTPUT 1\n1 : OUTPUT 2\nENDCASE").is_err());
        assert!(parse_source("CASE OF x\nOTHERWISE OUTPUT 1\n1 : OUTPUT 2\nENDCASE").is_err());
    }

    #[test]
    fn context_rules() {
        assert!(parse_source("IF a THEN\nFUNCTION f RETURNS INTEGER\nENDFUNCTION\nENDIF").is_err());
        assert!(parse_source("CLASS A\nOUTPUT 1\nENDCLASS").is_err());
        assert!(parse_source("TYPE R\nOUTPUT 1\nENDTYPE").is_err());
        assert!(parse_source("PUBLIC x : INTEGER").is_err());
        assert!(parse_source("CLASS A\nPUBLIC x : INTEGER\nENDCLASS").is_ok());
    }
}
