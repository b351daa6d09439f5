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

/// Controls visibility of class members.
///
/// Carried as a plain field by every class member statement
/// (`PUBLIC x : INTEGER`, `PRIVATE PROCEDURE Reset()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessModifier {
    Public,
    Private,
}

impl AccessModifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            AccessModifier::Public => "PUBLIC",
            AccessModifier::Private => "PRIVATE",
        }
    }
}

/// The mode a file is opened in by OPENFILE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
    Random,
}

impl FileMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            FileMode::Read => "READ",
            FileMode::Write => "WRITE",
            FileMode::Append => "APPEND",
            FileMode::Random => "RANDOM",
        }
    }
}
