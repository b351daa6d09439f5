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

//! Host input and output callbacks.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::{PResult, PseudoError};

/// One rendered value passed to [`Io::output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputValue {
    /// Name of the value's type, e.g. `INTEGER` or `ARRAY[1:3] OF REAL`.
    pub type_name: String,
    pub text: String,
}

/// The interpreter's connection to the user.
pub trait Io {
    /// Reads one line of input for an INPUT statement.
    fn input(&mut self, prompt: &str, expected_type: &str) -> PResult<String>;

    /// Writes the values of one OUTPUT statement as a single line.
    fn output(&mut self, values: &[OutputValue]);
}

fn join(values: &[OutputValue]) -> String {
    values.iter().map(|v| v.text.as_str()).collect()
}

/// Standard input and output.
#[derive(Debug, Default)]
pub struct StdIo;

impl Io for StdIo {
    fn input(&mut self, prompt: &str, expected_type: &str) -> PResult<String> {
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "{} ({}): ", prompt, expected_type);
        let _ = stdout.flush();

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|err| PseudoError::runtime_error(format!("Could not read input: {}", err), None))?;
        if read == 0 {
            return Err(PseudoError::runtime_error("Input ended before a value was entered", None));
        }
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn output(&mut self, values: &[OutputValue]) {
        println!("{}", join(values));
    }
}

/// Scripted input and recorded output.
#[derive(Debug, Default, Clone)]
pub struct CapturedIo {
    inputs: VecDeque<String>,

    /// Every prompt passed to `input`, in order.
    pub prompts: Vec<String>,

    /// Every output line, in order.
    pub lines: Vec<String>,
}

impl CapturedIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that queues input lines.
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }
}

impl Io for CapturedIo {
    fn input(&mut self, prompt: &str, _expected_type: &str) -> PResult<String> {
        self.prompts.push(prompt.to_string());
        self.inputs
            .pop_front()
            .ok_or_else(|| PseudoError::runtime_error("No more input available", None))
    }

    fn output(&mut self, values: &[OutputValue]) {
        self.lines.push(join(values));
    }
}
