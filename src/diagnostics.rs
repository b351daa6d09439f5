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

use crate::error::PseudoError;
use crate::span::Span;

/// Responsible for rendering human-friendly, compiler-style diagnostics
/// for interpreter errors.
///
/// This printer:
/// - Formats errors with file/line/column information
/// - Displays the offending source line
/// - Underlines the specific range with `^` and the rest of the general
///   range with `~`
/// - Lists notes, context frames and an optional help line
///
/// The output is intentionally inspired by `rustc` diagnostics, but
/// simplified and designed to remain readable without color.
pub struct DiagnosticPrinter {
    /// Full source code of the program being interpreted.
    source: String,

    /// Name of the source file, used only for display purposes.
    file_name: String,
}

impl DiagnosticPrinter {
    /// Creates a new diagnostic printer for a given source file.
    ///
    /// # Arguments
    /// - `file_name` → The name of the file being executed
    /// - `source` → The full source text of that file
    pub fn new(file_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            source: source.into(),
        }
    }

    /// Renders a diagnostic into a string.
    ///
    /// # Output Example
    /// ```text
    /// error[E_RUNTIME]: Division by zero
    ///   --> main.pseudo:3:10
    ///    |
    ///  3 | x <- 10 / 0
    ///    | ~~~~~~~~~^~
    /// help: check the divisor before dividing
    /// ```
    pub fn render(&self, error: &PseudoError) -> String {
        let mut out = String::new();
        out.push_str(&format!("error[{}]: {}\n", error.code, error.message));

        let anchor = error.span.or(error.general_span);
        if let Some(anchor) = anchor {
            let (line, column) = anchor.line_col(&self.source);
            out.push_str(&format!("  --> {}:{}:{}\n", self.file_name, line, column + 1));
            out.push_str("   |\n");

            let src_line = self.source.lines().nth(line.saturating_sub(1)).unwrap_or("");
            out.push_str(&format!("{:>3} | {}\n", line, src_line));

            let underline = self.underline(line, error.span, error.general_span);
            if !underline.trim().is_empty() {
                out.push_str(&format!("   | {}\n", underline.trim_end()));
            }
        }

        for detail in &error.details {
            out.push_str(&format!("   = note: {}\n", detail));
        }
        for frame in &error.context {
            out.push_str(&format!("   = {}\n", frame));
        }
        if let Some(help) = &error.help {
            out.push_str(&format!("help: {}\n", help));
        }

        out
    }

    /// Prints a formatted error diagnostic to stderr.
    pub fn print(&self, error: &PseudoError) {
        eprint!("{}", self.render(error));
    }

    /// Builds the marker line beneath source line `line`.
    ///
    /// Only the parts of the spans that fall on that line are marked.
    fn underline(&self, line: usize, specific: Option<Span>, general: Option<Span>) -> String {
        let line_start = self
            .source
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum::<usize>();
        let src_line = self.source.lines().nth(line.saturating_sub(1)).unwrap_or("");

        let mut marks = String::new();
        for (offset, ch) in src_line.char_indices() {
            let pos = line_start + offset;
            let in_specific = specific.map_or(false, |s| pos >= s.start && pos < s.end);
            let in_general = general.map_or(false, |s| pos >= s.start && pos < s.end);

            let mark = if in_specific {
                '^'
            } else if in_general {
                '~'
            } else {
                ' '
            };

            // Keep tabs so the marker lines up with the source above it.
            marks.push(if ch == '\t' && mark == ' ' { '\t' } else { mark });
        }

        // Zero-width spans (e.g. "unexpected end of line") still get a caret.
        if let Some(s) = specific {
            if s.is_empty() && s.start >= line_start && s.start <= line_start + src_line.len() {
                let col = self.source[line_start..s.start].chars().count();
                while marks.chars().count() < col {
                    marks.push(' ');
                }
                marks.push('^');
            }
        }

        marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_marks_specific_and_general_ranges() {
        let source = "DECLARE x: INTEGER\nx <- 10 / 0\n";
        let start = source.find("10 / 0").unwrap();
        let error = PseudoError::runtime_error("Division by zero", Some(Span::new(start + 5, start + 6)))
            .with_general_span(Span::new(start - 5, start + 6))
            .with_help("check the divisor before dividing");

        let rendered = DiagnosticPrinter::new("main.pseudo", source).render(&error);

        assert!(rendered.starts_with("error[E_RUNTIME]: Division by zero"));
        assert!(rendered.contains("--> main.pseudo:2:11"));
        assert!(rendered.contains("  2 | x <- 10 / 0"));
        assert!(rendered.contains("~~~~~~~~~~^"));
        assert!(rendered.contains("help: check the divisor"));
    }
}
