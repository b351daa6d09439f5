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

//! The open-file table and the file statements.
//!
//! Files are read into memory by OPENFILE. Reads and writes work on the
//! in-memory lines; only CLOSEFILE writes them back to the
//! [`FileSystem`](crate::filesystem::FileSystem). RANDOM files hold one
//! record per line, encoded as JSON.

use std::collections::BTreeMap;

use serde_json::json;

use crate::ast::class::FileMode;
use crate::ast::expr::ExprNode;
use crate::error::{PResult, PseudoError};
use crate::globals::time::{format_date, parse_date};
use crate::interpreter::coerce::is_text_type;
use crate::interpreter::display::render;
use crate::interpreter::Runtime;
use crate::span::Span;
use crate::types::{total_size, PrimitiveType, TypeId, VariableType};
use crate::value::{ArrayValue, Value};

#[derive(Debug, Clone)]
pub(crate) struct OpenFile {
    pub mode: FileMode,
    pub lines: Vec<String>,
    /// Next line to read (READ) or current record (RANDOM).
    pub cursor: usize,
}

/// Files opened by the running program, by name.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    open: BTreeMap<String, OpenFile>,
}

impl FileTable {
    /// TRUE when a file opened for READ has no lines left.
    pub fn eof(&self, name: &str) -> Result<bool, String> {
        match self.open.get(name) {
            Some(file) if file.mode == FileMode::Read => Ok(file.cursor >= file.lines.len()),
            Some(file) => Err(format!("file \"{}\" is open for {}, not READ", name, file.mode.keyword())),
            None => Err(format!("file \"{}\" is not open", name)),
        }
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.open.contains_key(name)
    }

    /// Names of the files still open.
    pub fn names(&self) -> Vec<&str> {
        self.open.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

impl<'r> Runtime<'r> {
    /// The open file `name`, which must be open in one of `modes`.
    fn open_file_mut(&mut self, name: &str, modes: &[FileMode], span: Span) -> PResult<&mut OpenFile> {
        let Some(file) = self.files.open.get_mut(name) else {
            return Err(PseudoError::runtime_error(format!("File \"{}\" is not open", name), Some(span))
                .with_help(format!("open it first with OPENFILE \"{}\" FOR ...", name)));
        };
        if !modes.contains(&file.mode) {
            let allowed = modes.iter().map(FileMode::keyword).collect::<Vec<_>>().join(" or ");
            return Err(PseudoError::runtime_error(
                format!("File \"{}\" is open for {}, but this needs {}", name, file.mode.keyword(), allowed),
                Some(span),
            ));
        }
        Ok(file)
    }

    pub(crate) fn exec_open_file(&mut self, filename: &ExprNode, mode: FileMode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        if self.files.is_open(&name) {
            return Err(PseudoError::runtime_error(format!("File \"{}\" is already opened", name), Some(filename.span()))
                .with_help("close it with CLOSEFILE before opening it again"));
        }

        let io_error = |err: std::io::Error| {
            PseudoError::runtime_error(format!("Could not open \"{}\": {}", name, err), Some(span))
        };
        let file = self.fs.open_file(&name, mode != FileMode::Read).map_err(io_error)?;
        let lines = match (file, mode) {
            (None, _) => {
                return Err(PseudoError::runtime_error(format!("File \"{}\" does not exist", name), Some(filename.span())))
            }
            (Some(_), FileMode::Write) => Vec::new(),
            (Some(file), _) => file.text.lines().map(str::to_string).collect(),
        };
        let cursor = if mode == FileMode::Append { lines.len() } else { 0 };

        tracing::debug!(file = %name, mode = mode.keyword(), lines = lines.len(), "open file");
        self.files.open.insert(name, OpenFile { mode, lines, cursor });
        Ok(())
    }

    pub(crate) fn exec_read_file(&mut self, filename: &ExprNode, target: &ExprNode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        let place = self.place(target)?;
        if !is_text_type(&self.types, place.ty) {
            return Err(PseudoError::type_error(
                format!("Cannot READFILE into a {}", self.types.name(place.ty)),
                Some(target.span()),
            ));
        }

        let file = self.open_file_mut(&name, &[FileMode::Read], span)?;
        let Some(line) = file.lines.get(file.cursor).cloned() else {
            return Err(PseudoError::runtime_error(format!("No more lines to read in \"{}\"", name), Some(span))
                .with_help(format!("check EOF(\"{}\") before reading", name)));
        };
        file.cursor += 1;

        let value = self.parse_text(&line, place.ty, target.span())?;
        self.write_place(&place, value, target.span())
    }

    pub(crate) fn exec_write_file(&mut self, filename: &ExprNode, value: &ExprNode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        let tv = self.eval(value, None)?;
        let line = render(&self.types, &tv.value);
        let file = self.open_file_mut(&name, &[FileMode::Write, FileMode::Append], span)?;
        file.lines.push(line);
        Ok(())
    }

    pub(crate) fn exec_close_file(&mut self, filename: &ExprNode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        let Some(file) = self.files.open.remove(&name) else {
            return Err(PseudoError::runtime_error(format!("File \"{}\" is not open", name), Some(span)));
        };

        let io_error = |err: std::io::Error| {
            PseudoError::runtime_error(format!("Could not save \"{}\": {}", name, err), Some(span))
        };
        if file.mode != FileMode::Read {
            let text: String = file.lines.iter().map(|line| format!("{}\n", line)).collect();
            self.fs.update_file(&name, &text).map_err(io_error)?;
        }
        self.fs.close_file(&name).map_err(io_error)?;

        tracing::debug!(file = %name, lines = file.lines.len(), "close file");
        Ok(())
    }

    /// SEEK moves to a 1-based record number.
    pub(crate) fn exec_seek(&mut self, filename: &ExprNode, position: &ExprNode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        let record = self.eval_integer(position)?;
        if record < 1 {
            return Err(PseudoError::runtime_error(
                format!("Record numbers start at 1, found {}", record),
                Some(position.span()),
            ));
        }
        let limit = self.config.runtime.max_file_records;
        let cursor = usize::try_from(record - 1).ok().filter(|cursor| *cursor < limit).ok_or_else(|| {
            PseudoError::runtime_error(
                format!("Record number {} is past the last allowed record ({})", record, limit),
                Some(position.span()),
            )
            .with_help("raise runtime.max_file_records for larger files")
        })?;
        let file = self.open_file_mut(&name, &[FileMode::Random], span)?;
        file.cursor = cursor;
        Ok(())
    }

    /// Reads the record at the current position. The position does not
    /// move.
    pub(crate) fn exec_get_record(&mut self, filename: &ExprNode, target: &ExprNode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        let place = self.place(target)?;

        let file = self.open_file_mut(&name, &[FileMode::Random], span)?;
        let record = file.cursor + 1;
        let line = file.lines.get(file.cursor).cloned().unwrap_or_else(|| "null".to_string());

        let json: serde_json::Value = serde_json::from_str(&line).map_err(|err| {
            PseudoError::runtime_error(format!("Record {} of \"{}\" is damaged: {}", record, name, err), Some(span))
        })?;
        if json.is_null() {
            return Err(PseudoError::runtime_error(
                format!("Record {} of \"{}\" is empty", record, name),
                Some(span),
            ));
        }

        let value = self.json_to_value(&json, place.ty, span)?;
        self.write_place(&place, value, target.span())
    }

    /// Writes a record at the current position, padding the file with
    /// empty records if needed.
    pub(crate) fn exec_put_record(&mut self, filename: &ExprNode, value: &ExprNode, span: Span) -> PResult<()> {
        let name = self.eval_string(filename)?;
        let tv = self.eval(value, None)?;
        let json = self.value_to_json(&tv.value, span)?.to_string();

        let file = self.open_file_mut(&name, &[FileMode::Random], span)?;
        if file.lines.len() <= file.cursor {
            file.lines.resize(file.cursor + 1, "null".to_string());
        }
        file.lines[file.cursor] = json;
        Ok(())
    }

    /// Warns about files the program left open. Their changes are not
    /// saved.
    pub(crate) fn report_unclosed_files(&self) {
        for name in self.files.names() {
            tracing::warn!(file = %name, "file was never closed; its changes were not saved");
        }
    }

    /* ============================================================================
     * Record encoding
     * ============================================================================
     */

    fn value_to_json(&self, value: &Value, span: Span) -> PResult<serde_json::Value> {
        let slot = |rt: &Self, value: &Option<Value>| match value {
            Some(v) => rt.value_to_json(v, span),
            None => Ok(serde_json::Value::Null),
        };

        Ok(match value {
            Value::Integer(n) => json!(n),
            Value::Real(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => json!(s),
            Value::Char(c) => json!(c.to_string()),
            Value::Boolean(b) => json!(b),
            Value::Date(date) => json!(format_date(date)),
            Value::Enum { .. } => json!(render(&self.types, value)),
            Value::Array(array) => serde_json::Value::Array(
                array.data.iter().map(|v| slot(self, v)).collect::<PResult<Vec<_>>>()?,
            ),
            Value::Set { values, .. } => serde_json::Value::Array(
                values.iter().map(|v| self.value_to_json(v, span)).collect::<PResult<Vec<_>>>()?,
            ),
            Value::Record { ty, fields } => {
                let names = self.types.as_record(*ty).map(|r| r.fields.clone()).unwrap_or_default();
                let mut object = serde_json::Map::new();
                for ((field, _), value) in names.iter().zip(fields) {
                    object.insert(field.clone(), slot(self, value)?);
                }
                serde_json::Value::Object(object)
            }
            Value::Pointer { .. } | Value::Class(_) => {
                return Err(PseudoError::runtime_error(
                    "Pointers and objects cannot be stored in a file",
                    Some(span),
                ))
            }
        })
    }

    fn json_to_value(&self, json: &serde_json::Value, ty: TypeId, span: Span) -> PResult<Value> {
        let mismatch = || {
            PseudoError::runtime_error(
                format!("The stored record {} is not a valid {}", json, self.types.name(ty)),
                Some(span),
            )
        };
        let slot = |json: &serde_json::Value, ty: TypeId| -> PResult<Option<Value>> {
            if json.is_null() {
                Ok(None)
            } else {
                self.json_to_value(json, ty, span).map(Some)
            }
        };

        match self.types.get(ty) {
            VariableType::Primitive(p) => match (p, json) {
                (PrimitiveType::Integer, _) => json.as_i64().map(Value::Integer).ok_or_else(mismatch),
                (PrimitiveType::Real, _) => json.as_f64().map(Value::Real).ok_or_else(mismatch),
                (PrimitiveType::String, serde_json::Value::String(s)) => Ok(Value::String(s.clone())),
                (PrimitiveType::Char, serde_json::Value::String(s)) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(Value::Char(c)),
                        _ => Err(mismatch()),
                    }
                }
                (PrimitiveType::Boolean, serde_json::Value::Bool(b)) => Ok(Value::Boolean(*b)),
                (PrimitiveType::Date, serde_json::Value::String(s)) => parse_date(s).map(Value::Date).ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            VariableType::IntegerRange { low, high } => match json.as_i64() {
                Some(n) if (*low..=*high).contains(&n) => Ok(Value::Integer(n)),
                _ => Err(mismatch()),
            },
            VariableType::Enum(e) => json
                .as_str()
                .and_then(|name| e.variants.iter().position(|v| v == name))
                .map(|index| Value::Enum { ty, index })
                .ok_or_else(mismatch),
            VariableType::Array(array) => {
                let (Some(bounds), Some(items)) = (&array.bounds, json.as_array()) else {
                    return Err(mismatch());
                };
                if items.len() as u64 != total_size(bounds) {
                    return Err(mismatch());
                }
                let data = items.iter().map(|item| slot(item, array.element)).collect::<PResult<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue {
                    element: array.element,
                    bounds: bounds.clone(),
                    data,
                }))
            }
            VariableType::Set(set) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                let values = items
                    .iter()
                    .map(|item| self.json_to_value(item, set.element, span))
                    .collect::<PResult<Vec<_>>>()?;
                Ok(Value::Set { ty, values })
            }
            VariableType::Record(record) => {
                let object = json.as_object().ok_or_else(mismatch)?;
                let fields = record
                    .fields
                    .iter()
                    .map(|(name, field_ty)| match object.get(name) {
                        Some(item) => slot(item, *field_ty),
                        None => Ok(None),
                    })
                    .collect::<PResult<Vec<_>>>()?;
                Ok(Value::Record { ty, fields })
            }
            VariableType::Pointer(_) | VariableType::Class(_) => Err(PseudoError::runtime_error(
                "Pointers and objects cannot be read from a file",
                Some(span),
            )),
        }
    }
}
