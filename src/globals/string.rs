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

use std::sync::OnceLock;

use regex::Regex;

use crate::globals::{char_arg, int_arg, str_arg, BuiltinContext, BuiltinType, Builtins};
use crate::interpreter::display::format_real;
use crate::value::Value;

/// Installs the string builtins.
///
/// Lengths and positions count characters, not bytes. Positions are
/// 1-based.
pub fn install(builtins: &mut Builtins) {
    use BuiltinType::*;

    builtins.register("LEFT", &[String, Integer], left);
    builtins.register("RIGHT", &[String, Integer], right);
    builtins.register("MID", &[String, Integer, Integer], mid);
    builtins.register("LENGTH", &[String], length);
    builtins.register("TO_UPPER", &[Text], to_upper);
    builtins.register("TO_LOWER", &[Text], to_lower);
    builtins.register("UCASE", &[Char], ucase);
    builtins.register("LCASE", &[Char], lcase);
    builtins.register("NUM_TO_STR", &[Number], num_to_str);
    builtins.register("STR_TO_NUM", &[String], str_to_num);
    builtins.register("IS_NUM", &[String], is_num);
    builtins.register("ASC", &[Char], asc);
    builtins.register("CHR", &[Integer], chr);
}

fn number_pattern() -> Result<&'static Regex, String> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$"))
        .as_ref()
        .map_err(|err| err.to_string())
}

/// True if `text` is an INTEGER or REAL literal, optionally negative.
pub fn is_number(text: &str) -> bool {
    number_pattern().map_or(false, |pattern| pattern.is_match(text))
}

fn char_count(s: &str) -> i64 {
    s.chars().count() as i64
}

fn check_count(n: i64, len: i64, what: &str) -> Result<usize, String> {
    if n < 0 || n > len {
        return Err(format!("{} {} is outside the string of length {}", what, n, len));
    }
    Ok(n as usize)
}

fn left(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let s = str_arg(args, 0)?;
    let n = check_count(int_arg(args, 1)?, char_count(s), "length")?;
    Ok(Value::String(s.chars().take(n).collect()))
}

fn right(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let s = str_arg(args, 0)?;
    let len = char_count(s);
    let n = check_count(int_arg(args, 1)?, len, "length")?;
    Ok(Value::String(s.chars().skip(len as usize - n).collect()))
}

fn mid(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let s = str_arg(args, 0)?;
    let start = int_arg(args, 1)?;
    let count = int_arg(args, 2)?;
    let len = char_count(s);

    if start < 1 || start > len + 1 {
        return Err(format!("start position {} is outside the string of length {}", start, len));
    }
    let count = check_count(count, len - start + 1, "length")?;
    Ok(Value::String(s.chars().skip(start as usize - 1).take(count).collect()))
}

fn length(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    Ok(Value::Integer(char_count(str_arg(args, 0)?)))
}

fn to_upper(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::String(s.to_uppercase())),
        Some(Value::Char(c)) => Ok(Value::Char(c.to_ascii_uppercase())),
        _ => Err("argument 1 must be a STRING or CHAR".to_string()),
    }
}

fn to_lower(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::String(s.to_lowercase())),
        Some(Value::Char(c)) => Ok(Value::Char(c.to_ascii_lowercase())),
        _ => Err("argument 1 must be a STRING or CHAR".to_string()),
    }
}

fn ucase(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    Ok(Value::Char(char_arg(args, 0)?.to_ascii_uppercase()))
}

fn lcase(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    Ok(Value::Char(char_arg(args, 0)?.to_ascii_lowercase()))
}

fn num_to_str(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    match args.first() {
        Some(Value::Integer(n)) => Ok(Value::String(n.to_string())),
        Some(Value::Real(r)) => Ok(Value::String(format_real(*r))),
        _ => Err("argument 1 must be a number".to_string()),
    }
}

fn str_to_num(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let s = str_arg(args, 0)?.trim();
    if !is_number(s) {
        return Err(format!("\"{}\" is not a number", s));
    }
    if s.contains('.') {
        s.parse::<f64>().map(Value::Real).map_err(|err| err.to_string())
    } else {
        s.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("\"{}\" is too large for an INTEGER", s))
    }
}

fn is_num(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    Ok(Value::Boolean(is_number(str_arg(args, 0)?.trim())))
}

fn asc(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    Ok(Value::Integer(char_arg(args, 0)? as i64))
}

fn chr(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let code = int_arg(args, 0)?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(Value::Char)
        .ok_or_else(|| format!("{} is not a valid character code", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::files::FileTable;

    fn call(f: fn(&[Value], &BuiltinContext) -> Result<Value, String>, args: &[Value]) -> Result<Value, String> {
        let files = FileTable::default();
        f(args, &BuiltinContext { files: &files })
    }

    fn text(v: Result<Value, String>) -> String {
        match v {
            Ok(Value::String(s)) => s,
            other => panic!("expected a string, got {:?}", other),
        }
    }

    #[test]
    fn substrings_count_characters() {
        let s = Value::String("héllo".into());
        assert_eq!(text(call(left, &[s.clone(), Value::Integer(2)])), "hé");
        assert_eq!(text(call(right, &[s.clone(), Value::Integer(3)])), "llo");
        assert_eq!(text(call(mid, &[s.clone(), Value::Integer(2), Value::Integer(3)])), "éll");
        assert!(call(left, &[s.clone(), Value::Integer(9)]).is_err());
        assert!(call(mid, &[s, Value::Integer(0), Value::Integer(1)]).is_err());
    }

    #[test]
    fn number_detection() {
        assert!(is_number("42"));
        assert!(is_number("-3.5"));
        assert!(!is_number("3."));
        assert!(!is_number("abc"));
        assert!(matches!(call(str_to_num, &[Value::String("2.5".into())]), Ok(Value::Real(r)) if r == 2.5));
        assert!(matches!(call(str_to_num, &[Value::String("7".into())]), Ok(Value::Integer(7))));
    }

    #[test]
    fn character_codes() {
        assert!(matches!(call(asc, &[Value::Char('A')]), Ok(Value::Integer(65))));
        assert!(matches!(call(chr, &[Value::Integer(97)]), Ok(Value::Char('a'))));
        assert!(call(chr, &[Value::Integer(-1)]).is_err());
    }
}
