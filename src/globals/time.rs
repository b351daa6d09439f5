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

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

use crate::globals::{date_arg, int_arg, BuiltinContext, BuiltinType, Builtins};
use crate::value::Value;

/// Installs the date builtins.
pub fn install(builtins: &mut Builtins) {
    use BuiltinType::*;

    builtins.register("DAY", &[Date], |args, _| Ok(Value::Integer(date_arg(args, 0)?.day() as i64)));
    builtins.register("MONTH", &[Date], |args, _| Ok(Value::Integer(date_arg(args, 0)?.month() as i64)));
    builtins.register("YEAR", &[Date], |args, _| Ok(Value::Integer(date_arg(args, 0)?.year() as i64)));
    builtins.register("DAYINDEX", &[Date], day_index);
    builtins.register("SETDATE", &[Integer, Integer, Integer], set_date);
    builtins.register("TODAY", &[], |_, _| Ok(Value::Date(Local::now().date_naive())));
}

fn date_pattern() -> Result<&'static Regex, String> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$"))
        .as_ref()
        .map_err(|err| err.to_string())
}

/// Parses `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let pattern = date_pattern().ok()?;
    let caps = pattern.captures(text.trim())?;
    let day = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let year = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Renders `DD/MM/YYYY`.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Day of the week, Sunday = 1.
fn day_index(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let date = date_arg(args, 0)?;
    Ok(Value::Integer(date.weekday().num_days_from_sunday() as i64 + 1))
}

fn set_date(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let day = int_arg(args, 0)?;
    let month = int_arg(args, 1)?;
    let year = int_arg(args, 2)?;

    let date = match (i32::try_from(year), u32::try_from(month), u32::try_from(day)) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    date.map(Value::Date)
        .ok_or_else(|| format!("{}/{}/{} is not a valid date", day, month, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::files::FileTable;

    #[test]
    fn dates_round_trip_through_text() {
        let date = parse_date("05/11/2023").unwrap();
        assert_eq!(format_date(&date), "05/11/2023");
        assert!(parse_date("31/02/2023").is_none());
        assert!(parse_date("2023-11-05").is_none());
    }

    #[test]
    fn day_index_starts_on_sunday() {
        let files = FileTable::default();
        let ctx = BuiltinContext { files: &files };
        // 5 November 2023 was a Sunday.
        let sunday = Value::Date(NaiveDate::from_ymd_opt(2023, 11, 5).unwrap());
        assert!(matches!(day_index(&[sunday], &ctx), Ok(Value::Integer(1))));
        let invalid = [Value::Integer(30), Value::Integer(2), Value::Integer(2024)];
        assert!(set_date(&invalid, &ctx).is_err());
    }
}
