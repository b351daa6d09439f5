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

use rand::Rng;

use crate::globals::{int_arg, real_arg, BuiltinContext, BuiltinType, Builtins};
use crate::value::Value;

/// Installs the math builtins.
pub fn install(builtins: &mut Builtins) {
    use BuiltinType::*;

    // Rounding
    builtins.register("INT", &[Real], int);
    builtins.register("ROUND", &[Real, Integer], round);

    // Randomness
    builtins.register("RAND", &[Integer], rand_real);
    builtins.register("RANDOMBETWEEN", &[Integer, Integer], random_between);

    // Powers & roots
    builtins.register("POW", &[Number, Number], pow);
    builtins.register("EXP", &[Real], exp);
    builtins.register("SQRT", &[Real], sqrt);

    // Trigonometry (radians)
    builtins.register("SIN", &[Real], |args, _| Ok(Value::Real(real_arg(args, 0)?.sin())));
    builtins.register("COS", &[Real], |args, _| Ok(Value::Real(real_arg(args, 0)?.cos())));
    builtins.register("TAN", &[Real], |args, _| Ok(Value::Real(real_arg(args, 0)?.tan())));
}

fn finite(x: f64) -> Result<Value, String> {
    if x.is_finite() {
        Ok(Value::Real(x))
    } else {
        Err("the result is not a finite number".to_string())
    }
}

/// Truncates toward zero.
fn int(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let x = real_arg(args, 0)?.trunc();
    if !x.is_finite() || x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err(format!("{} does not fit in an INTEGER", x));
    }
    Ok(Value::Integer(x as i64))
}

fn round(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let x = real_arg(args, 0)?;
    let places = int_arg(args, 1)?;
    if !(0..=15).contains(&places) {
        return Err(format!("cannot round to {} decimal places", places));
    }
    let factor = 10f64.powi(places as i32);
    finite((x * factor).round() / factor)
}

/// A REAL in `[0, x)`.
fn rand_real(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let x = int_arg(args, 0)?;
    if x <= 0 {
        return Err(format!("the upper limit must be positive, found {}", x));
    }
    Ok(Value::Real(rand::thread_rng().gen_range(0.0..x as f64)))
}

/// An INTEGER in `[low, high]`.
fn random_between(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let low = int_arg(args, 0)?;
    let high = int_arg(args, 1)?;
    if low > high {
        return Err(format!("the lower limit {} is greater than the upper limit {}", low, high));
    }
    Ok(Value::Integer(rand::thread_rng().gen_range(low..=high)))
}

fn pow(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    match (args.first(), args.get(1)) {
        (Some(Value::Integer(base)), Some(Value::Integer(power))) if *power >= 0 => u32::try_from(*power)
            .ok()
            .and_then(|power| base.checked_pow(power))
            .map(Value::Integer)
            .ok_or_else(|| "the result is too large for an INTEGER".to_string()),
        _ => finite(real_arg(args, 0)?.powf(real_arg(args, 1)?)),
    }
}

fn exp(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    finite(real_arg(args, 0)?.exp())
}

fn sqrt(args: &[Value], _: &BuiltinContext) -> Result<Value, String> {
    let x = real_arg(args, 0)?;
    if x < 0.0 {
        return Err(format!("cannot take the square root of the negative number {}", x));
    }
    finite(x.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::files::FileTable;

    fn call(f: fn(&[Value], &BuiltinContext) -> Result<Value, String>, args: &[Value]) -> Result<Value, String> {
        let files = FileTable::default();
        f(args, &BuiltinContext { files: &files })
    }

    #[test]
    fn int_truncates_toward_zero() {
        assert!(matches!(call(int, &[Value::Real(-2.7)]), Ok(Value::Integer(-2))));
        assert!(matches!(call(int, &[Value::Real(2.7)]), Ok(Value::Integer(2))));
    }

    #[test]
    fn round_to_places() {
        assert!(matches!(call(round, &[Value::Real(1.23456), Value::Integer(2)]), Ok(Value::Real(r)) if (r - 1.23).abs() < 1e-9));
    }

    #[test]
    fn random_between_stays_in_range() {
        for _ in 0..100 {
            let Ok(Value::Integer(n)) = call(random_between, &[Value::Integer(3), Value::Integer(5)]) else {
                panic!("expected an integer");
            };
            assert!((3..=5).contains(&n));
        }
        assert!(call(random_between, &[Value::Integer(5), Value::Integer(3)]).is_err());
    }

    #[test]
    fn integer_powers_stay_integers() {
        assert!(matches!(call(pow, &[Value::Integer(2), Value::Integer(10)]), Ok(Value::Integer(1024))));
        assert!(matches!(call(pow, &[Value::Integer(2), Value::Integer(-1)]), Ok(Value::Real(r)) if r == 0.5));
        assert!(call(sqrt, &[Value::Real(-1.0)]).is_err());
    }
}
