//! Type inspection and conversion built-ins.

use super::Console;
use crate::diagnostic::Position;
use crate::error::{EmberError, Result};
use crate::value::Value;

pub fn builtin_type(_console: &mut dyn Console, args: &[Value], _position: Position) -> Result<Value> {
    Ok(Value::string(args[0].type_name()))
}

pub fn builtin_str(_console: &mut dyn Console, args: &[Value], _position: Position) -> Result<Value> {
    Ok(Value::string(args[0].to_string()))
}

pub fn builtin_num(_console: &mut dyn Console, args: &[Value], position: Position) -> Result<Value> {
    let converted = match &args[0] {
        Value::Number(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        // also takes "inf", "infinity" and "nan" in any case
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    converted.map(Value::Number).ok_or_else(|| {
        EmberError::runtime(
            format!("num() cannot convert '{}' to a number", args[0]),
            position,
        )
    })
}
