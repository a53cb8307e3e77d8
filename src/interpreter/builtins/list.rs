//! Length and list mutation built-ins.

use super::Console;
use crate::diagnostic::Position;
use crate::error::{EmberError, Result};
use crate::value::Value;

pub fn builtin_len(_console: &mut dyn Console, args: &[Value], position: Position) -> Result<Value> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::List(items) => Ok(Value::Number(items.borrow().len() as f64)),
        other => Err(EmberError::runtime(
            format!("len() expects a string or list, got {}", other.type_name()),
            position,
        )),
    }
}

/// Appends in place, so every alias of the list sees the new element.
pub fn builtin_append(_console: &mut dyn Console, args: &[Value], position: Position) -> Result<Value> {
    match &args[0] {
        Value::List(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(Value::Nil)
        }
        other => Err(EmberError::runtime(
            format!(
                "append() expects a list as first argument, got {}",
                other.type_name()
            ),
            position,
        )),
    }
}
