//! Built-in functions available in every global scope.
//!
//! - **IO**: `print`, `input`
//! - **List**: `len`, `append`
//! - **Type**: `type`, `str`, `num`

mod io;
mod list;
mod types;

pub use io::*;
pub use list::*;
pub use types::*;

use super::Environment;
use crate::value::{Arity, Builtin, BuiltinFn, Value};
use std::rc::Rc;

const REGISTRY: &[(&str, Arity, BuiltinFn)] = &[
    ("print", Arity::Variadic, builtin_print),
    ("len", Arity::Fixed(1), builtin_len),
    ("append", Arity::Fixed(2), builtin_append),
    ("type", Arity::Fixed(1), builtin_type),
    ("str", Arity::Fixed(1), builtin_str),
    ("num", Arity::Fixed(1), builtin_num),
    ("input", Arity::Variadic, builtin_input),
];

/// Binds every built-in into `env`.
pub fn install(env: &Environment) {
    for &(name, arity, func) in REGISTRY {
        env.define(Rc::from(name), Value::Builtin(Rc::new(Builtin { name, arity, func })));
    }
}
