use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;
use crate::diagnostic::Position;
use crate::error::Result;
use crate::interpreter::builtins::Console;
use crate::interpreter::Environment;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    /// Lists are shared: copies of the value alias the same storage.
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Builtin(Rc<Builtin>),
}

type ListPtr = *const RefCell<Vec<Value>>;

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut Vec::new())
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// `nil` and `false` are the only falsy values.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) | Value::Builtin(_) => "function",
        }
    }

    /// Structural equality. `open` holds the list pairs currently being
    /// compared; meeting one again means the cycles line up, so it counts as
    /// equal.
    fn equals(&self, other: &Value, open: &mut Vec<(ListPtr, ListPtr)>) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::List(left), Value::List(right)) => {
                if Rc::ptr_eq(left, right) {
                    return true;
                }
                let pair = (Rc::as_ptr(left), Rc::as_ptr(right));
                if open.contains(&pair) {
                    return true;
                }
                let left = left.borrow();
                let right = right.borrow();
                if left.len() != right.len() {
                    return false;
                }
                open.push(pair);
                let equal = left.iter().zip(right.iter()).all(|(a, b)| a.equals(b, open));
                open.pop();
                equal
            }
            (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
            (Value::Builtin(left), Value::Builtin(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<ListPtr>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                let ptr = Rc::as_ptr(items);
                if open.contains(&ptr) {
                    return f.write_str("[...]");
                }
                open.push(ptr);
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.render(f, open)?;
                }
                open.pop();
                f.write_str("]")
            }
            Value::Function(function) => write!(f, "<fn {}>", function.name),
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut Vec::new())
    }
}

/// Integral values print without a fractional part; `-0` prints as `0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// A user-defined function together with the scope it was declared in.
pub struct Function {
    pub name: Rc<str>,
    pub params: Rc<[Rc<str>]>,
    pub body: Rc<[Stmt]>,
    pub closure: Environment,
}

// The closure usually reaches this function again, so Debug stays shallow.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

pub type BuiltinFn = fn(&mut dyn Console, &[Value], Position) -> Result<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}
