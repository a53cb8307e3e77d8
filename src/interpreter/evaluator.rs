use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::diagnostic::Position;
use crate::error::{EmberError, Result};
use crate::lexer::tokenize;
use crate::value::{format_number, Arity, Function, Value};
use super::builtins::{self, Console, StdConsole};
use super::control_flow::ControlFlow;
use super::environment::Environment;
use super::parser::parse;
use std::rc::Rc;

/// Deepest chain of nested user-function calls before evaluation is aborted.
pub const MAX_CALL_DEPTH: usize = 1000;

// Remaining stack below which evaluation moves onto a fresh segment.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

pub struct Interpreter {
    globals: Environment,
    console: Box<dyn Console>,
    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_console(StdConsole)
    }

    pub fn with_console(console: impl Console + 'static) -> Self {
        let globals = Environment::new();
        builtins::install(&globals);
        Self {
            globals,
            console: Box::new(console),
            call_depth: 0,
        }
    }

    /// The global scope. It lives as long as the interpreter, so bindings
    /// made by one `execute` are visible to the next.
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Runs the program's statements in the global scope, stopping at the
    /// first error. A top-level `return` ends the run without error.
    pub fn execute(&mut self, program: &Program) -> Result<()> {
        let globals = self.globals.clone();
        for stmt in &program.statements {
            if let ControlFlow::Return(_) = self.execute_statement(stmt, &globals)? {
                break;
            }
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt, env: &Environment) -> Result<ControlFlow> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let value = self.evaluate(value, env)?;
                // An existing binding anywhere up the chain is rebound, not shadowed.
                if !env.set(name, value.clone()) {
                    env.define(name.clone(), value);
                }
                Ok(ControlFlow::Next)
            }
            StmtKind::IndexAssign {
                target,
                index,
                value,
            } => {
                let object = self.lookup(target, stmt.position, env)?;
                let index = self.evaluate(index, env)?;
                let value = self.evaluate(value, env)?;
                self.assign_index(object, index, value, stmt.position)?;
                Ok(ControlFlow::Next)
            }
            StmtKind::If {
                condition,
                then_body,
                elif_clauses,
                else_body,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    return self.execute_block(then_body, env);
                }
                for (elif_condition, body) in elif_clauses {
                    if self.evaluate(elif_condition, env)?.is_truthy() {
                        return self.execute_block(body, env);
                    }
                }
                match else_body {
                    Some(body) => self.execute_block(body, env),
                    None => Ok(ControlFlow::Next),
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    if let ControlFlow::Return(value) = self.execute_block(body, env)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Next)
            }
            StmtKind::Function { name, params, body } => {
                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                };
                env.define(name.clone(), Value::Function(Rc::new(function)));
                Ok(ControlFlow::Next)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                Ok(ControlFlow::Return(value))
            }
            StmtKind::Expr(expr) => {
                self.evaluate(expr, env)?;
                Ok(ControlFlow::Next)
            }
        }
    }

    /// Runs `stmts` in a fresh child scope of `env`.
    fn execute_block(&mut self, stmts: &[Stmt], env: &Environment) -> Result<ControlFlow> {
        let scope = Environment::with_parent(env);
        self.execute_statements(stmts, &scope)
    }

    fn execute_statements(&mut self, stmts: &[Stmt], env: &Environment) -> Result<ControlFlow> {
        for stmt in stmts {
            if let ControlFlow::Return(value) = self.execute_statement(stmt, env)? {
                return Ok(ControlFlow::Return(value));
            }
        }
        Ok(ControlFlow::Next)
    }

    /// Every user call passes through here, so growing the stack at this
    /// point keeps [`MAX_CALL_DEPTH`] reachable on any host thread.
    fn evaluate(&mut self, expr: &Expr, env: &Environment) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_inner(expr, env))
    }

    fn evaluate_inner(&mut self, expr: &Expr, env: &Environment) -> Result<Value> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::List(elements) => {
                let items = elements
                    .iter()
                    .map(|element| self.evaluate(element, env))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::list(items))
            }
            ExprKind::Identifier(name) => self.lookup(name, expr.position, env),
            ExprKind::Unary { op, operand } => {
                let operand = self.evaluate(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Neg => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(EmberError::type_error(
                            format!("Cannot negate {} (type {})", other, other.type_name()),
                            expr.position,
                        )),
                    },
                }
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left, env)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(left),
                    BinaryOp::Or if left.is_truthy() => Ok(left),
                    BinaryOp::And | BinaryOp::Or => self.evaluate(right, env),
                    _ => {
                        let right = self.evaluate(right, env)?;
                        binary_op(*op, &left, &right, expr.position)
                    }
                }
            }
            ExprKind::Call { callee, args } => {
                let callee = self.evaluate(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, env))
                    .collect::<Result<Vec<_>>>()?;
                self.call_value(callee, args, expr.position)
            }
            ExprKind::Index { object, index } => {
                let object = self.evaluate(object, env)?;
                let index = self.evaluate(index, env)?;
                index_value(&object, &index, expr.position)
            }
        }
    }

    fn lookup(&self, name: &str, position: Position, env: &Environment) -> Result<Value> {
        env.get(name).ok_or_else(|| {
            EmberError::runtime(format!("Undefined variable '{}'", name), position)
        })
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, position: Position) -> Result<Value> {
        match callee {
            Value::Builtin(builtin) => {
                if let Arity::Fixed(expected) = builtin.arity {
                    if expected != args.len() {
                        return Err(arity_error(builtin.name, expected, args.len(), position));
                    }
                }
                (builtin.func)(self.console.as_mut(), &args, position)
            }
            Value::Function(function) => {
                if function.params.len() != args.len() {
                    return Err(arity_error(
                        &function.name,
                        function.params.len(),
                        args.len(),
                        position,
                    ));
                }
                self.call_function(&function, args, position)
            }
            other => Err(EmberError::runtime(
                format!("Cannot call {} (type {})", other, other.type_name()),
                position,
            )),
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>, position: Position) -> Result<Value> {
        self.call_depth += 1;
        if self.call_depth > MAX_CALL_DEPTH {
            log::debug!(
                "recursion limit hit calling {} at {}",
                function.name,
                position
            );
            // Unwinding frames decrement from zero, hence saturating_sub below.
            self.call_depth = 0;
            return Err(EmberError::runtime(
                format!("Maximum recursion depth exceeded ({})", MAX_CALL_DEPTH),
                position,
            ));
        }
        log::trace!("enter {} (depth {})", function.name, self.call_depth);

        let frame = Environment::with_parent(&function.closure);
        for (param, arg) in function.params.iter().zip(args) {
            frame.define(param.clone(), arg);
        }
        let result = self.execute_statements(&function.body, &frame);
        self.call_depth = self.call_depth.saturating_sub(1);

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Next => Ok(Value::Nil),
        }
    }

    fn assign_index(&self, object: Value, index: Value, value: Value, position: Position) -> Result<()> {
        let items = match object {
            Value::List(items) => items,
            other => {
                return Err(EmberError::type_error(
                    format!("Cannot index into {} (type {})", other, other.type_name()),
                    position,
                ));
            }
        };
        let Value::Number(raw) = index else {
            return Err(EmberError::type_error("List index must be a number", position));
        };
        let mut items = items.borrow_mut();
        let slot = checked_index(raw, items.len(), "list", position)?;
        items[slot] = value;
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn arity_error(name: &str, expected: usize, got: usize, position: Position) -> EmberError {
    EmberError::runtime(
        format!("{}() expects {} argument(s), got {}", name, expected, got),
        position,
    )
}

/// Truncates `raw` toward zero and checks it against `len`. `nan` and the
/// infinities never name a slot.
fn checked_index(raw: f64, len: usize, what: &str, position: Position) -> Result<usize> {
    let index = raw.trunc();
    if !index.is_finite() || index < 0.0 || index >= len as f64 {
        return Err(EmberError::runtime(
            format!(
                "Index {} out of range for {} of length {}",
                format_number(index),
                what,
                len
            ),
            position,
        ));
    }
    Ok(index as usize)
}

fn index_value(object: &Value, index: &Value, position: Position) -> Result<Value> {
    match object {
        Value::List(items) => {
            let Value::Number(raw) = index else {
                return Err(EmberError::type_error("List index must be a number", position));
            };
            let items = items.borrow();
            let slot = checked_index(*raw, items.len(), "list", position)?;
            Ok(items[slot].clone())
        }
        Value::String(s) => {
            let Value::Number(raw) = index else {
                return Err(EmberError::type_error("String index must be a number", position));
            };
            let len = s.chars().count();
            let slot = checked_index(*raw, len, "string", position)?;
            Ok(s.chars().nth(slot).map(|c| Value::string(c.to_string())).unwrap_or(Value::Nil))
        }
        other => Err(EmberError::type_error(
            format!("Cannot index into {} (type {})", other, other.type_name()),
            position,
        )),
    }
}

/// Applies a strict binary operator to already-evaluated operands. `and`
/// and `or` short-circuit in [`Interpreter::evaluate`] and never get here.
fn binary_op(op: BinaryOp, left: &Value, right: &Value, position: Position) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::string(joined))
            }
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            _ => Err(operand_error(op, left, right, position)),
        },
        _ => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(operand_error(op, left, right, position));
            };
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Sub => Ok(Value::Number(a - b)),
                BinaryOp::Mul => Ok(Value::Number(a * b)),
                BinaryOp::Div if b == 0.0 => Err(EmberError::runtime("Division by zero", position)),
                BinaryOp::Div => Ok(Value::Number(a / b)),
                BinaryOp::Mod if b == 0.0 => Err(EmberError::runtime("Modulo by zero", position)),
                BinaryOp::Mod => Ok(Value::Number(floored_mod(a, b))),
                BinaryOp::Less => Ok(Value::Bool(a < b)),
                BinaryOp::LessEq => Ok(Value::Bool(a <= b)),
                BinaryOp::Greater => Ok(Value::Bool(a > b)),
                BinaryOp::GreaterEq => Ok(Value::Bool(a >= b)),
                BinaryOp::Add | BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => {
                    Err(operand_error(op, left, right, position))
                }
            }
        }
    }
}

/// Remainder carrying the sign of the divisor.
fn floored_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value, position: Position) -> EmberError {
    EmberError::type_error(
        format!(
            "Cannot apply '{}' to {} ({}) and {} ({})",
            op,
            left,
            left.type_name(),
            right,
            right.type_name()
        ),
        position,
    )
}

/// Lexes, parses and runs `source` against `interpreter`.
pub fn parse_and_run(source: &str, interpreter: &mut Interpreter) -> Result<()> {
    let tokens = tokenize(source)?;
    let program = parse(tokens)?;
    interpreter.execute(&program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn apply(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
        binary_op(op, &left, &right, Position::start())
    }

    #[test]
    fn test_floored_modulo() {
        assert_eq!(floored_mod(17.0, 5.0), 2.0);
        assert_eq!(floored_mod(-7.0, 3.0), 2.0);
        assert_eq!(floored_mod(7.0, -3.0), -2.0);
        assert_eq!(floored_mod(-6.0, 3.0), 0.0);
        assert_eq!(floored_mod(5.5, 2.0), 1.5);
    }

    #[test]
    fn test_arithmetic() {
        let n = Value::Number;
        assert_eq!(apply(BinaryOp::Add, n(1.0), n(2.0)).unwrap(), n(3.0));
        assert_eq!(apply(BinaryOp::Div, n(10.0), n(4.0)).unwrap(), n(2.5));
        assert_eq!(apply(BinaryOp::Mod, n(-1.0), n(5.0)).unwrap(), n(4.0));
        assert_eq!(apply(BinaryOp::LessEq, n(2.0), n(2.0)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_string_concatenation() {
        let joined = apply(BinaryOp::Add, Value::string("foo"), Value::string("bar")).unwrap();
        assert_eq!(joined, Value::string("foobar"));
    }

    #[test]
    fn test_zero_divisors() {
        let error = apply(BinaryOp::Div, Value::Number(1.0), Value::Number(0.0)).unwrap_err();
        assert_eq!((error.kind, error.message.as_str()), (ErrorKind::Runtime, "Division by zero"));
        let error = apply(BinaryOp::Mod, Value::Number(1.0), Value::Number(-0.0)).unwrap_err();
        assert_eq!(error.message, "Modulo by zero");
    }

    #[test]
    fn test_mismatched_operands() {
        let error = apply(BinaryOp::Add, Value::string("a"), Value::Number(1.0)).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Type);
        assert_eq!(error.message, "Cannot apply '+' to a (string) and 1 (number)");

        let error = apply(BinaryOp::Less, Value::Nil, Value::Bool(true)).unwrap_err();
        assert_eq!(error.message, "Cannot apply '<' to nil (nil) and true (bool)");
    }

    #[test]
    fn test_equality_across_types() {
        assert_eq!(
            apply(BinaryOp::Eq, Value::Number(0.0), Value::Bool(false)).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            apply(BinaryOp::NotEq, Value::Nil, Value::Nil).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_logical_operators_are_not_strict() {
        let error = apply(BinaryOp::And, Value::Number(1.0), Value::Number(2.0)).unwrap_err();
        assert_eq!(error.message, "Cannot apply 'and' to 1 (number) and 2 (number)");
        let error = apply(BinaryOp::Or, Value::Nil, Value::string("default")).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Type);
    }

    #[test]
    fn test_non_finite_index_is_out_of_range() {
        let list = Value::list(vec![Value::Number(10.0), Value::Number(20.0)]);
        let error = index_value(&list, &Value::Number(f64::NAN), Position::start()).unwrap_err();
        assert_eq!(error.message, "Index nan out of range for list of length 2");
        let error = index_value(&list, &Value::Number(f64::INFINITY), Position::start()).unwrap_err();
        assert_eq!(error.message, "Index inf out of range for list of length 2");
        assert_eq!(checked_index(1.9, 2, "list", Position::start()).unwrap(), 1);
        assert_eq!(checked_index(-0.5, 2, "list", Position::start()).unwrap(), 0);
    }

    #[test]
    fn test_string_indexing_by_character() {
        let s = Value::string("héllo");
        assert_eq!(index_value(&s, &Value::Number(1.0), Position::start()).unwrap(), Value::string("é"));
        let error = index_value(&s, &Value::Number(5.0), Position::start()).unwrap_err();
        assert_eq!(error.message, "Index 5 out of range for string of length 5");
    }
}
