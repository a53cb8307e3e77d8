use crate::value::Value;

/// Outcome of running a statement.
pub enum ControlFlow {
    Next,
    Return(Value),
}
