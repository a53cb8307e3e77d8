use std::fmt;

use crate::diagnostic::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed token or grammar, raised by the lexer and parser.
    Syntax,
    /// Semantically invalid operation on well-typed values.
    Runtime,
    /// Operand or operator type mismatch.
    Type,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Runtime => "RuntimeError",
            ErrorKind::Type => "TypeError",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmberError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Position,
}

pub type Result<T> = std::result::Result<T, EmberError>;

impl EmberError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }

    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Syntax, message, position)
    }

    pub fn runtime(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Runtime, message, position)
    }

    pub fn type_error(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Type, message, position)
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

impl fmt::Display for EmberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.position, self.kind.name(), self.message)
    }
}

impl std::error::Error for EmberError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_format() {
        let syntax = EmberError::syntax("bad token", Position::new(5, 10));
        assert_eq!(syntax.to_string(), "[line 5, col 10] SyntaxError: bad token");

        let runtime = EmberError::runtime("undefined var", Position::new(3, 1));
        assert_eq!(runtime.to_string(), "[line 3, col 1] RuntimeError: undefined var");

        let type_error = EmberError::type_error("expected number", Position::new(7, 4));
        assert_eq!(type_error.to_string(), "[line 7, col 4] TypeError: expected number");
        assert_eq!((type_error.line(), type_error.column()), (7, 4));
    }
}
