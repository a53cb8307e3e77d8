pub mod ast;
pub mod cli;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod repl;
pub mod token;
pub mod value;

pub use ast::{dump_program, Expr, ExprKind, Program, Stmt, StmtKind};
pub use diagnostic::Position;
pub use error::{EmberError, ErrorKind};
pub use interpreter::Interpreter;
pub use token::{Token, TokenKind};
pub use value::Value;
