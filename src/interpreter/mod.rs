pub mod parser;
pub mod environment;
pub mod control_flow;
pub mod builtins;
pub mod evaluator;

pub use control_flow::ControlFlow;
pub use environment::Environment;
pub use parser::{parse, TokenParser};
pub use evaluator::{parse_and_run, Interpreter, MAX_CALL_DEPTH};
