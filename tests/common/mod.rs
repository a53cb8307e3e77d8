#![allow(dead_code)]

use ember::interpreter::builtins::BufferedConsole;
use ember::interpreter::{parse_and_run, Interpreter};
use ember::EmberError;

/// What a script printed, and the error that stopped it, if any.
pub struct RunOutcome {
    pub output: Vec<String>,
    pub error: Option<EmberError>,
}

/// Runs `source` with scripted `input` lines.
pub fn run_with_input(source: &str, input: &[&str]) -> RunOutcome {
    let console = BufferedConsole::with_input(input.iter().copied());
    let mut interpreter = Interpreter::with_console(console.clone());
    let error = parse_and_run(source, &mut interpreter).err();
    RunOutcome {
        output: console.output(),
        error,
    }
}

/// Runs `source` and returns its printed lines, panicking on any error.
pub fn run_ember(source: &str) -> Vec<String> {
    let outcome = run_with_input(source, &[]);
    if let Some(error) = outcome.error {
        panic!("Script failed: {}", error);
    }
    outcome.output
}

/// Runs `source`, expecting it to fail.
pub fn run_ember_err(source: &str) -> EmberError {
    run_with_input(source, &[])
        .error
        .expect("Expected the script to fail")
}

/// Evaluates a single expression by printing it.
pub fn eval_print(expr: &str) -> String {
    let mut lines = run_ember(&format!("print({})", expr));
    assert_eq!(lines.len(), 1, "expected a single printed line");
    lines.remove(0)
}

pub fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| line.to_string()).collect()
}
