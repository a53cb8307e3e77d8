//! Input/output built-in functions and the host console they talk to.

use crate::diagnostic::Position;
use crate::error::{EmberError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Where `print` writes and `input` reads.
pub trait Console {
    fn write_line(&mut self, line: &str);

    /// Shows `prompt` and reads one line without its terminator.
    /// `Ok(None)` signals end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Console bound to the process's stdout and stdin.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) {
        println!("{}", line);
        io::stdout().flush().ok();
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// In-memory console: records output and replays scripted input.
///
/// Clones share the same output buffer, so a handle kept by the caller sees
/// everything printed through the copy handed to an interpreter.
#[derive(Debug, Clone, Default)]
pub struct BufferedConsole {
    output: Rc<RefCell<Vec<String>>>,
    input: Rc<RefCell<VecDeque<String>>>,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Self::default();
        console
            .input
            .borrow_mut()
            .extend(lines.into_iter().map(Into::into));
        console
    }

    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }
}

impl Console for BufferedConsole {
    fn write_line(&mut self, line: &str) {
        self.output.borrow_mut().push(line.to_string());
    }

    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(self.input.borrow_mut().pop_front())
    }
}

pub fn builtin_print(console: &mut dyn Console, args: &[Value], _position: Position) -> Result<Value> {
    let output: Vec<String> = args.iter().map(Value::to_string).collect();
    console.write_line(&output.join(" "));
    Ok(Value::Nil)
}

pub fn builtin_input(console: &mut dyn Console, args: &[Value], position: Position) -> Result<Value> {
    let prompt = args.first().map(Value::to_string).unwrap_or_default();
    match console.read_line(&prompt) {
        Ok(Some(line)) => Ok(Value::string(line)),
        Ok(None) => Ok(Value::Nil),
        Err(e) => Err(EmberError::runtime(
            format!("Failed to read input: {}", e),
            position,
        )),
    }
}
