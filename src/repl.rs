//! Interactive shell.

use std::io::{self, BufRead, Write};

use owo_colors::OwoColorize;

use crate::interpreter::{parse_and_run, Interpreter};

pub const PROMPT: &str = "ember> ";
pub const CONTINUATION_PROMPT: &str = "  ...> ";

/// Net change in block nesting contributed by one line: `+1` per `do`, `-1`
/// per `end`, counting whole whitespace-separated words before any `#`.
pub fn nesting_depth(line: &str) -> i32 {
    let code = line.split('#').next().unwrap_or_default();
    code.split_whitespace()
        .map(|word| match word {
            "do" => 1,
            "end" => -1,
            _ => 0,
        })
        .sum()
}

pub struct Repl<R, W, E> {
    input: R,
    output: W,
    errors: E,
    use_color: bool,
}

impl<R: BufRead, W: Write, E: Write> Repl<R, W, E> {
    pub fn new(input: R, output: W, errors: E, use_color: bool) -> Self {
        Self {
            input,
            output,
            errors,
            use_color,
        }
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Reads one submission, continuing onto further lines while a `do`
    /// block is still open. Returns `None` once input is exhausted.
    pub fn read_submission(&mut self) -> io::Result<Option<String>> {
        let Some(first) = self.prompt_line(PROMPT)? else {
            return Ok(None);
        };

        let mut depth = nesting_depth(&first);
        let mut lines = vec![first];
        while depth > 0 {
            match self.prompt_line(CONTINUATION_PROMPT)? {
                Some(line) => {
                    depth += nesting_depth(&line);
                    lines.push(line);
                }
                None => break,
            }
        }
        Ok(Some(lines.join("\n")))
    }

    /// Reads and runs submissions against `interpreter` until input ends.
    pub fn run(&mut self, interpreter: &mut Interpreter) -> io::Result<()> {
        writeln!(
            self.output,
            "Ember {} interactive shell",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.output, "Type expressions or statements. Press Ctrl+D to exit.")?;
        writeln!(self.output)?;

        while let Some(source) = self.read_submission()? {
            if source.trim().is_empty() {
                continue;
            }
            log::debug!("repl submission of {} bytes", source.len());
            if let Err(error) = parse_and_run(&source, interpreter) {
                let message = error.to_string();
                if self.use_color {
                    writeln!(self.errors, "{}", message.red().bold())?;
                } else {
                    writeln!(self.errors, "{}", message)?;
                }
            }
        }

        writeln!(self.output)?;
        writeln!(self.output, "Goodbye!")?;
        self.output.flush()
    }
}
