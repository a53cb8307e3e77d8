use std::fmt;

use owo_colors::OwoColorize;

use crate::error::EmberError;

/// A 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Maps byte offsets into a source buffer to line/column positions.
///
/// Columns are counted in characters, so a multi-byte character advances the
/// column by one.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(offset, _)| offset + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        Position::new(line, column + 1)
    }

    /// Text of a 1-based line without its terminator.
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map_or(self.source.len(), |next| next - 1);
        self.source
            .get(start..end)
            .map(|text| text.trim_end_matches('\r'))
    }
}

/// Renders language errors with the offending source line underneath.
pub struct DiagnosticRenderer<'a> {
    index: LineIndex<'a>,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            index: LineIndex::new(source),
            file_name,
            use_color,
        }
    }

    pub fn render(&self, error: &EmberError) -> String {
        let mut output = String::new();
        let position = error.position;

        output.push_str(&format!(
            "[{}] {}: {}\n",
            position,
            self.style_red_bold(error.kind.name()),
            self.style_bold(&error.message)
        ));

        if let Some(text) = self.index.line_text(position.line) {
            let gutter = position.line.to_string();
            output.push_str(&format!(
                "  {} {}:{}:{}\n",
                self.style_blue("-->"),
                self.file_name,
                position.line,
                position.column
            ));
            output.push_str(&format!(
                "  {} {} {}\n",
                self.style_blue(&gutter),
                self.style_blue("|"),
                text
            ));
            let padding = " ".repeat(gutter.len() + 5 + position.column.saturating_sub(1));
            output.push_str(&format!("{}{}\n", padding, self.style_red("^")));
        }

        output
    }

    fn style_red(&self, s: &str) -> String {
        if self.use_color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_red_bold(&self, s: &str) -> String {
        if self.use_color {
            s.red().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_blue(&self, s: &str) -> String {
        if self.use_color {
            s.blue().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_bold(&self, s: &str) -> String {
        if self.use_color {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }
}

pub fn render_error(source: &str, file_name: &str, error: &EmberError, use_color: bool) -> String {
    DiagnosticRenderer::new(source, file_name, use_color).render(error)
}
