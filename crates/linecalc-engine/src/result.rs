use linecalc_common::Value;

/// One line's outcome for a pass. Produced exactly once per line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineResult {
    /// Blank, comment-only, or nothing left to evaluate. Also used for
    /// failures when line errors are switched off.
    Empty,
    Value {
        value: Value,
        display: String,
        copy_text: String,
    },
    /// `line` is 1-based.
    Error { line: usize, message: String },
    /// A single-variable function definition for the plotter.
    Plot { expression: String },
}

impl LineResult {
    pub fn error(index: usize, message: &str) -> Self {
        LineResult::Error {
            line: index + 1,
            message: sanitize_message(message),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, LineResult::Empty)
    }

    pub fn display(&self) -> Option<&str> {
        match self {
            LineResult::Value { display, .. } => Some(display),
            _ => None,
        }
    }

    pub fn copy_text(&self) -> Option<&str> {
        match self {
            LineResult::Value { copy_text, .. } => Some(copy_text),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            LineResult::Value { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Straight quotes become typographic ones so messages can be embedded in
/// markup attributes.
pub fn sanitize_message(message: &str) -> String {
    message
        .chars()
        .map(|c| match c {
            '"' => '\u{201D}',
            '\'' => '\u{2019}',
            other => other,
        })
        .collect()
}
