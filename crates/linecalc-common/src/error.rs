//! Evaluation error shared by the parser, the evaluator, and the line engine.
//!
//! - **`CalcErrorKind`**: the fixed set of failure categories
//! - **`CalcError`**    : kind + optional human message, built fluently
//!
//! The engine only ever shows `Display` output to users, so messages are kept
//! short and free of internal detail.

use std::{error::Error, fmt};

/// All recognised failure categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CalcErrorKind {
    /// Tokenizer or parser rejected the text.
    Syntax,
    /// Identifier not present in scope, constants, functions, or units.
    UndefinedSymbol,
    /// Operator or function applied to a value of the wrong type.
    Type,
    /// Dimension mismatch or unknown unit.
    Unit,
    /// Mathematically undefined input (e.g. `factorial(-1)`).
    Domain,
    /// Wrong number of function arguments.
    Arity,
    /// Parentheses that do not pair up.
    Unbalanced,
    /// Date operand did not match any configured format.
    InvalidDate,
}

impl fmt::Display for CalcErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "Syntax error",
            Self::UndefinedSymbol => "Undefined symbol",
            Self::Type => "Type error",
            Self::Unit => "Unit error",
            Self::Domain => "Domain error",
            Self::Arity => "Wrong number of arguments",
            Self::Unbalanced => "Unbalanced parentheses",
            Self::InvalidDate => "Invalid Date",
        })
    }
}

/// The single error struct passed around by every layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalcError {
    pub kind: CalcErrorKind,
    pub message: Option<String>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<CalcErrorKind> for CalcError {
    fn from(kind: CalcErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl CalcError {
    /// Basic constructor (no message).
    pub fn new(kind: CalcErrorKind) -> Self {
        kind.into()
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Self::new(CalcErrorKind::Syntax).with_message(msg)
    }

    pub fn undefined(name: &str) -> Self {
        Self::new(CalcErrorKind::UndefinedSymbol).with_message(name.to_string())
    }

    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::new(CalcErrorKind::Type).with_message(msg)
    }

    pub fn unit<S: Into<String>>(msg: S) -> Self {
        Self::new(CalcErrorKind::Unit).with_message(msg)
    }

    pub fn domain<S: Into<String>>(msg: S) -> Self {
        Self::new(CalcErrorKind::Domain).with_message(msg)
    }

    pub fn arity(name: &str, expected: &str, got: usize) -> Self {
        Self::new(CalcErrorKind::Arity)
            .with_message(format!("{name} expects {expected} argument(s), got {got}"))
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.message) {
            // "Undefined symbol foo" reads better without a colon.
            (CalcErrorKind::UndefinedSymbol, Some(name)) => write!(f, "{} {name}", self.kind),
            (kind, Some(msg)) => write!(f, "{kind}: {msg}"),
            (kind, None) => write!(f, "{kind}"),
        }
    }
}

impl Error for CalcError {}

impl From<CalcError> for String {
    fn from(error: CalcError) -> Self {
        format!("{error}")
    }
}

impl PartialEq<CalcErrorKind> for CalcError {
    fn eq(&self, other: &CalcErrorKind) -> bool {
        self.kind == *other
    }
}
