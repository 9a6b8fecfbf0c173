use std::fmt::{self, Display};

use crate::Quantity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A user-defined single-line function, e.g. `f(x) = sin(x)`.
///
/// The body is kept as source text; the evaluator re-parses (and caches) it on call.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
}

impl FunctionDef {
    pub fn source(&self) -> String {
        format!("{}({}) = {}", self.name, self.params.join(", "), self.body)
    }

    /// Single-variable `x` functions are the ones the plotter understands.
    pub fn is_plottable(&self) -> bool {
        self.params.len() == 1 && self.params[0] == "x"
    }
}

/// An **evaluator** value: the result of evaluating one expression.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Numeric(f64),
    Quantity(Quantity),
    Textual(String),
    Boolean(bool),
    Matrix(Vec<Vec<Value>>),
    FunctionExpr(FunctionDef),
}

impl Value {
    /// Only plain numbers feed averages, totals, and subtotals.
    pub fn is_aggregable(&self) -> bool {
        matches!(self, Value::Numeric(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Textual(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Function definitions, and text that spells one out, become plot descriptors.
    pub fn is_plot_shaped(&self) -> bool {
        match self {
            Value::FunctionExpr(def) => def.is_plottable(),
            Value::Textual(s) => is_plot_source(s),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Numeric(_) => "number",
            Value::Quantity(_) => "unit",
            Value::Textual(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Matrix(_) => "matrix",
            Value::FunctionExpr(_) => "function",
        }
    }

    /// Render back into source text the parser accepts and that evaluates to an
    /// equal value. Used wherever an answer is spliced textually into a line.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Numeric(n) => number_literal(*n),
            Value::Quantity(q) => {
                if q.unit.is_empty() {
                    number_literal(q.value)
                } else {
                    format!("({} {})", number_literal(q.value), q.unit)
                }
            }
            Value::Textual(s) => quote_text(s),
            Value::Boolean(b) => b.to_string(),
            Value::Matrix(rows) => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|r| {
                        r.iter()
                            .map(Value::to_literal)
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .collect();
                format!("[{}]", rows.join("; "))
            }
            Value::FunctionExpr(def) => def.name.clone(),
        }
    }
}

/// `<identifier>(x) = …`
pub fn is_plot_source(text: &str) -> bool {
    let t = text.trim();
    let Some(open) = t.find('(') else {
        return false;
    };
    let name = t[..open].trim_end();
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    let rest = t[open + 1..].trim_start();
    let Some(rest) = rest.strip_prefix('x') else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix(')') else {
        return false;
    };
    let rest = rest.trim_start();
    rest.starts_with('=') && !rest.starts_with("==")
}

fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "(-Infinity)".to_string()
        }
    } else if n < 0.0 || (n == 0.0 && n.is_sign_negative()) {
        format!("({n})")
    } else {
        format!("{n}")
    }
}

fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(n) => write!(f, "{n}"),
            Value::Quantity(q) if q.unit.is_empty() => write!(f, "{}", q.value),
            Value::Quantity(q) => write!(f, "{} {}", q.value, q.unit),
            Value::Textual(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Matrix(_) => write!(f, "{}", self.to_literal()),
            Value::FunctionExpr(def) => write!(f, "{}", def.source()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Numeric(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Textual(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Textual(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_wraps_negatives_and_quotes_text() {
        assert_eq!(Value::Numeric(-4.0).to_literal(), "(-4)");
        assert_eq!(Value::Numeric(0.1).to_literal(), "0.1");
        assert_eq!(Value::Numeric(f64::INFINITY).to_literal(), "Infinity");
        assert_eq!(Value::from("say \"hi\"").to_literal(), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn plot_shape_detection() {
        assert!(is_plot_source("f(x) = sin(x)"));
        assert!(is_plot_source("  g ( x )=x^2"));
        assert!(!is_plot_source("f(y) = y"));
        assert!(!is_plot_source("f(x) == 2"));
        assert!(!is_plot_source("sin(x)"));
        assert!(Value::from("f(x) = x").is_plot_shaped());
        assert!(!Value::Numeric(1.0).is_plot_shaped());
    }

    #[test]
    fn only_numbers_aggregate() {
        assert!(Value::Numeric(2.0).is_aggregable());
        assert!(!Value::Boolean(true).is_aggregable());
        assert!(!Value::from("x").is_aggregable());
    }
}
