//! Value → text. Locale-neutral: `.` decimal point, no grouping. The line
//! engine applies locale rendering on top.

use linecalc_common::Value;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default significant digits when no precision is requested; hides binary
/// noise such as `0.1 + 0.2 = 0.30000000000000004`.
pub const DEFAULT_SIGNIFICANT_DIGITS: usize = 14;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    #[default]
    Auto,
    Fixed,
    Exponential,
    Engineering,
    Bin,
    Hex,
    Oct,
}

impl Notation {
    /// Integer-radix notations bypass locale rendering.
    pub fn is_radix(self) -> bool {
        matches!(self, Notation::Bin | Notation::Hex | Notation::Oct)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub notation: Notation,
    /// Significant digits (auto/exponential/engineering) or fraction digits (fixed).
    pub precision: Option<usize>,
    pub lower_exp: i32,
    pub upper_exp: i32,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            notation: Notation::Auto,
            precision: None,
            lower_exp: -12,
            upper_exp: 12,
        }
    }
}

pub fn format_value(value: &Value, options: &FormatOptions) -> String {
    match value {
        Value::Numeric(n) => format_number(*n, options),
        Value::Quantity(q) if q.unit.is_empty() => format_number(q.value, options),
        Value::Quantity(q) => format!("{} {}", format_number(q.value, options), q.unit),
        Value::Textual(s) => format!("\"{s}\""),
        Value::Boolean(b) => b.to_string(),
        Value::Matrix(rows) => {
            let rows: Vec<String> = rows
                .iter()
                .map(|row| {
                    let cells: Vec<String> =
                        row.iter().map(|v| format_value(v, options)).collect();
                    format!("[{}]", cells.join(", "))
                })
                .collect();
            format!("[{}]", rows.join(", "))
        }
        Value::FunctionExpr(def) => def.source(),
    }
}

pub fn format_number(n: f64, options: &FormatOptions) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    match options.notation {
        Notation::Bin => radix(n, 2, "0b").unwrap_or_else(|| auto(n, options)),
        Notation::Hex => radix(n, 16, "0x").unwrap_or_else(|| auto(n, options)),
        Notation::Oct => radix(n, 8, "0o").unwrap_or_else(|| auto(n, options)),
        Notation::Fixed => match options.precision {
            Some(p) => normalize_zero(format!("{n:.p$}")),
            None => plain(round_significant(n, DEFAULT_SIGNIFICANT_DIGITS)),
        },
        Notation::Exponential => exponential(n, options.precision),
        Notation::Engineering => engineering(n, options.precision),
        Notation::Auto => auto(n, options),
    }
}

fn auto(n: f64, options: &FormatOptions) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let sig = options.precision.unwrap_or(DEFAULT_SIGNIFICANT_DIGITS);
    let rounded = round_significant(n, sig);
    let exp = decimal_exponent(rounded);
    if exp < options.lower_exp || exp >= options.upper_exp {
        exponential(n, options.precision)
    } else {
        plain(rounded)
    }
}

/// Round to `sig` significant digits through the shortest `{:e}` rendering.
fn round_significant(n: f64, sig: usize) -> f64 {
    let sig = sig.clamp(1, 17);
    format!("{:.*e}", sig - 1, n).parse().unwrap_or(n)
}

fn decimal_exponent(n: f64) -> i32 {
    if n == 0.0 {
        return 0;
    }
    let s = format!("{n:e}");
    s.rsplit_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0)
}

fn plain(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

fn normalize_zero(s: String) -> String {
    // `-0.00` reads as noise
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s[1..].to_string()
    } else {
        s
    }
}

/// `1.2345e+5`. Without a precision, trailing mantissa zeros are trimmed.
fn exponential(n: f64, precision: Option<usize>) -> String {
    let sig = precision.unwrap_or(DEFAULT_SIGNIFICANT_DIGITS).clamp(1, 17);
    let s = format!("{:.*e}", sig - 1, n);
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s;
    };
    let mantissa = if precision.is_none() && mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < 0 {
        format!("{mantissa}e{exp}")
    } else {
        format!("{mantissa}e+{exp}")
    }
}

/// Exponent is a multiple of three: `123.45e+3`.
fn engineering(n: f64, precision: Option<usize>) -> String {
    if n == 0.0 {
        return "0e+0".to_string();
    }
    let sig = precision.unwrap_or(DEFAULT_SIGNIFICANT_DIGITS);
    let rounded = round_significant(n, sig);
    let exp = decimal_exponent(rounded);
    let exp3 = exp.div_euclid(3) * 3;
    let mantissa = round_significant(rounded / 10f64.powi(exp3), sig);
    if exp3 < 0 {
        format!("{}e{exp3}", plain(mantissa))
    } else {
        format!("{}e+{exp3}", plain(mantissa))
    }
}

fn radix(n: f64, base: u32, prefix: &str) -> Option<String> {
    if n.fract() != 0.0 || n.abs() > 9_007_199_254_740_992.0 {
        return None;
    }
    let magnitude = n.abs() as u64;
    let digits = match base {
        2 => format!("{magnitude:b}"),
        8 => format!("{magnitude:o}"),
        _ => format!("{magnitude:x}"),
    };
    let sign = if n < 0.0 { "-" } else { "" };
    Some(format!("{sign}{prefix}{digits}"))
}
