//! Result formatter: evaluator output → display and copy strings, plus plot
//! detection.

use linecalc_common::{Value, is_plot_source};
use linecalc_eval::Evaluator;

use crate::locale::localize_numbers;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    Text { display: String, copy_text: String },
    Plot { expression: String },
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Format `value`, the answer to `expression`.
pub fn format_result<E: Evaluator + ?Sized>(
    evaluator: &E,
    value: &Value,
    expression: &str,
    settings: &Settings,
) -> Formatted {
    let raw = evaluator.format(value, &settings.format_options());

    if value.is_plot_shaped() || is_plot_source(expression) {
        let expression = match value {
            Value::FunctionExpr(_) if is_plot_source(expression) => expression.trim().to_string(),
            Value::Textual(text) => text.clone(),
            _ => raw,
        };
        return Formatted::Plot { expression };
    }

    if settings.notation.is_radix() || matches!(value, Value::Textual(_)) {
        let text = strip_quotes(&raw).to_string();
        return Formatted::Text {
            display: text.clone(),
            copy_text: text,
        };
    }

    let locale = settings.number_locale();
    Formatted::Text {
        display: localize_numbers(&raw, locale, settings.precision, settings.thou_sep),
        copy_text: localize_numbers(&raw, locale, settings.precision, settings.copy_thou_sep),
    }
}
