//! Line preprocessing: the text a line hands to the evaluator.
//!
//! Steps run in a fixed order and never touch the buffer:
//! comment stripping, comma-decimal normalisation, currency symbols, then
//! line continuation.

use linecalc_eval::Scope;

use crate::settings::Settings;

/// Symbol → ISO code. Longest symbols first so `C$` wins over `$`.
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("NZ$", "NZD"),
    ("HK$", "HKD"),
    ("US$", "USD"),
    ("C$", "CAD"),
    ("A$", "AUD"),
    ("R$", "BRL"),
    ("S$", "SGD"),
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
    ("₩", "KRW"),
    ("₽", "RUB"),
    ("₺", "TRY"),
    ("₪", "ILS"),
    ("₱", "PHP"),
    ("฿", "THB"),
    ("₫", "VND"),
    ("₴", "UAH"),
];

const CONTINUATION_OPERATORS: [char; 4] = ['+', '-', '*', '/'];

/// Calls `f` on each maximal run of `text` outside `"…"`/`'…'` literals and
/// copies the literals through unchanged.
pub(crate) fn map_unquoted(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    out.push_str(&text[start..=i]);
                    start = i + 1;
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                out.push_str(&f(&text[start..i]));
                start = i;
                quote = Some(c);
            }
            None => {}
        }
    }
    if quote.is_some() {
        out.push_str(&text[start..]);
    } else {
        out.push_str(&f(&text[start..]));
    }
    out
}

/// Byte offsets of `target` characters outside string literals.
pub(crate) fn unquoted_positions(text: &str, target: impl Fn(char) -> bool) -> Vec<usize> {
    let mut found = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => quote = Some(c),
            None if target(c) => found.push(i),
            None => {}
        }
    }
    found
}

/// Cut at the earliest `//` or `#` outside string literals.
pub fn strip_comment(line: &str) -> &str {
    let slashes = unquoted_positions(line, |c| c == '/')
        .into_iter()
        .find(|&i| line[i + 1..].starts_with('/'));
    let hash = unquoted_positions(line, |c| c == '#').into_iter().next();
    let cut = match (slashes, hash) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    match cut {
        Some(at) => &line[..at],
        None => line,
    }
}

/// `1.234,5` → `1,234.5` and `max(1; 2)` → `max(1, 2)`, outside string
/// literals. A `;` directly inside `[...]` stays a matrix row separator.
pub fn swap_decimal_separators(text: &str) -> String {
    let mut brackets: Vec<char> = Vec::new();
    map_unquoted(text, |run| {
        run.chars()
            .map(|c| match c {
                '(' | '[' => {
                    brackets.push(c);
                    c
                }
                ')' | ']' => {
                    brackets.pop();
                    c
                }
                '.' => ',',
                ',' => '.',
                ';' if brackets.last() == Some(&'[') => ';',
                ';' => ',',
                other => other,
            })
            .collect()
    })
}

/// `$5` → `USD 5`, `C$10` → `CAD 10`.
pub fn substitute_currency(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;
    'scan: while let Some(c) = rest.chars().next() {
        for (symbol, code) in CURRENCY_SYMBOLS {
            if let Some(after) = rest.strip_prefix(symbol) {
                out.push_str(code);
                out.push(' ');
                rest = after;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Prepend the previous answer to a line that starts with an operator.
pub fn apply_continuation(text: &str, previous_blank: bool, scope: &Scope) -> String {
    let starts_with_op = text.starts_with(CONTINUATION_OPERATORS);
    match scope.get("ans") {
        Some(ans) if starts_with_op && !previous_blank => format!("{}{}", ans.to_literal(), text),
        _ => text.to_string(),
    }
}

/// The candidate expression for one line. `previous_blank` describes the
/// raw line above (`true` for the first line).
pub fn preprocess(raw: &str, previous_blank: bool, scope: &Scope, settings: &Settings) -> String {
    let mut text = strip_comment(raw).trim().to_string();
    if settings.number_locale().comma_decimal() {
        text = swap_decimal_separators(&text);
    }
    if settings.currency {
        text = map_unquoted(&text, substitute_currency);
    }
    if settings.cont_prev_line {
        text = apply_continuation(&text, previous_blank, scope);
    }
    text
}

/// Blank after comment stripping.
pub fn is_blank(raw: &str) -> bool {
    strip_comment(raw).trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecalc_common::Value;

    #[test]
    fn earliest_comment_marker_wins() {
        assert_eq!(strip_comment("1 + 2 // note # more"), "1 + 2 ");
        assert_eq!(strip_comment("1 + 2 # note // more"), "1 + 2 ");
        assert_eq!(strip_comment("6 / 2"), "6 / 2");
        assert_eq!(strip_comment("\"a#b\" # c"), "\"a#b\" ");
    }

    #[test]
    fn comma_decimal_locales_swap_separators() {
        let settings = Settings {
            locale: "de-DE".into(),
            ..Settings::default()
        };
        let scope = Scope::new();
        assert_eq!(preprocess("1,5 + 2", true, &scope, &settings), "1.5 + 2");
        assert_eq!(preprocess("max(1,5; 2)", true, &scope, &settings), "max(1.5, 2)");
        assert_eq!(preprocess("\"a,b\"", true, &scope, &settings), "\"a,b\"");
    }

    #[test]
    fn matrix_rows_survive_the_separator_swap() {
        assert_eq!(swap_decimal_separators("[1,5; 2]"), "[1.5; 2]");
        assert_eq!(swap_decimal_separators("sum([1; 2]; 3)"), "sum([1; 2], 3)");
        assert_eq!(
            swap_decimal_separators("max(\"a;b\"; (1; 2))"),
            "max(\"a;b\", (1, 2))"
        );
    }

    #[test]
    fn currency_symbols_longest_first() {
        assert_eq!(substitute_currency("$5"), "USD 5");
        assert_eq!(substitute_currency("C$10 + $1"), "CAD 10 + USD 1");
        assert_eq!(substitute_currency("5€"), "5EUR ");
        assert_eq!(substitute_currency("no symbols"), "no symbols");
    }

    #[test]
    fn continuation_needs_ans_and_non_blank_previous_line() {
        let mut scope = Scope::new();
        assert_eq!(apply_continuation("+5", false, &scope), "+5");
        scope.set("ans", Value::Numeric(-4.0));
        assert_eq!(apply_continuation("+5", false, &scope), "(-4)+5");
        assert_eq!(apply_continuation("+5", true, &scope), "+5");
        assert_eq!(apply_continuation("5+", false, &scope), "5+");
    }

    #[test]
    fn continuation_respects_the_setting() {
        let mut scope = Scope::new();
        scope.set("ans", Value::Numeric(4.0));
        let on = Settings::default();
        let off = Settings {
            cont_prev_line: false,
            ..Settings::default()
        };
        assert_eq!(preprocess("*2", false, &scope, &on), "4*2");
        assert_eq!(preprocess("*2", false, &scope, &off), "*2");
    }

    #[test]
    fn comment_only_lines_are_blank() {
        assert!(is_blank("   // just a note"));
        assert!(is_blank(""));
        assert!(!is_blank("1 # one"));
    }
}
