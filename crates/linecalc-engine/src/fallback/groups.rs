//! Innermost-first substitution of parenthesised groups.

use linecalc_common::{CalcError, CalcErrorKind};

use crate::preprocess::unquoted_positions;

fn is_paren(c: char) -> bool {
    c == '(' || c == ')'
}

/// Unbalanced parentheses are a hard error; no attempt is made to guess
/// where the missing one belongs.
pub fn check_balance(text: &str) -> Result<(), CalcError> {
    let mut depth = 0usize;
    for i in unquoted_positions(text, is_paren) {
        if text[i..].starts_with('(') {
            depth += 1;
        } else if depth == 0 {
            return Err(CalcError::new(CalcErrorKind::Unbalanced)
                .with_message(format!("unexpected ')' at position {}", i + 1)));
        } else {
            depth -= 1;
        }
    }
    if depth > 0 {
        return Err(CalcError::new(CalcErrorKind::Unbalanced)
            .with_message(format!("{depth} unclosed '('")));
    }
    Ok(())
}

fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in unquoted_positions(text, is_paren) {
        if i < open {
            continue;
        }
        if text[i..].starts_with('(') {
            depth += 1;
        } else {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Start of the identifier immediately before `open`, if it is a call.
fn callee_start(text: &str, open: usize) -> Option<usize> {
    let start = text[..open]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)?;
    let first = text[start..].chars().next()?;
    (!first.is_ascii_digit()).then_some(start)
}

/// Repeatedly evaluate the rightmost `(` group (or `name(...)` call) with
/// `eval` and splice its literal back in. Stops at the first group that
/// does not evaluate and returns the text substituted so far.
pub fn substitute_groups(
    text: &str,
    mut eval: impl FnMut(&str) -> Option<String>,
) -> Result<String, CalcError> {
    check_balance(text)?;
    let mut text = text.to_string();
    // Literals spliced in may carry their own parentheses; never rescan them.
    let mut limit = text.len();
    loop {
        let Some(open) = unquoted_positions(&text, |c| c == '(')
            .into_iter()
            .filter(|&i| i < limit)
            .last()
        else {
            break;
        };
        let Some(close) = matching_close(&text, open) else {
            break;
        };
        let (start, fragment) = match callee_start(&text, open) {
            Some(start) => (start, &text[start..=close]),
            None => (open, &text[open + 1..close]),
        };
        let Some(literal) = eval(fragment) else {
            break;
        };
        text.replace_range(start..=close, &literal);
        limit = start;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(fragment: &str) -> Option<String> {
        match fragment {
            "50 + 50" => Some("100".into()),
            "1-5" => Some("(-4)".into()),
            "2*(-4)" => Some("(-8)".into()),
            "sqrt(16)" => Some("4".into()),
            _ => None,
        }
    }

    #[test]
    fn innermost_groups_first() {
        assert_eq!(
            substitute_groups("10% of (50 + 50)", numbers).unwrap(),
            "10% of 100"
        );
        assert_eq!(substitute_groups("(2*(1-5))", numbers).unwrap(), "(-8)");
    }

    #[test]
    fn calls_are_evaluated_whole() {
        assert_eq!(substitute_groups("sqrt(16) apples", numbers).unwrap(), "4 apples");
    }

    #[test]
    fn stops_at_first_failure() {
        assert_eq!(
            substitute_groups("(nope) + (50 + 50)", numbers).unwrap(),
            "(nope) + 100"
        );
    }

    #[test]
    fn unbalanced_is_an_error() {
        for text in ["(1 + 2", "1 + 2)", ")("] {
            let err = substitute_groups(text, numbers).unwrap_err();
            assert_eq!(err.kind, CalcErrorKind::Unbalanced, "{text}");
        }
        assert!(check_balance("\"(\" + (1)").is_ok());
    }
}
