use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::preprocess::map_unquoted;

static KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:ans|now|today|avg|total|subtotal|line\d+)\b").unwrap());

/// Replace whole-word keywords outside string literals with the literal
/// `lookup` returns. Keywords `lookup` does not know are left in place, so
/// the evaluator reports them.
pub fn substitute_keywords(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    map_unquoted(text, |segment| {
        KEYWORD
            .replace_all(segment, |caps: &Captures| {
                lookup(&caps[0]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "ans" => Some("4".into()),
            "total" => Some("\"n/a\"".into()),
            "line1" => Some("(-2)".into()),
            _ => None,
        }
    }

    #[test]
    fn whole_words_only() {
        assert_eq!(substitute_keywords("ans * 2", lookup), "4 * 2");
        assert_eq!(substitute_keywords("answer + ans", lookup), "answer + 4");
        assert_eq!(substitute_keywords("line1+line12", lookup), "(-2)+line12");
    }

    #[test]
    fn unavailable_aggregates_become_text() {
        assert_eq!(substitute_keywords("total", lookup), "\"n/a\"");
    }

    #[test]
    fn string_literals_are_untouched() {
        assert_eq!(substitute_keywords("\"ans\" + ans", lookup), "\"ans\" + 4");
    }
}
