use once_cell::sync::Lazy;
use regex::Regex;

use crate::preprocess::map_unquoted;

static PERCENT_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)([\w.]+)\s*%\s*of\s+").unwrap());

/// `10% of 50` → `10/100*50`. A bare `20%50` is left for the evaluator.
pub fn rewrite_percent_of(text: &str) -> String {
    map_unquoted(text, |segment| {
        PERCENT_OF.replace_all(segment, "$1/100*").into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of() {
        assert_eq!(rewrite_percent_of("10% of 50"), "10/100*50");
        assert_eq!(rewrite_percent_of("12.5 % OF 80"), "12.5/100*80");
        assert_eq!(rewrite_percent_of("x% of y + 1"), "x/100*y + 1");
    }

    #[test]
    fn plain_percent_is_untouched() {
        assert_eq!(rewrite_percent_of("20%50"), "20%50");
        assert_eq!(rewrite_percent_of("50% off"), "50% off");
    }
}
