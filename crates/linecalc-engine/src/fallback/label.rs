/// `Groceries: 25 + 10` → ` 25 + 10`.
///
/// The part before the first `:` is tried on its own; only when it does not
/// evaluate is it treated as a label and dropped.
pub fn strip_label(text: &str, mut evaluates: impl FnMut(&str) -> bool) -> &str {
    match text.split_once(':') {
        Some((before, after)) if !evaluates(before) => after,
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_prefix_is_a_label() {
        assert_eq!(strip_label("Rent: 1200", |_| false), " 1200");
        assert_eq!(strip_label("a: b: 3", |_| false), " b: 3");
    }

    #[test]
    fn valid_prefix_is_kept() {
        assert_eq!(strip_label("12:30", |s| s == "12"), "12:30");
        assert_eq!(strip_label("no colon", |_| false), "no colon");
    }
}
