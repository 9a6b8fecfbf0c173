//! `<date> ± <duration>` arithmetic on formatted date strings.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::preprocess::unquoted_positions;
use crate::settings::Settings;

/// Line value when the date operand matches neither format.
pub const INVALID_DATE: &str = "Invalid Date";

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:milliseconds?|seconds?|minutes?|hours?|days?|weeks?|months?|quarters?|years?|decades?|century|centuries|millennium|millennia)\b",
    )
    .unwrap()
});

/// Which configured format a date operand matched; results are rendered in
/// the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFamily {
    Now,
    Today,
}

impl DateFamily {
    fn format(self, settings: &Settings) -> String {
        match self {
            DateFamily::Now => settings.now_format(),
            DateFamily::Today => settings.today_format(),
        }
    }
}

fn unquote(text: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner;
        }
    }
    text
}

/// Parse against the `now` format, then the `today` format.
pub fn parse_date(text: &str, settings: &Settings) -> Option<(NaiveDateTime, DateFamily)> {
    let text = unquote(text.trim());
    if let Ok(at) = NaiveDateTime::parse_from_str(text, &settings.now_format()) {
        return Some((at, DateFamily::Now));
    }
    NaiveDate::parse_from_str(text, &settings.today_format())
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|at| (at, DateFamily::Today))
}

fn shift(at: NaiveDateTime, hours: f64, subtract: bool) -> Option<NaiveDateTime> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    if subtract {
        at.checked_sub_signed(delta)
    } else {
        at.checked_add_signed(delta)
    }
}

/// Rewrite `<date> + <duration>` / `<date> - <duration>` into a quoted date
/// literal. `hours_of` converts the duration operand to hours.
///
/// Text without a duration word or without `+`/`-` is returned unchanged;
/// text that has both but no parseable date operand becomes
/// `"Invalid Date"`.
pub fn rewrite_date_arithmetic(
    text: &str,
    settings: &Settings,
    mut hours_of: impl FnMut(&str) -> Option<f64>,
) -> String {
    if !DURATION.is_match(text) {
        return text.to_string();
    }
    let operators = unquoted_positions(text, |c| c == '+' || c == '-');
    if operators.is_empty() {
        return text.to_string();
    }

    let result = operators.into_iter().find_map(|pos| {
        let (left, right) = (text[..pos].trim(), text[pos + 1..].trim());
        if left.is_empty() || right.is_empty() {
            return None;
        }
        let (at, family) = parse_date(left, settings)?;
        Some((at, family, right, text[pos..].starts_with('-')))
    });

    let rendered = result.and_then(|(at, family, right, subtract)| {
        let shifted = shift(at, hours_of(right)?, subtract)?;
        Some(shifted.format(&family.format(settings)).to_string())
    });

    format!("\"{}\"", rendered.as_deref().unwrap_or(INVALID_DATE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(right: &str) -> Option<f64> {
        match right {
            "3 days" => Some(72.0),
            "2 hours" => Some(2.0),
            "1 week" => Some(168.0),
            _ => None,
        }
    }

    #[test]
    fn today_family_stays_a_date() {
        let s = Settings::default();
        assert_eq!(
            rewrite_date_arithmetic("\"10/15/2026\" + 3 days", &s, hours),
            "\"10/18/2026\""
        );
        assert_eq!(
            rewrite_date_arithmetic("10/15/2026 - 1 week", &s, hours),
            "\"10/08/2026\""
        );
    }

    #[test]
    fn now_family_keeps_the_time() {
        let s = Settings::default();
        assert_eq!(
            rewrite_date_arithmetic("\"10/15/2026 11:30 PM\" + 2 hours", &s, hours),
            "\"10/16/2026 01:30 AM\""
        );
    }

    #[test]
    fn iso_dates_split_at_the_right_minus() {
        let s = Settings {
            date_format: "%Y-%m-%d".into(),
            ..Settings::default()
        };
        assert_eq!(
            rewrite_date_arithmetic("2026-10-15 - 3 days", &s, hours),
            "\"2026-10-12\""
        );
    }

    #[test]
    fn day_prefix_round_trips() {
        let s = Settings {
            date_day: true,
            ..Settings::default()
        };
        assert_eq!(
            rewrite_date_arithmetic("\"Thu, 10/15/2026\" + 3 days", &s, hours),
            "\"Sun, 10/18/2026\""
        );
    }

    #[test]
    fn unparseable_dates_are_invalid() {
        let s = Settings::default();
        assert_eq!(
            rewrite_date_arithmetic("someday + 3 days", &s, hours),
            "\"Invalid Date\""
        );
    }

    #[test]
    fn non_date_text_is_untouched() {
        let s = Settings::default();
        assert_eq!(rewrite_date_arithmetic("1 + 2", &s, hours), "1 + 2");
        assert_eq!(rewrite_date_arithmetic("3 days", &s, hours), "3 days");
    }
}
