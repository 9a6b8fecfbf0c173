//! Locale-aware number rendering applied on top of the evaluator's
//! locale-neutral output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Decimal and grouping separators for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub id: &'static str,
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl NumberLocale {
    /// Input in this locale writes `1,5` for one and a half.
    pub fn comma_decimal(&self) -> bool {
        self.decimal_separator == ','
    }
}

pub const EN_US: NumberLocale = NumberLocale {
    id: "en-US",
    decimal_separator: '.',
    thousands_separator: ',',
};

/// Indian lakh/crore grouping is not modelled; plain 3-digit groups are used.
pub const EN_IN: NumberLocale = NumberLocale {
    id: "en-IN",
    decimal_separator: '.',
    thousands_separator: ',',
};

pub const DE_DE: NumberLocale = NumberLocale {
    id: "de-DE",
    decimal_separator: ',',
    thousands_separator: '.',
};

/// U+00A0 NO-BREAK SPACE grouping.
pub const FR_FR: NumberLocale = NumberLocale {
    id: "fr-FR",
    decimal_separator: ',',
    thousands_separator: '\u{00A0}',
};

pub const RU_RU: NumberLocale = NumberLocale {
    id: "ru-RU",
    decimal_separator: ',',
    thousands_separator: '\u{00A0}',
};

/// Swiss-style `'` grouping.
pub const DE_CH: NumberLocale = NumberLocale {
    id: "de-CH",
    decimal_separator: '.',
    thousands_separator: '\'',
};

static LOCALES: &[&NumberLocale] = &[
    &EN_US,
    &NumberLocale {
        id: "en-GB",
        ..EN_US
    },
    &EN_IN,
    &DE_DE,
    &NumberLocale {
        id: "es-ES",
        ..DE_DE
    },
    &FR_FR,
    &NumberLocale {
        id: "it-IT",
        ..DE_DE
    },
    &NumberLocale {
        id: "nl-NL",
        ..DE_DE
    },
    &NumberLocale {
        id: "pt-BR",
        ..DE_DE
    },
    &RU_RU,
    &DE_CH,
    &NumberLocale {
        id: "ja-JP",
        ..EN_US
    },
    &NumberLocale {
        id: "zh-CN",
        ..EN_US
    },
];

/// Look up a locale by identifier (case-insensitive, `_` accepted for `-`).
/// Unknown identifiers fall back to `en-US`.
pub fn number_locale(id: &str) -> &'static NumberLocale {
    let wanted = id.trim().replace('_', "-");
    LOCALES
        .iter()
        .copied()
        .find(|l| l.id.eq_ignore_ascii_case(&wanted))
        .unwrap_or(&EN_US)
}

pub fn supported_locales() -> impl Iterator<Item = &'static str> {
    LOCALES.iter().map(|l| l.id)
}

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Render one non-negative decimal number string (`1234.5678`).
pub fn render_decimal(
    digits: &str,
    locale: &NumberLocale,
    max_fraction_digits: usize,
    grouping: bool,
) -> String {
    let rounded = match digits.parse::<f64>() {
        Ok(n) if digits.contains('.') => {
            let s = format!("{n:.max_fraction_digits$}");
            if s.contains('.') {
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                s
            }
        }
        _ => digits.to_string(),
    };
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };

    let mut out = String::with_capacity(rounded.len() + int_part.len() / 3);
    if grouping && int_part.len() > 3 {
        let lead = int_part.len() % 3;
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (i + 3 - lead) % 3 == 0 {
                out.push(locale.thousands_separator);
            }
            out.push(c);
        }
    } else {
        out.push_str(int_part);
    }
    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator);
        out.push_str(frac);
    }
    out
}

/// Rewrite every digit run in `text` for `locale`. Signs, exponents, and unit
/// names are left untouched.
pub fn localize_numbers(
    text: &str,
    locale: &NumberLocale,
    max_fraction_digits: usize,
    grouping: bool,
) -> String {
    DIGIT_RUN
        .replace_all(text, |caps: &Captures| {
            render_decimal(&caps[0], locale, max_fraction_digits, grouping)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_en_us() {
        assert_eq!(number_locale("de-DE").decimal_separator, ',');
        assert_eq!(number_locale("de_de").id, "de-DE");
        assert_eq!(number_locale("xx-YY").id, "en-US");
        assert!(supported_locales().any(|id| id == "pt-BR"));
    }

    #[test]
    fn grouping_and_rounding() {
        assert_eq!(render_decimal("1234567.891", &EN_US, 2, true), "1,234,567.89");
        assert_eq!(render_decimal("1234567.891", &EN_US, 2, false), "1234567.89");
        assert_eq!(render_decimal("123", &EN_US, 4, true), "123");
        assert_eq!(render_decimal("1000", &DE_DE, 4, true), "1.000");
        assert_eq!(render_decimal("0.5", &DE_DE, 4, true), "0,5");
        assert_eq!(render_decimal("2.50001", &EN_US, 4, true), "2.5");
        assert_eq!(render_decimal("12345", &DE_CH, 0, true), "12'345");
    }

    #[test]
    fn localizes_every_number_in_text() {
        assert_eq!(
            localize_numbers("-1234.5 km / h", &FR_FR, 4, true),
            "-1\u{00A0}234,5 km / h"
        );
        assert_eq!(localize_numbers("1.23456e+15", &EN_US, 2, true), "1.23e+15");
        assert_eq!(localize_numbers("[[1000, 2]]", &EN_US, 4, false), "[[1000, 2]]");
    }
}
