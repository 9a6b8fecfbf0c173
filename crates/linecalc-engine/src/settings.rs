//! Per-pass settings snapshot.
//!
//! Settings are read-only for the duration of a pass and passed by reference;
//! nothing in the engine holds global configuration.

use std::fs;
use std::path::Path;

use linecalc_eval::{FormatOptions, Notation};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::locale::{NumberLocale, number_locale};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Maximum fraction digits in rendered answers, and the fraction digits
    /// used by fixed notation.
    pub precision: usize,
    pub notation: Notation,
    pub lower_exp: i32,
    pub upper_exp: i32,
    pub locale: String,
    /// Group thousands in the displayed answer.
    pub thou_sep: bool,
    /// Group thousands in the copied answer.
    pub copy_thou_sep: bool,
    /// Lines starting with `+ - * /` continue from the previous answer.
    pub cont_prev_line: bool,
    /// Show per-line errors; when off, failing lines render as empty.
    pub line_errors: bool,
    /// Replace currency symbols (`$`, `€`, ...) with their codes.
    pub currency: bool,
    /// chrono format for `today`.
    pub date_format: String,
    /// chrono format appended to `date_format` for `now`.
    pub time_format: String,
    /// Prefix dates with the abbreviated weekday.
    pub date_day: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            precision: 4,
            notation: Notation::Auto,
            lower_exp: -12,
            upper_exp: 12,
            locale: "en-US".to_string(),
            thou_sep: true,
            copy_thou_sep: false,
            cont_prev_line: true,
            line_errors: true,
            currency: true,
            date_format: "%m/%d/%Y".to_string(),
            time_format: "%I:%M %p".to_string(),
            date_day: false,
        }
    }
}

impl Settings {
    pub fn from_json_str(text: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> EngineResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Self::from_json_str(&fs::read_to_string(path)?),
            Some("yaml" | "yml") => Self::from_yaml_str(&fs::read_to_string(path)?),
            _ => Err(EngineError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn number_locale(&self) -> &'static NumberLocale {
        number_locale(&self.locale)
    }

    /// Evaluator formatting options. Fixed notation rounds to `precision`
    /// fraction digits here; the other notations keep full precision and are
    /// rounded by locale rendering.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            notation: self.notation,
            precision: (self.notation == Notation::Fixed).then_some(self.precision),
            lower_exp: self.lower_exp,
            upper_exp: self.upper_exp,
        }
    }

    fn day_prefix(&self) -> &'static str {
        if self.date_day { "%a, " } else { "" }
    }

    /// Format used for `now`: date, then time.
    pub fn now_format(&self) -> String {
        format!(
            "{}{} {}",
            self.day_prefix(),
            self.date_format,
            self.time_format
        )
    }

    /// Format used for `today`.
    pub fn today_format(&self) -> String {
        format!("{}{}", self.day_prefix(), self.date_format)
    }
}
