//! Fallback resolver: the textual rewrite pipeline tried when a line does
//! not evaluate as written.
//!
//! Stages, in order:
//!
//! 1. [`label`]: drop a `label:` prefix the evaluator cannot read
//! 2. [`groups`]: evaluate parenthesised groups innermost-first and splice
//!    their literals back in
//! 3. [`keywords`]: `ans`, `now`, `today`, `avg`, `total`, `subtotal`,
//!    `line<N>` become literals
//! 4. [`datetime`]: `<date> ± <duration>`
//! 5. [`percent`]: `<a>% of <b>`
//!
//! Each stage is a plain `&str -> String` function; this module wires them to
//! the evaluator and the pass state.

pub mod datetime;
pub mod groups;
pub mod keywords;
pub mod label;
pub mod percent;

use linecalc_common::{CalcError, Value};
use linecalc_eval::{Evaluator, Scope};

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::aggregate::RunningStats;
use crate::scope::{LineScope, aggregate_value};
use crate::settings::Settings;

pub use datetime::INVALID_DATE;

/// Read-only pass state the stages consult.
pub struct FallbackContext<'a, E: Evaluator + ?Sized> {
    pub evaluator: &'a E,
    pub stats: &'a RunningStats,
    pub settings: &'a Settings,
}

impl<E: Evaluator + ?Sized> FallbackContext<'_, E> {
    /// Evaluate without touching the pass scope.
    fn evaluate_detached(&self, expr: &str, scope: &Scope) -> Result<Value, CalcError> {
        self.evaluator.evaluate(expr, &mut scope.clone())
    }

    fn keyword_literal(&self, name: &str, scope: &LineScope) -> Option<String> {
        match name {
            "avg" => Some(aggregate_value(self.stats.average()).to_literal()),
            "total" => Some(aggregate_value(self.stats.total()).to_literal()),
            "subtotal" => Some(aggregate_value(self.stats.subtotal()).to_literal()),
            _ => scope.get(name).map(Value::to_literal),
        }
    }

    fn duration_hours(&self, duration: &str, scope: &LineScope) -> Option<f64> {
        match self.evaluate_detached(&format!("({duration}) to hours"), scope.scope()) {
            Ok(Value::Quantity(q)) => Some(q.value),
            _ => None,
        }
    }

    /// Stages 3-5.
    fn rewrite(&self, text: &str, scope: &LineScope) -> String {
        let text = keywords::substitute_keywords(text, |name| self.keyword_literal(name, scope));
        #[cfg(feature = "tracing")]
        trace!(stage = "keywords", text = %text);

        let text = datetime::rewrite_date_arithmetic(&text, self.settings, |duration| {
            self.duration_hours(duration, scope)
        });
        #[cfg(feature = "tracing")]
        trace!(stage = "datetime", text = %text);

        let text = percent::rewrite_percent_of(&text);
        #[cfg(feature = "tracing")]
        trace!(stage = "percent", text = %text);
        text
    }

    /// A group's contents: as written first, rewritten second.
    fn evaluate_fragment(&self, fragment: &str, scope: &mut LineScope) -> Result<Value, CalcError> {
        match self.evaluator.evaluate(fragment, scope.scope_mut()) {
            Ok(value) => Ok(value),
            Err(_) => {
                let text = self.rewrite(fragment, scope);
                self.evaluator.evaluate(&text, scope.scope_mut())
            }
        }
    }

    /// Run the pipeline on a line that failed direct evaluation.
    ///
    /// `Ok(None)` means the line turned out to hold nothing to evaluate
    /// (for example a bare `Label:`).
    pub fn resolve(&self, expr: &str, scope: &mut LineScope) -> Result<Option<Value>, CalcError> {
        let text = label::strip_label(expr, |before| {
            self.evaluate_detached(before, scope.scope()).is_ok()
        })
        .trim();
        #[cfg(feature = "tracing")]
        trace!(stage = "label", text = %text);
        if text.is_empty() {
            return Ok(None);
        }
        if text != expr.trim() {
            if let Ok(value) = self.evaluator.evaluate(text, scope.scope_mut()) {
                return Ok(Some(value));
            }
        }

        let substituted = groups::substitute_groups(text, |fragment| {
            self.evaluate_fragment(fragment, scope)
                .ok()
                .map(|v| v.to_literal())
        })?;
        #[cfg(feature = "tracing")]
        trace!(stage = "groups", text = %substituted);
        if substituted != text {
            if let Ok(value) = self.evaluator.evaluate(&substituted, scope.scope_mut()) {
                return Ok(Some(value));
            }
        }

        let text = self.rewrite(&substituted, scope);
        self.evaluator.evaluate(&text, scope.scope_mut()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use linecalc_eval::Interpreter;

    fn scope() -> LineScope {
        let at = NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        LineScope::begin(at, &Settings::default())
    }

    fn resolve(expr: &str, scope: &mut LineScope) -> Result<Option<Value>, CalcError> {
        let interp = Interpreter::new();
        let stats = RunningStats::new();
        let settings = Settings::default();
        let ctx = FallbackContext {
            evaluator: &interp,
            stats: &stats,
            settings: &settings,
        };
        ctx.resolve(expr, scope)
    }

    #[test]
    fn labels_are_dropped() {
        let mut s = scope();
        assert_eq!(
            resolve("Groceries: 25 + 10", &mut s).unwrap(),
            Some(Value::Numeric(35.0))
        );
        assert_eq!(resolve("Groceries:", &mut s).unwrap(), None);
    }

    #[test]
    fn percent_of_through_groups() {
        let mut s = scope();
        assert_eq!(
            resolve("10% of (50 + 50)", &mut s).unwrap(),
            Some(Value::Numeric(10.0))
        );
    }

    #[test]
    fn dates_shift_by_durations() {
        let mut s = scope();
        assert_eq!(
            resolve("today + 3 days", &mut s).unwrap(),
            Some(Value::from("10/18/2026"))
        );
        assert_eq!(
            resolve("now + 90 minutes", &mut s).unwrap(),
            Some(Value::from("10/15/2026 11:00 AM"))
        );
        assert_eq!(
            resolve("(today + 1 week)", &mut s).unwrap(),
            Some(Value::from("10/22/2026"))
        );
        assert_eq!(
            resolve("soon + 3 days", &mut s).unwrap(),
            Some(Value::from(INVALID_DATE))
        );
    }

    #[test]
    fn labelled_unit_arithmetic_is_not_a_date() {
        let mut s = scope();
        let Some(Value::Quantity(q)) = resolve("Trip: 3 days + 4 hours", &mut s).unwrap() else {
            panic!("expected a quantity");
        };
        assert!((q.value - (3.0 + 4.0 / 24.0)).abs() < 1e-9);
        let Some(Value::Quantity(q)) = resolve("Trip: 5 hours - 30 minutes", &mut s).unwrap()
        else {
            panic!("expected a quantity");
        };
        assert!((q.value - 4.5).abs() < 1e-9);
    }

    #[test]
    fn final_failure_is_reported() {
        let mut s = scope();
        let err = resolve("nothing here", &mut s).unwrap_err();
        assert_eq!(err.to_string(), "Undefined symbol nothing");
    }
}
